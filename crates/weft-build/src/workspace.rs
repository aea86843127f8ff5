//! The workspace facade.
//!
//! [`Workspace`] owns one program graph, its reference overlay, the change
//! tracker, and the artifact caches. All graph edits go through
//! [`Workspace::edit`] so that every queued [`GraphEvent`] reaches the
//! tracker. Reads of generated code and validation are served from cache
//! whenever the graph (and, for code, the reference graph) is unchanged.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use weft_cache::dirty::{compute_root_changes, ChangeTracker, RootChanges};
use weft_cache::{hash_graph, hash_roots, ArtifactKey, ContentHash};
use weft_core::document::GraphDocument;
use weft_core::event::GraphEvent;
use weft_core::graph::ProgramGraph;
use weft_core::id::{NodeId, ReferenceId};
use weft_core::mode::{HeuristicClassifier, Mode, ModeClassifier};
use weft_core::CoreError;
use weft_refs::{
    ImportMap, ImportReport, IndicatorRenderer, NoIndicators, Reference, ReferenceGraph,
    ReferenceOptions,
};

use crate::caches::{ArtifactCaches, CacheStatsReport};
use crate::diagnostics::ValidationReport;
use crate::error::BuildError;
use crate::generate::{CodeGenerator, GeneratedFiles, Validator};
use crate::CacheConfig;

/// A program graph plus everything derived from it.
///
/// `R` and `C` are the reference graph's indicator renderer and mode
/// classifier; [`Workspace::with_references`] plugs in custom ones.
pub struct Workspace<G, V, R = NoIndicators, C = HeuristicClassifier> {
    graph: ProgramGraph,
    references: ReferenceGraph<R, C>,
    tracker: ChangeTracker,
    caches: ArtifactCaches,
    generator: G,
    validator: V,
    /// Per-root hashes at the last generated-code read.
    generated_roots: BTreeMap<NodeId, ContentHash>,
}

impl<G: CodeGenerator, V: Validator> Workspace<G, V> {
    /// An empty, clean workspace.
    pub fn new(generator: G, validator: V, config: CacheConfig) -> Self {
        Self::with_references(generator, validator, ReferenceGraph::new(), config)
    }

    /// Loads a workspace from a document.
    ///
    /// The loaded state is the save baseline; the workspace starts clean.
    pub fn from_document(
        doc: GraphDocument,
        generator: G,
        validator: V,
        config: CacheConfig,
    ) -> Result<Self, BuildError> {
        Self::load(doc, generator, validator, ReferenceGraph::new(), config)
    }
}

impl<G, V, R, C> Workspace<G, V, R, C>
where
    G: CodeGenerator,
    V: Validator,
    R: IndicatorRenderer,
    C: ModeClassifier,
{
    /// An empty, clean workspace around an existing reference graph.
    pub fn with_references(
        generator: G,
        validator: V,
        references: ReferenceGraph<R, C>,
        config: CacheConfig,
    ) -> Self {
        Workspace {
            graph: ProgramGraph::new(),
            references,
            tracker: ChangeTracker::new(),
            caches: ArtifactCaches::new(&config),
            generator,
            validator,
            generated_roots: BTreeMap::new(),
        }
    }

    /// Loads a document into a workspace around `references`.
    ///
    /// References whose source node is not in the document are pruned.
    pub fn load(
        doc: GraphDocument,
        generator: G,
        validator: V,
        references: ReferenceGraph<R, C>,
        config: CacheConfig,
    ) -> Result<Self, BuildError> {
        let graph = ProgramGraph::from_document(doc)?;
        let baseline = graph.to_document().to_json()?;
        let mut workspace = Self::with_references(generator, validator, references, config);
        workspace.graph = graph;
        workspace.references.prune_dangling(&workspace.graph);
        workspace.tracker = ChangeTracker::with_baseline(baseline);
        debug!(nodes = workspace.graph.len(), "workspace loaded");
        Ok(workspace)
    }

    pub fn to_document(&self) -> GraphDocument {
        self.graph.to_document()
    }

    pub fn graph(&self) -> &ProgramGraph {
        &self.graph
    }

    pub fn references(&self) -> &ReferenceGraph<R, C> {
        &self.references
    }

    // -----------------------------------------------------------------------
    // Edits and notifications
    // -----------------------------------------------------------------------

    /// Runs `f` against the graph and feeds the resulting events to the
    /// change tracker.
    ///
    /// Events are drained even if `f` fails part-way. Deleting nodes prunes
    /// the references they were the source of.
    pub fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut ProgramGraph) -> Result<T, CoreError>,
    ) -> Result<T, BuildError> {
        let result = f(&mut self.graph);

        let events = self.graph.take_events();
        let counted = self.tracker.observe_all(&events);
        let removed_nodes = events.iter().any(|e| {
            matches!(e, GraphEvent::NodeDeleted { .. } | GraphEvent::GraphCleared)
        });
        if removed_nodes {
            self.references.prune_dangling(&self.graph);
        }
        debug!(events = events.len(), counted, "edit applied");

        Ok(result?)
    }

    /// Feeds a host event (selection, viewport, load finished, ...) to the
    /// change tracker. Returns whether it counted as a content edit.
    pub fn notify(&mut self, event: &GraphEvent) -> bool {
        self.tracker.observe(event)
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    pub fn create_reference(
        &mut self,
        source: NodeId,
        target_file: &str,
        options: ReferenceOptions,
    ) -> Result<Reference, BuildError> {
        Ok(self
            .references
            .create_reference(&self.graph, source, target_file, options)?)
    }

    pub fn update_reference(
        &mut self,
        id: ReferenceId,
        new_target: Option<&str>,
        options: ReferenceOptions,
    ) -> Result<Option<Reference>, BuildError> {
        Ok(self.references.update_reference(id, new_target, options)?)
    }

    pub fn delete_reference(&mut self, id: ReferenceId) -> bool {
        self.references.delete_reference(id)
    }

    pub fn import_references(&mut self, text: &str) -> Result<ImportReport, BuildError> {
        Ok(self.references.import_references(&self.graph, text)?)
    }

    pub fn export_references(&self) -> Result<String, BuildError> {
        Ok(self.references.export_references()?)
    }

    pub fn clear_references(&mut self) {
        self.references.clear_all();
    }

    /// Import statements for every current reference.
    pub fn imports(&self) -> ImportMap {
        self.references.generate_imports(None)
    }

    // -----------------------------------------------------------------------
    // Derived artifacts
    // -----------------------------------------------------------------------

    /// Hash of the current graph.
    pub fn content_hash(&self) -> ContentHash {
        hash_graph(&self.graph)
    }

    /// Generated files for the current graph and references.
    ///
    /// The generator runs only on a miss; its errors are returned uncached.
    pub fn generated_code(&mut self) -> Result<GeneratedFiles, BuildError> {
        let key = ArtifactKey {
            content: self.content_hash(),
            references: self.references.version(),
        };

        let files = match self.caches.code.get(&key) {
            Some(files) => files,
            None => {
                let imports = self.references.generate_imports(None);
                let files = self.generator.generate(&self.graph, &imports)?;
                debug!(%key, files = files.len(), "code generated");
                self.caches.code.put(key, files.clone());
                files
            }
        };
        self.generated_roots = hash_roots(&self.graph);
        Ok(files)
    }

    /// Validation report for the current graph.
    pub fn validation(&mut self) -> Result<ValidationReport, BuildError> {
        let key = self.content_hash();
        if let Some(report) = self.caches.validation.get(&key) {
            return Ok(report);
        }
        let report = self.validator.validate(&self.graph)?;
        debug!(%key, valid = report.valid, "graph validated");
        self.caches.validation.put(key, report.clone());
        Ok(report)
    }

    /// Roots whose subtree changed since the last [`generated_code`] read.
    ///
    /// Before the first read every root counts as new.
    ///
    /// [`generated_code`]: Workspace::generated_code
    pub fn changed_roots(&self) -> RootChanges {
        compute_root_changes(&self.graph, &self.generated_roots)
    }

    /// Toolbox definition for `mode`, loaded once through `load`.
    pub fn toolbox(&mut self, mode: Mode, load: impl FnOnce(Mode) -> Value) -> Value {
        let key = mode.as_str().to_string();
        if let Some(toolbox) = self.caches.toolbox.get(&key) {
            return toolbox;
        }
        let toolbox = load(mode);
        self.caches.toolbox.put(key, toolbox.clone());
        toolbox
    }

    /// Node definition for `kind`, loaded once through `load`.
    ///
    /// Unknown kinds (`load` returns `None`) are not cached.
    pub fn node_definition(
        &mut self,
        kind: &str,
        load: impl FnOnce(&str) -> Option<Value>,
    ) -> Option<Value> {
        let key = kind.to_string();
        if let Some(definition) = self.caches.definitions.get(&key) {
            return Some(definition);
        }
        let definition = load(kind)?;
        self.caches.definitions.put(key, definition.clone());
        Some(definition)
    }

    // -----------------------------------------------------------------------
    // Cache control and save state
    // -----------------------------------------------------------------------

    /// Drops the code and validation caches without waiting for a hash
    /// change.
    pub fn invalidate_all(&mut self) {
        self.caches.invalidate_all();
    }

    /// Drops every cache, including the toolbox and definition lookups.
    pub fn clear_all_caches(&mut self) {
        self.caches.clear_all();
    }

    pub fn cache_stats(&self) -> CacheStatsReport {
        self.caches.stats()
    }

    /// Whether a content edit happened since the last save or load.
    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Records the current document as saved and returns it.
    pub fn mark_saved(&mut self) -> Result<String, BuildError> {
        let snapshot = self.graph.to_document().to_json()?;
        self.tracker.mark_saved(snapshot.clone());
        Ok(snapshot)
    }

    /// Compares the current document with the saved baseline.
    ///
    /// Unlike [`is_dirty`](Workspace::is_dirty) this is false again once
    /// edits are reverted. A workspace never saved or loaded always reports
    /// unsaved changes.
    pub fn has_unsaved_changes(&self) -> Result<bool, BuildError> {
        let current = self.graph.to_document().to_json()?;
        Ok(self.tracker.changed_since_save(&current))
    }
}
