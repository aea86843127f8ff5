//! The reference store.
//!
//! [`ReferenceGraph`] keeps references in an ID-ordered primary store plus a
//! reverse index from source node to the IDs of its references. Every
//! successful mutation bumps [`ReferenceGraph::version`], which callers fold
//! into generated-code cache keys so that reference edits invalidate cached
//! output without any explicit flush.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tracing::{debug, warn};

use weft_core::graph::ProgramGraph;
use weft_core::id::{NodeId, ReferenceId};
use weft_core::mode::{HeuristicClassifier, Mode, ModeClassifier};

use crate::error::ReferenceError;
use crate::imports::{self, ImportMap};
use crate::indicators::{IndicatorRenderer, NoIndicators};
use crate::reference::{normalize_symbol, Reference, ReferenceOptions};

/// Overlay graph of explicit cross-fragment references.
///
/// `R` receives indicator refreshes; `C` decides source and target modes.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph<R = NoIndicators, C = HeuristicClassifier> {
    references: BTreeMap<ReferenceId, Reference>,
    /// Source node -> IDs of its references. Buckets are never empty.
    by_source: BTreeMap<NodeId, BTreeSet<ReferenceId>>,
    next_reference_id: u64,
    version: u64,
    renderer: R,
    classifier: C,
}

impl ReferenceGraph {
    /// An empty reference graph with no indicators and the default classifier.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: IndicatorRenderer, C: ModeClassifier> ReferenceGraph<R, C> {
    /// An empty reference graph with explicit collaborators.
    pub fn with_parts(renderer: R, classifier: C) -> Self {
        ReferenceGraph {
            references: BTreeMap::new(),
            by_source: BTreeMap::new(),
            next_reference_id: 0,
            version: 0,
            renderer,
            classifier,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Creates a reference from `source` to `target_file`.
    ///
    /// The source mode comes from the node's kind; the target mode from
    /// `options` or, failing that, from the file name.
    pub fn create_reference(
        &mut self,
        graph: &ProgramGraph,
        source: NodeId,
        target_file: &str,
        options: ReferenceOptions,
    ) -> Result<Reference, ReferenceError> {
        let node = graph
            .get(source)
            .ok_or(ReferenceError::NodeNotFound { id: source })?;
        let target_file = validate_target(target_file)?;

        let now = Utc::now();
        let target_mode = options
            .target_mode
            .unwrap_or_else(|| self.classifier.mode_of_file(&target_file));
        let reference = Reference {
            id: self.allocate_id(),
            source_node_id: source,
            source_mode: self.classifier.mode_of_kind(node.kind()),
            target_file,
            target_mode,
            target_symbol: options.target_symbol.and_then(normalize_symbol),
            description: options.description.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %reference.id,
            source = %source,
            target = %reference.target_file,
            mode = %reference.target_mode,
            "reference created"
        );
        self.insert(reference.clone());
        self.version += 1;
        self.refresh(source);
        Ok(reference)
    }

    /// Applies the supplied fields to reference `id`.
    ///
    /// Returns `Ok(None)` (and logs) if `id` is unknown. A changed target
    /// without an explicit mode re-infers the target mode. `updated_at` is
    /// always bumped.
    pub fn update_reference(
        &mut self,
        id: ReferenceId,
        new_target: Option<&str>,
        options: ReferenceOptions,
    ) -> Result<Option<Reference>, ReferenceError> {
        let new_target = new_target.map(validate_target).transpose()?;

        let Some(reference) = self.references.get_mut(&id) else {
            warn!(id = %id, "update of unknown reference ignored");
            return Ok(None);
        };

        let mut target_changed = false;
        if let Some(target) = new_target {
            target_changed = target != reference.target_file;
            reference.target_file = target;
        }
        match options.target_mode {
            Some(mode) => reference.target_mode = mode,
            None if target_changed => {
                reference.target_mode = self.classifier.mode_of_file(&reference.target_file);
            }
            None => {}
        }
        if let Some(symbol) = options.target_symbol {
            reference.target_symbol = normalize_symbol(symbol);
        }
        if let Some(description) = options.description {
            reference.description = description;
        }
        reference.updated_at = Utc::now().max(reference.updated_at);

        let updated = reference.clone();
        debug!(id = %id, target = %updated.target_file, "reference updated");
        self.version += 1;
        self.refresh(updated.source_node_id);
        Ok(Some(updated))
    }

    /// Deletes reference `id`. Returns `false` (and logs) if unknown.
    pub fn delete_reference(&mut self, id: ReferenceId) -> bool {
        let Some(reference) = self.remove(id) else {
            warn!(id = %id, "delete of unknown reference ignored");
            return false;
        };
        debug!(id = %id, source = %reference.source_node_id, "reference deleted");
        self.version += 1;
        self.refresh(reference.source_node_id);
        true
    }

    /// Deletes every reference whose source node is no longer in `graph`.
    ///
    /// Returns the IDs removed, in ascending order.
    pub fn prune_dangling(&mut self, graph: &ProgramGraph) -> Vec<ReferenceId> {
        let missing: Vec<NodeId> = self
            .by_source
            .keys()
            .copied()
            .filter(|&node| !graph.contains(node))
            .collect();

        let mut removed = Vec::new();
        for node in missing {
            if let Some(ids) = self.by_source.remove(&node) {
                for id in ids {
                    self.references.remove(&id);
                    removed.push(id);
                }
            }
            self.renderer.refresh(node, &[]);
        }
        if !removed.is_empty() {
            removed.sort();
            debug!(count = removed.len(), "dangling references pruned");
            self.version += 1;
        }
        removed
    }

    /// Removes every reference and clears all indicators.
    pub fn clear_all(&mut self) {
        self.references.clear();
        self.by_source.clear();
        self.renderer.clear();
        self.version += 1;
        debug!("references cleared");
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// References whose source is `node`, ordered by ID.
    ///
    /// Unknown nodes simply have no references.
    pub fn get_references(&self, node: NodeId) -> Vec<Reference> {
        self.by_source
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.references.get(id))
            .cloned()
            .collect()
    }

    /// Every reference, ordered by ID.
    pub fn get_all_references(&self) -> Vec<Reference> {
        self.references.values().cloned().collect()
    }

    pub fn get_reference(&self, id: ReferenceId) -> Option<Reference> {
        self.references.get(&id).cloned()
    }

    /// Nodes that are the source of at least one reference.
    pub fn sources(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_source.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Counter bumped by every successful mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Synthesizes import statements for `references`, or for every stored
    /// reference when `None`.
    pub fn generate_imports(&self, references: Option<&[Reference]>) -> ImportMap {
        match references {
            Some(refs) => imports::generate(refs),
            None => imports::generate(self.references.values()),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    pub(crate) fn allocate_id(&mut self) -> ReferenceId {
        let id = ReferenceId(self.next_reference_id);
        self.next_reference_id += 1;
        id
    }

    /// Inserts into the store and the reverse index.
    pub(crate) fn insert(&mut self, reference: Reference) {
        self.by_source
            .entry(reference.source_node_id)
            .or_default()
            .insert(reference.id);
        self.references.insert(reference.id, reference);

        #[cfg(debug_assertions)]
        self.assert_consistency();
    }

    /// Removes from the store and the reverse index, pruning empty buckets.
    fn remove(&mut self, id: ReferenceId) -> Option<Reference> {
        let reference = self.references.remove(&id)?;
        if let Some(bucket) = self.by_source.get_mut(&reference.source_node_id) {
            bucket.remove(&id);
            if bucket.is_empty() {
                self.by_source.remove(&reference.source_node_id);
            }
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Some(reference)
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub(crate) fn classify(&self, graph: &ProgramGraph, node: NodeId) -> Option<Mode> {
        graph.get(node).map(|n| self.classifier.mode_of_kind(n.kind()))
    }

    pub(crate) fn classify_file(&self, file: &str) -> Mode {
        self.classifier.mode_of_file(file)
    }

    pub(crate) fn refresh(&mut self, node: NodeId) {
        let current = self.get_references(node);
        self.renderer.refresh(node, &current);
    }

    /// Every stored ID sits in exactly one bucket (its source's), and no
    /// bucket is empty.
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        let mut indexed = 0;
        for (node, bucket) in &self.by_source {
            debug_assert!(!bucket.is_empty(), "empty bucket for {}", node);
            for id in bucket {
                let reference = self.references.get(id);
                debug_assert!(
                    reference.is_some_and(|r| r.source_node_id == *node),
                    "reverse index entry {} -> {} is stale",
                    node,
                    id
                );
                indexed += 1;
            }
        }
        debug_assert_eq!(indexed, self.references.len(), "reverse index size mismatch");
    }
}

/// Target files must be non-blank. Surrounding whitespace is dropped.
fn validate_target(target_file: &str) -> Result<String, ReferenceError> {
    let trimmed = target_file.trim();
    if trimmed.is_empty() {
        return Err(ReferenceError::MalformedInput {
            reason: "target file must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}
