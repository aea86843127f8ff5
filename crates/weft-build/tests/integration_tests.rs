//! End-to-end tests for the workspace facade.
//!
//! Each test drives a [`Workspace`] with counting generator/validator mocks
//! and checks that edits, reference changes, and explicit invalidation hit
//! or miss the caches exactly when they should.
//!
//! Tests cover:
//! - Cache hits on unchanged graphs, misses after content edits
//! - Presentation events leave caches and dirty state alone
//! - Reference edits miss the code cache but not the validation cache
//! - Import synthesis reaching the generator
//! - Save baseline and document load
//! - Bounded eviction through the facade
//! - Generator failures are not cached

use std::cell::Cell;

use serde_json::json;

use weft_build::{
    prepend_imports, BuildError, CacheConfig, CodeGenerator, Diagnostic, GeneratedFiles,
    ValidationReport, Validator, Workspace,
};
use weft_cache::EvictionPolicy;
use weft_core::document::GraphDocument;
use weft_core::event::GraphEvent;
use weft_core::graph::ProgramGraph;
use weft_core::id::NodeId;
use weft_core::mode::{HeuristicClassifier, Mode, ModeClassifier};
use weft_refs::{ImportMap, IndicatorRenderer, Reference, ReferenceGraph, ReferenceOptions};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Emits one line per node into its mode's default file, then prepends the
/// synthesized imports. Counts invocations.
#[derive(Default)]
struct CountingGenerator {
    calls: Cell<usize>,
    fail: Cell<bool>,
}

impl CodeGenerator for CountingGenerator {
    fn generate(
        &self,
        graph: &ProgramGraph,
        imports: &ImportMap,
    ) -> Result<GeneratedFiles, BuildError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(BuildError::Generator("generator offline".into()));
        }
        let classifier = HeuristicClassifier;
        let mut files = GeneratedFiles::new();
        for node in graph.nodes().filter(|n| !n.is_disabled()) {
            let file = classifier.mode_of_kind(node.kind()).default_file();
            let body = files.entry(file.to_string()).or_default();
            body.push_str(&format!("// {} {}\n", node.kind(), node.id()));
        }
        prepend_imports(&mut files, imports);
        Ok(files)
    }
}

/// Flags `rust_function` nodes without a snake_case NAME. Counts invocations.
#[derive(Default)]
struct CountingValidator {
    calls: Cell<usize>,
}

impl Validator for CountingValidator {
    fn validate(&self, graph: &ProgramGraph) -> Result<ValidationReport, BuildError> {
        self.calls.set(self.calls.get() + 1);
        let diagnostics = graph
            .nodes()
            .filter(|n| n.kind() == "rust_function")
            .filter_map(|n| {
                let name = n.field("NAME").map(|v| v.to_string()).unwrap_or_default();
                let snake = !name.is_empty()
                    && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
                (!snake).then(|| Diagnostic::error(format!("function name '{}' is not snake_case", name)))
            });
        Ok(ValidationReport::from_diagnostics(diagnostics))
    }
}

/// Records every indicator refresh as `(node, reference count)`.
#[derive(Default)]
struct RecordingIndicators {
    refreshed: Vec<(NodeId, usize)>,
    clears: usize,
}

impl IndicatorRenderer for RecordingIndicators {
    fn refresh(&mut self, node: NodeId, references: &[Reference]) {
        self.refreshed.push((node, references.len()));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

/// Treats every fragment and file as Bevy code.
struct AllBevy;

impl ModeClassifier for AllBevy {
    fn mode_of_kind(&self, _kind: &str) -> Mode {
        Mode::Bevy
    }

    fn mode_of_file(&self, _file: &str) -> Mode {
        Mode::Bevy
    }
}

fn workspace<'a>(
    generator: &'a CountingGenerator,
    validator: &'a CountingValidator,
) -> Workspace<&'a CountingGenerator, &'a CountingValidator> {
    Workspace::new(generator, validator, CacheConfig::default())
}

/// A function with a numeric child plus a standalone compute shader.
fn populate<G, V, R, C>(ws: &mut Workspace<G, V, R, C>) -> (NodeId, NodeId, NodeId)
where
    G: CodeGenerator,
    V: Validator,
    R: IndicatorRenderer,
    C: ModeClassifier,
{
    ws.edit(|g| {
        let func = g.add_node("rust_function")?;
        let num = g.add_node("rust_number")?;
        let shader = g.add_node("wgsl_compute_entry")?;
        g.set_field(func, "NAME", "step")?;
        g.set_field(num, "NUM", 1)?;
        g.connect(func, "BODY", num)?;
        Ok((func, num, shader))
    })
    .unwrap()
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

#[test]
fn test_unchanged_graph_hits_cache() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    populate(&mut ws);

    let first = ws.generated_code().unwrap();
    let second = ws.generated_code().unwrap();
    assert_eq!(first, second);
    assert_eq!(gen.calls.get(), 1, "second read must be served from cache");

    assert!(ws.validation().unwrap().valid);
    assert!(ws.validation().unwrap().valid);
    assert_eq!(val.calls.get(), 1);

    let stats = ws.cache_stats();
    assert_eq!((stats.code.hits, stats.code.misses), (1, 1));
    assert_eq!((stats.validation.hits, stats.validation.misses), (1, 1));
    assert_eq!(stats.code.hit_rate, 0.5);
}

#[test]
fn test_content_edit_misses_and_revert_hits() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, num, _) = populate(&mut ws);
    ws.generated_code().unwrap();
    let original_hash = ws.content_hash();

    ws.edit(|g| g.set_field(num, "NUM", 2)).unwrap();
    assert_ne!(ws.content_hash(), original_hash);
    ws.generated_code().unwrap();
    assert_eq!(gen.calls.get(), 2, "field edit must miss");

    ws.edit(|g| g.set_field(num, "NUM", 1)).unwrap();
    assert_eq!(ws.content_hash(), original_hash, "revert restores the hash");
    ws.generated_code().unwrap();
    assert_eq!(gen.calls.get(), 2, "reverted state is still cached");

    ws.edit(|g| g.set_field(func, "NAME", "Step")).unwrap();
    let report = ws.validation().unwrap();
    assert!(!report.valid);
    assert_eq!(report.errors[0].message, "function name 'Step' is not snake_case");
}

#[test]
fn test_presentation_events_ignored() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, ..) = populate(&mut ws);
    ws.mark_saved().unwrap();
    ws.generated_code().unwrap();

    assert!(!ws.notify(&GraphEvent::SelectionChanged { node: Some(func) }));
    assert!(!ws.notify(&GraphEvent::ViewportMoved));
    assert!(!ws.notify(&GraphEvent::LoadFinished));
    assert!(!ws.is_dirty());

    ws.generated_code().unwrap();
    assert_eq!(gen.calls.get(), 1);
}

#[test]
fn test_invalidate_all_forces_regeneration() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    populate(&mut ws);
    ws.generated_code().unwrap();
    ws.validation().unwrap();

    ws.invalidate_all();
    ws.generated_code().unwrap();
    ws.validation().unwrap();
    assert_eq!(gen.calls.get(), 2);
    assert_eq!(val.calls.get(), 2);
}

#[test]
fn test_generator_errors_are_not_cached() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    populate(&mut ws);

    gen.fail.set(true);
    assert!(matches!(ws.generated_code(), Err(BuildError::Generator(_))));
    gen.fail.set(false);
    assert!(ws.generated_code().is_ok());
    assert_eq!(gen.calls.get(), 2, "failed generation must not populate the cache");
    assert_eq!(ws.cache_stats().code.size, 1);
}

#[test]
fn test_bounded_code_cache_evicts_oldest() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let config = CacheConfig {
        code_capacity: 2,
        eviction: EvictionPolicy::Fifo,
        ..CacheConfig::default()
    };
    let mut ws = Workspace::new(&gen, &val, config);
    let node = ws.edit(|g| g.add_node("rust_struct")).unwrap();

    for value in 0..3 {
        ws.edit(|g| g.set_field(node, "x", value)).unwrap();
        ws.generated_code().unwrap();
    }
    assert_eq!(ws.cache_stats().code.size, 2);

    ws.edit(|g| g.set_field(node, "x", 0)).unwrap();
    ws.generated_code().unwrap();
    assert_eq!(gen.calls.get(), 4, "first-inserted state was evicted");

    ws.edit(|g| g.set_field(node, "x", 2)).unwrap();
    ws.generated_code().unwrap();
    assert_eq!(gen.calls.get(), 4, "newest state is still cached");
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

#[test]
fn test_reference_edits_miss_code_cache_only() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, ..) = populate(&mut ws);
    ws.mark_saved().unwrap();
    ws.generated_code().unwrap();
    ws.validation().unwrap();

    let r = ws
        .create_reference(func, "shader.wgsl", ReferenceOptions::new())
        .unwrap();
    assert_eq!(r.target_mode, Mode::Wgsl);

    let files = ws.generated_code().unwrap();
    assert_eq!(gen.calls.get(), 2, "reference edit must change the code key");
    assert!(files["main.rs"].starts_with("// shader reference: shader.wgsl\n\n"));
    assert!(!files["main.rs"].contains("use "), "shader targets are comment markers");

    ws.validation().unwrap();
    assert_eq!(val.calls.get(), 1, "validation does not depend on references");
    assert!(!ws.is_dirty(), "reference edits do not touch the dirty flag");

    assert!(ws.delete_reference(r.id));
    let files = ws.generated_code().unwrap();
    assert_eq!(gen.calls.get(), 3);
    assert!(files["main.rs"].starts_with("// rust_function"));
}

#[test]
fn test_imports_reach_generator() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, num, shader) = populate(&mut ws);

    ws.create_reference(func, "src/physics/body.rs", ReferenceOptions::new().symbol("Body"))
        .unwrap();
    ws.create_reference(num, "src/physics/body.rs", ReferenceOptions::new().symbol("Body"))
        .unwrap();
    ws.create_reference(shader, "common.wgsl", ReferenceOptions::new())
        .unwrap();

    let files = ws.generated_code().unwrap();
    insta::assert_snapshot!(files["main.rs"].trim_end(), @r"
    use crate::physics::body::Body;

    // rust_function 0
    // rust_number 1
    ");
    insta::assert_snapshot!(files["shader.wgsl"].trim_end(), @r"
    use crate::common::*;

    // wgsl_compute_entry 2
    ");
}

#[test]
fn test_deleting_source_node_prunes_references() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, num, shader) = populate(&mut ws);
    ws.create_reference(num, "a.rs", ReferenceOptions::new()).unwrap();
    let keep = ws
        .create_reference(shader, "b.rs", ReferenceOptions::new())
        .unwrap();

    ws.edit(|g| g.remove_node(func)).unwrap();
    assert!(ws.references().get_references(num).is_empty());
    assert_eq!(ws.references().get_all_references(), vec![keep]);

    ws.edit(|g| {
        g.clear();
        Ok(())
    })
    .unwrap();
    assert!(ws.references().is_empty());
}

#[test]
fn test_reference_export_import_between_workspaces() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, ..) = populate(&mut ws);
    ws.create_reference(func, "bevy_app.rs", ReferenceOptions::new().symbol("App"))
        .unwrap();
    let doc = ws.to_document();
    let exported = ws.export_references().unwrap();

    let mut other = Workspace::from_document(doc, &gen, &val, CacheConfig::default()).unwrap();
    let report = other.import_references(&exported).unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(other.imports(), ws.imports());
}

#[test]
fn test_custom_reference_collaborators() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let references = ReferenceGraph::with_parts(RecordingIndicators::default(), AllBevy);
    let mut ws = Workspace::with_references(&gen, &val, references, CacheConfig::default());
    let (func, num, shader) = populate(&mut ws);

    let a = ws.create_reference(num, "shader.wgsl", ReferenceOptions::new()).unwrap();
    assert_eq!((a.source_mode, a.target_mode), (Mode::Bevy, Mode::Bevy), "classifier is used");
    let b = ws.create_reference(shader, "b.rs", ReferenceOptions::new()).unwrap();
    assert!(ws.delete_reference(b.id));
    assert_eq!(
        ws.references().renderer().refreshed,
        vec![(num, 1), (shader, 1), (shader, 0)],
        "create and delete refresh the source node"
    );

    ws.edit(|g| g.remove_node(func)).unwrap();
    assert!(ws.references().is_empty());
    assert_eq!(ws.references().renderer().refreshed.last(), Some(&(num, 0)), "prune refreshes");
    assert_eq!(ws.imports(), ImportMap::new());

    ws.clear_references();
    assert_eq!(ws.references().renderer().clears, 1);
}

// ---------------------------------------------------------------------------
// Save state and documents
// ---------------------------------------------------------------------------

#[test]
fn test_save_baseline() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    assert!(ws.has_unsaved_changes().unwrap(), "never saved");

    let (_, num, _) = populate(&mut ws);
    assert!(ws.is_dirty());
    ws.mark_saved().unwrap();
    assert!(!ws.is_dirty());
    assert!(!ws.has_unsaved_changes().unwrap());

    ws.edit(|g| g.set_field(num, "NUM", 5)).unwrap();
    assert!(ws.is_dirty());
    assert!(ws.has_unsaved_changes().unwrap());

    ws.edit(|g| g.set_field(num, "NUM", 1)).unwrap();
    assert!(ws.is_dirty(), "dirty flag stays set until the next save");
    assert!(!ws.has_unsaved_changes().unwrap(), "snapshot comparison sees the revert");
}

#[test]
fn test_loaded_workspace_is_clean() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut source = workspace(&gen, &val);
    populate(&mut source);
    let json = source.to_document().to_json().unwrap();

    let doc = GraphDocument::from_json(&json).unwrap();
    let mut loaded = Workspace::from_document(doc, &gen, &val, CacheConfig::default()).unwrap();
    assert!(!loaded.is_dirty());
    assert!(!loaded.has_unsaved_changes().unwrap());
    assert_eq!(loaded.content_hash(), source.content_hash());

    let id = loaded.edit(|g| g.add_node("bevy_system")).unwrap();
    assert_eq!(id, NodeId(3), "IDs continue after the loaded ones");
    assert!(loaded.is_dirty());
}

#[test]
fn test_failed_edit_leaves_state() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, ..) = populate(&mut ws);
    ws.mark_saved().unwrap();
    let before = ws.content_hash();

    let err = ws.edit(|g| g.connect(func, "BODY", func)).unwrap_err();
    assert!(matches!(err, BuildError::Core(_)));
    assert_eq!(ws.content_hash(), before);
    assert!(!ws.is_dirty());
}

#[test]
fn test_changed_roots() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let (func, num, shader) = populate(&mut ws);
    assert_eq!(ws.changed_roots().new.len(), 2, "before generation every root is new");

    ws.generated_code().unwrap();
    assert!(ws.changed_roots().is_clean());

    ws.edit(|g| g.set_field(num, "NUM", 9)).unwrap();
    let changes = ws.changed_roots();
    assert!(changes.modified.contains(&func), "child edit marks its root");
    assert!(!changes.modified.contains(&shader));
}

// ---------------------------------------------------------------------------
// Static lookups
// ---------------------------------------------------------------------------

#[test]
fn test_toolbox_and_definitions_are_read_through() {
    let (gen, val) = (CountingGenerator::default(), CountingValidator::default());
    let mut ws = workspace(&gen, &val);
    let loads = Cell::new(0);

    for _ in 0..3 {
        let toolbox = ws.toolbox(Mode::Wgsl, |mode| {
            loads.set(loads.get() + 1);
            json!({"mode": mode.as_str(), "categories": []})
        });
        assert_eq!(toolbox["mode"], "wgsl");
    }
    assert_eq!(loads.get(), 1);

    assert!(ws.node_definition("mystery", |_| None).is_none());
    let def = ws.node_definition("rust_function", |kind| Some(json!({"type": kind})));
    assert_eq!(def, Some(json!({"type": "rust_function"})));
    let cached = ws.node_definition("rust_function", |_| panic!("must be cached"));
    assert_eq!(cached, def);

    let node = ws.edit(|g| g.add_node("rust_struct")).unwrap();
    ws.edit(|g| g.set_field(node, "x", 1)).unwrap();
    ws.invalidate_all();
    assert_eq!(ws.cache_stats().toolbox.size, 1, "edits and invalidate_all keep lookups");
    assert_eq!(ws.cache_stats().definitions.size, 1);

    ws.clear_all_caches();
    assert_eq!(ws.cache_stats().toolbox.size, 0);
    assert_eq!(ws.cache_stats().definitions.size, 0);
}
