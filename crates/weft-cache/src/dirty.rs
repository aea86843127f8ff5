//! Workspace change tracking.
//!
//! [`ChangeTracker`] reacts to graph events: content edits mark the
//! workspace dirty, presentation and load-finished events are ignored. It
//! never evicts hash-keyed cache entries itself; a changed graph hashes
//! differently and simply misses. Saved-state detection compares serialized
//! documents directly rather than hashes.
//!
//! [`compute_root_changes`] compares per-root subtree hashes from the last
//! build against the current graph to report which file containers changed.

use std::collections::{BTreeMap, BTreeSet};

use weft_core::event::GraphEvent;
use weft_core::graph::ProgramGraph;
use weft_core::id::NodeId;

use crate::hash::hash_roots;
use crate::types::ContentHash;

/// Dirty flag plus the last-saved document baseline.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    dirty: bool,
    /// Serialized document recorded by the last `mark_saved`.
    last_saved: Option<String>,
    /// Content events observed since creation.
    content_edits: u64,
}

impl ChangeTracker {
    /// A clean tracker with no saved baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean tracker whose baseline is `snapshot` (e.g. just loaded).
    pub fn with_baseline(snapshot: String) -> Self {
        ChangeTracker {
            dirty: false,
            last_saved: Some(snapshot),
            content_edits: 0,
        }
    }

    /// Feeds one event. Returns `true` if it counted as a content edit.
    pub fn observe(&mut self, event: &GraphEvent) -> bool {
        if !event.is_content() {
            return false;
        }
        self.dirty = true;
        self.content_edits += 1;
        true
    }

    /// Feeds a batch of events. Returns how many counted.
    pub fn observe_all<'a>(&mut self, events: impl IntoIterator<Item = &'a GraphEvent>) -> usize {
        events.into_iter().filter(|e| self.observe(e)).count()
    }

    /// Whether a content edit happened since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Total content edits observed.
    pub fn content_edits(&self) -> u64 {
        self.content_edits
    }

    /// Clears the dirty flag and records `snapshot` as the saved baseline.
    pub fn mark_saved(&mut self, snapshot: String) {
        self.dirty = false;
        self.last_saved = Some(snapshot);
    }

    /// The baseline recorded by the last save, if any.
    pub fn last_saved(&self) -> Option<&str> {
        self.last_saved.as_deref()
    }

    /// Compares `current` with the saved baseline.
    ///
    /// Without a baseline everything counts as changed.
    pub fn changed_since_save(&self, current: &str) -> bool {
        self.last_saved.as_deref() != Some(current)
    }
}

/// File containers that changed between two builds.
///
/// Tracks three categories: new (no previous hash), modified (hash changed),
/// and removed (present in previous but not in the current graph).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootChanges {
    pub new: BTreeSet<NodeId>,
    pub modified: BTreeSet<NodeId>,
    pub removed: BTreeSet<NodeId>,
}

impl RootChanges {
    /// Returns true if nothing changed.
    pub fn is_clean(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Roots whose output must be regenerated (new + modified).
    pub fn needs_regeneration(&self) -> BTreeSet<NodeId> {
        self.new.union(&self.modified).copied().collect()
    }

    /// Total count of changed roots (new + modified + removed).
    pub fn total(&self) -> usize {
        self.new.len() + self.modified.len() + self.removed.len()
    }
}

/// Compares `previous` root hashes against the current graph.
pub fn compute_root_changes(
    graph: &ProgramGraph,
    previous: &BTreeMap<NodeId, ContentHash>,
) -> RootChanges {
    let current = hash_roots(graph);
    let mut changes = RootChanges::default();

    for (&root, &hash) in &current {
        match previous.get(&root) {
            Some(&prev) if prev == hash => {}
            Some(_) => {
                changes.modified.insert(root);
            }
            None => {
                changes.new.insert(root);
            }
        }
    }

    for &root in previous.keys() {
        if !current.contains_key(&root) {
            changes.removed.insert(root);
        }
    }

    changes
}
