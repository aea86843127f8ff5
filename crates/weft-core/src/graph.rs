//! ProgramGraph: the mutable forest of fragments a user edits.
//!
//! [`ProgramGraph`] is the single entry point for constructing and mutating
//! a workspace's nodes. It enforces the tree invariants:
//!
//! - every connection target exists (no dangling edges),
//! - a node has at most one parent,
//! - no node is its own ancestor.
//!
//! Node IDs come from a monotonically increasing counter and are never
//! reused, even after deletion. Every successful mutation queues a
//! [`GraphEvent`]; consumers drain them with [`ProgramGraph::take_events`].
//! Mutations that would violate an invariant fail with a [`CoreError`] and
//! leave the graph untouched.

use std::collections::{BTreeMap, HashMap};

use crate::error::CoreError;
use crate::event::GraphEvent;
use crate::id::NodeId;
use crate::node::{FieldValue, Node};

/// The workspace's node forest.
#[derive(Debug, Clone, Default)]
pub struct ProgramGraph {
    /// All nodes, ordered by ID.
    nodes: BTreeMap<NodeId, Node>,
    /// Reverse of every node's `connections`: child -> (parent, slot).
    parents: HashMap<NodeId, (NodeId, String)>,
    /// Next node ID counter.
    next_node_id: u32,
    /// Mutation events not yet drained.
    events: Vec<GraphEvent>,
}

impl ProgramGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from already-validated parts.
    ///
    /// Used by the document loader, which checks the invariants before
    /// calling this. No events are queued.
    pub(crate) fn from_parts(nodes: BTreeMap<NodeId, Node>, next_node_id: u32) -> Self {
        let mut parents = HashMap::new();
        for node in nodes.values() {
            for (slot, &child) in node.connections() {
                parents.insert(child, (node.id(), slot.clone()));
            }
        }
        ProgramGraph {
            nodes,
            parents,
            next_node_id,
            events: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns `true` if the node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in ascending ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// The value the next created node will receive.
    pub fn next_node_id(&self) -> u32 {
        self.next_node_id
    }

    /// The parent of `id` and the slot it occupies, if attached.
    pub fn parent(&self, id: NodeId) -> Option<(NodeId, &str)> {
        self.parents
            .get(&id)
            .map(|(parent, slot)| (*parent, slot.as_str()))
    }

    /// Top-level nodes (one per file container), in ascending ID order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .filter(|id| !self.parents.contains_key(id))
            .copied()
            .collect()
    }

    /// The root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        let mut current = id;
        while let Some((parent, _)) = self.parents.get(&current) {
            current = *parent;
        }
        Some(current)
    }

    /// `root` and all its descendants in pre-order (slots in attachment
    /// order). Empty if `root` does not exist.
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                // Reverse so the first slot is visited first.
                for &child in node.connections().values().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Returns `true` if `ancestor` lies on the parent chain of `id`
    /// (or is `id` itself).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == ancestor {
                return true;
            }
            match self.parents.get(&current) {
                Some((parent, _)) => current = *parent,
                None => return false,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Events queued since the last drain.
    pub fn pending_events(&self) -> &[GraphEvent] {
        &self.events
    }

    /// Drains queued mutation events in the order they happened.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Creates a detached node of the given kind.
    pub fn add_node(&mut self, kind: impl Into<String>) -> Result<NodeId, CoreError> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(CoreError::EmptyKind);
        }
        let id = NodeId(self.next_node_id);
        self.next_node_id = self
            .next_node_id
            .checked_add(1)
            .ok_or(CoreError::IdSpaceExhausted)?;
        self.nodes.insert(id, Node::new(id, kind));
        self.events.push(GraphEvent::NodeCreated { node: id });
        Ok(id)
    }

    /// Deletes a node together with its whole subtree.
    ///
    /// The node is first detached from its parent. Returns the deleted IDs
    /// in pre-order.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, CoreError> {
        if !self.contains(id) {
            return Err(CoreError::NodeNotFound { id });
        }
        if let Some((parent, slot)) = self.parents.remove(&id) {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.connections_mut().shift_remove(&slot);
            }
        }
        let subtree = self.subtree(id);
        for node in &subtree {
            self.nodes.remove(node);
            self.parents.remove(node);
        }
        self.events.push(GraphEvent::NodeDeleted {
            node: id,
            subtree: subtree.clone(),
        });

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(subtree)
    }

    /// Sets a field, returning the previous value.
    ///
    /// Writing a value equal to the current one is a no-op and raises no
    /// event. NaN and infinite numbers are rejected.
    pub fn set_field(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Result<Option<FieldValue>, CoreError> {
        let name = name.into();
        let value = value.into();
        if !value.is_finite() {
            return Err(CoreError::NonFiniteNumber { node: id, name });
        }
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(CoreError::NodeNotFound { id })?;
        if node.field(&name) == Some(&value) {
            return Ok(Some(value));
        }
        let previous = node.fields_mut().insert(name.clone(), value);
        self.events.push(GraphEvent::FieldChanged { node: id, name });
        Ok(previous)
    }

    /// Removes a field, returning its value if it was set.
    pub fn remove_field(&mut self, id: NodeId, name: &str) -> Result<Option<FieldValue>, CoreError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(CoreError::NodeNotFound { id })?;
        let previous = node.fields_mut().shift_remove(name);
        if previous.is_some() {
            self.events.push(GraphEvent::FieldChanged {
                node: id,
                name: name.to_string(),
            });
        }
        Ok(previous)
    }

    /// Enables or disables a node.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(CoreError::NodeNotFound { id })?;
        if node.is_disabled() != disabled {
            node.set_disabled(disabled);
            self.events
                .push(GraphEvent::DisabledChanged { node: id, disabled });
        }
        Ok(())
    }

    /// Plugs `child` into `parent`'s `slot`.
    ///
    /// `child` must be detached. If the slot is occupied, its current
    /// occupant is detached (it becomes a root) and returned.
    pub fn connect(
        &mut self,
        parent: NodeId,
        slot: impl Into<String>,
        child: NodeId,
    ) -> Result<Option<NodeId>, CoreError> {
        let slot = slot.into();
        if slot.is_empty() {
            return Err(CoreError::EmptySlot);
        }
        if !self.contains(parent) {
            return Err(CoreError::NodeNotFound { id: parent });
        }
        if !self.contains(child) {
            return Err(CoreError::NodeNotFound { id: child });
        }
        if parent == child {
            return Err(CoreError::SelfConnection { id: child });
        }
        if let Some((current_parent, _)) = self.parents.get(&child) {
            return Err(CoreError::AlreadyAttached {
                child,
                parent: *current_parent,
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(CoreError::WouldCreateCycle { parent, child });
        }

        let displaced = self.disconnect(parent, &slot)?;

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.connections_mut().insert(slot.clone(), child);
        }
        self.parents.insert(child, (parent, slot.clone()));
        self.events.push(GraphEvent::Connected {
            parent,
            slot,
            child,
        });

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(displaced)
    }

    /// Empties `parent`'s `slot`, returning the detached child.
    pub fn disconnect(&mut self, parent: NodeId, slot: &str) -> Result<Option<NodeId>, CoreError> {
        let node = self
            .nodes
            .get_mut(&parent)
            .ok_or(CoreError::NodeNotFound { id: parent })?;
        let Some(child) = node.connections_mut().shift_remove(slot) else {
            return Ok(None);
        };
        self.parents.remove(&child);
        self.events.push(GraphEvent::Disconnected {
            parent,
            slot: slot.to_string(),
            child,
        });
        Ok(Some(child))
    }

    /// Deletes every node. The ID counter keeps counting.
    pub fn clear(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        self.nodes.clear();
        self.parents.clear();
        self.events.push(GraphEvent::GraphCleared);
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Checks that `parents` mirrors the nodes' connections exactly.
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        let mut seen = 0usize;
        for node in self.nodes.values() {
            for (slot, child) in node.connections() {
                assert!(
                    self.nodes.contains_key(child),
                    "dangling connection {}.{} -> {}",
                    node.id(),
                    slot,
                    child
                );
                assert_eq!(
                    self.parents.get(child),
                    Some(&(node.id(), slot.clone())),
                    "parent index out of sync for {}",
                    child
                );
                seen += 1;
            }
        }
        assert_eq!(seen, self.parents.len(), "stale parent index entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: fn -> body -> expr chain plus a detached node.
    fn build_chain() -> (ProgramGraph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = ProgramGraph::new();
        let func = graph.add_node("rust_function").unwrap();
        let body = graph.add_node("rust_let").unwrap();
        let expr = graph.add_node("rust_number").unwrap();
        let loose = graph.add_node("wgsl_compute_entry").unwrap();
        graph.connect(func, "BODY", body).unwrap();
        graph.connect(body, "VALUE", expr).unwrap();
        graph.take_events();
        (graph, func, body, expr, loose)
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut graph = ProgramGraph::new();
        let a = graph.add_node("rust_a").unwrap();
        let b = graph.add_node("rust_b").unwrap();
        graph.remove_node(b).unwrap();
        let c = graph.add_node("rust_c").unwrap();
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(c, NodeId(2), "deleted IDs must not be reused");
    }

    #[test]
    fn test_empty_kind_rejected() {
        let mut graph = ProgramGraph::new();
        assert!(matches!(graph.add_node(""), Err(CoreError::EmptyKind)));
        assert!(graph.is_empty());
        assert_eq!(graph.next_node_id(), 0);
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let (mut graph, _func, _body, expr, _loose) = build_chain();
        graph.set_field(expr, "NUM", 2.5).unwrap();
        graph.take_events();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = graph.set_field(expr, "NUM", bad).unwrap_err();
            assert!(
                matches!(err, CoreError::NonFiniteNumber { node, ref name } if node == expr && name == "NUM"),
                "{} must be rejected, got {:?}",
                bad,
                err
            );
        }
        assert_eq!(graph.get(expr).unwrap().field("NUM"), Some(&FieldValue::Number(2.5)));
        assert!(graph.take_events().is_empty(), "rejected writes must not emit");
    }

    #[test]
    fn test_roots_and_subtree() {
        let (graph, func, body, expr, loose) = build_chain();
        assert_eq!(graph.roots(), vec![func, loose]);
        assert_eq!(graph.subtree(func), vec![func, body, expr]);
        assert_eq!(graph.root_of(expr), Some(func));
        assert_eq!(graph.parent(expr), Some((body, "VALUE")));
        assert_eq!(graph.parent(func), None);
    }

    #[test]
    fn test_connect_rejects_second_parent() {
        let (mut graph, func, _body, expr, loose) = build_chain();
        let err = graph.connect(loose, "X", expr).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyAttached { .. }));
        assert_eq!(graph.root_of(expr), Some(func));
        assert!(graph.take_events().is_empty(), "failed mutation must not emit");
    }

    #[test]
    fn test_connect_rejects_cycle() {
        let (mut graph, func, _body, expr, _loose) = build_chain();
        let err = graph.connect(expr, "LOOP", func).unwrap_err();
        assert!(matches!(err, CoreError::WouldCreateCycle { .. }));
    }

    #[test]
    fn test_connect_rejects_self_and_missing() {
        let (mut graph, func, ..) = build_chain();
        assert!(matches!(
            graph.connect(func, "X", func),
            Err(CoreError::SelfConnection { .. })
        ));
        assert!(matches!(
            graph.connect(func, "X", NodeId(99)),
            Err(CoreError::NodeNotFound { .. })
        ));
        assert!(matches!(graph.connect(func, "", NodeId(3)), Err(CoreError::EmptySlot)));
    }

    #[test]
    fn test_connect_displaces_occupant() {
        let (mut graph, _func, body, expr, loose) = build_chain();
        let displaced = graph.connect(body, "VALUE", loose).unwrap();
        assert_eq!(displaced, Some(expr));
        assert_eq!(graph.parent(expr), None, "displaced child becomes a root");
        assert_eq!(graph.get(body).unwrap().child("VALUE"), Some(loose));

        let events = graph.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GraphEvent::Disconnected { child, .. } if child == expr));
        assert!(matches!(events[1], GraphEvent::Connected { child, .. } if child == loose));
    }

    #[test]
    fn test_remove_node_deletes_subtree_and_detaches() {
        let (mut graph, func, body, expr, loose) = build_chain();
        let removed = graph.remove_node(body).unwrap();
        assert_eq!(removed, vec![body, expr]);
        assert!(!graph.contains(expr));
        assert!(graph.get(func).unwrap().connections().is_empty());
        assert_eq!(graph.roots(), vec![func, loose]);
        assert!(matches!(
            graph.remove_node(body),
            Err(CoreError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn test_set_field_emits_only_on_change() {
        let (mut graph, func, ..) = build_chain();
        assert_eq!(graph.set_field(func, "NAME", "update").unwrap(), None);
        graph.set_field(func, "NAME", "update").unwrap();
        let prev = graph.set_field(func, "NAME", "tick").unwrap();
        assert_eq!(prev, Some(FieldValue::from("update")));
        assert_eq!(graph.take_events().len(), 2);
    }

    #[test]
    fn test_remove_field_and_disabled() {
        let (mut graph, func, ..) = build_chain();
        graph.set_field(func, "X", 1).unwrap();
        graph.take_events();
        assert_eq!(graph.remove_field(func, "X").unwrap(), Some(FieldValue::Number(1.0)));
        assert_eq!(graph.remove_field(func, "X").unwrap(), None);
        graph.set_disabled(func, true).unwrap();
        graph.set_disabled(func, true).unwrap();
        assert!(graph.get(func).unwrap().is_disabled());
        assert_eq!(graph.take_events().len(), 2);
    }

    #[test]
    fn test_disconnect_empty_slot_is_none() {
        let (mut graph, func, ..) = build_chain();
        assert_eq!(graph.disconnect(func, "MISSING").unwrap(), None);
        assert!(graph.take_events().is_empty());
    }

    #[test]
    fn test_clear_keeps_counter() {
        let (mut graph, ..) = build_chain();
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.roots().is_empty());
        assert_eq!(graph.take_events(), vec![GraphEvent::GraphCleared]);
        assert_eq!(graph.add_node("rust_x").unwrap(), NodeId(4));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Arbitrary connect attempts never break the single-parent tree.
            #[test]
            fn random_connects_keep_a_forest(
                count in 1usize..12,
                attempts in proptest::collection::vec((0u32..12, 0u32..12, 0u8..3), 0..40),
            ) {
                let mut graph = ProgramGraph::new();
                for _ in 0..count {
                    graph.add_node("rust_n").unwrap();
                }
                for (p, c, s) in attempts {
                    let _ = graph.connect(NodeId(p), format!("S{}", s), NodeId(c));
                }
                // Every node reaches exactly one root, and subtrees of roots
                // partition the graph.
                let mut covered: Vec<NodeId> = graph
                    .roots()
                    .into_iter()
                    .flat_map(|r| graph.subtree(r))
                    .collect();
                covered.sort();
                let all: Vec<NodeId> = graph.nodes().map(|n| n.id()).collect();
                prop_assert_eq!(covered, all);
            }
        }
    }
}
