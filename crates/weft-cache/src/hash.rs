//! Deterministic content hashing for program graphs using blake3.
//!
//! The fingerprint is derived from a canonical snapshot of every node:
//! `{id, kind, disabled, fields, connections}`. Hashes are derived state,
//! never stored alongside the graph.
//!
//! # Determinism
//!
//! Same projected content always produces the same hash, regardless of node
//! object identity or in-memory ordering. This is ensured by:
//! - Sorting records by `NodeId` (numeric, locale-independent)
//! - Canonicalizing fields and connections into name-sorted `BTreeMap`s, so
//!   edit order does not leak into the hash
//! - Using `serde_json::to_vec` for canonical serialization
//! - Never iterating `HashMap` directly for hash-affecting operations

use std::collections::BTreeMap;

use serde::Serialize;

use weft_core::graph::ProgramGraph;
use weft_core::id::NodeId;
use weft_core::node::{FieldValue, Node};

use crate::types::ContentHash;

/// Canonical projection of one node.
#[derive(Serialize)]
struct NodeRecord<'a> {
    id: NodeId,
    kind: &'a str,
    disabled: bool,
    fields: BTreeMap<&'a str, &'a FieldValue>,
    connections: BTreeMap<&'a str, NodeId>,
}

impl<'a> NodeRecord<'a> {
    fn of(node: &'a Node) -> Self {
        NodeRecord {
            id: node.id(),
            kind: node.kind(),
            disabled: node.is_disabled(),
            fields: node
                .fields()
                .iter()
                .map(|(name, value)| (name.as_str(), value))
                .collect(),
            connections: node
                .connections()
                .iter()
                .map(|(slot, &child)| (slot.as_str(), child))
                .collect(),
        }
    }
}

/// Builds records for `ids`, sorted by ID.
fn records<'a>(graph: &'a ProgramGraph, ids: impl IntoIterator<Item = NodeId>) -> Vec<NodeRecord<'a>> {
    let mut out: Vec<NodeRecord<'a>> = ids
        .into_iter()
        .filter_map(|id| graph.get(id))
        .map(NodeRecord::of)
        .collect();
    out.sort_by_key(|r| r.id);
    out
}

fn digest(records: &[NodeRecord<'_>]) -> ContentHash {
    if records.is_empty() {
        return ContentHash::Empty;
    }
    // Records hold only strings, bools, numbers, and string-keyed maps
    let bytes = serde_json::to_vec(records).expect("node record serialization should never fail");
    ContentHash::from_digest(blake3::hash(&bytes))
}

/// Computes the content hash of the whole graph.
///
/// Returns [`ContentHash::Empty`] for a graph with zero nodes.
pub fn hash_graph(graph: &ProgramGraph) -> ContentHash {
    let all = records(graph, graph.nodes().map(|n| n.id()));
    digest(&all)
}

/// Computes the content hash of the tree rooted at `root`.
///
/// Uses the same algorithm as [`hash_graph`] restricted to the subtree.
/// Returns [`ContentHash::Empty`] if `root` does not exist.
pub fn hash_subtree(graph: &ProgramGraph, root: NodeId) -> ContentHash {
    let subtree = records(graph, graph.subtree(root));
    digest(&subtree)
}

/// Computes subtree hashes for every root, keyed by root ID.
pub fn hash_roots(graph: &ProgramGraph) -> BTreeMap<NodeId, ContentHash> {
    graph
        .roots()
        .into_iter()
        .map(|root| (root, hash_subtree(graph, root)))
        .collect()
}

/// Returns the canonical text the graph hash is computed from.
pub fn canonical_snapshot(graph: &ProgramGraph) -> String {
    let all = records(graph, graph.nodes().map(|n| n.id()));
    serde_json::to_string(&all).expect("node record serialization should never fail")
}
