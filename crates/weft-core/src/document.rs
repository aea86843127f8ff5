//! JSON document form of a [`ProgramGraph`].
//!
//! [`GraphDocument`] is the flat, serializable shape of a workspace: the ID
//! counter plus every node in ID order. Loading a document re-checks all
//! tree invariants, since documents come from outside the process.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::ProgramGraph;
use crate::id::NodeId;
use crate::node::Node;

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Serializable snapshot of a whole workspace graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub next_node_id: u32,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl GraphDocument {
    /// Parses a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ProgramGraph {
    /// Snapshots the graph as a document.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            version: DOCUMENT_VERSION,
            next_node_id: self.next_node_id(),
            nodes: self.nodes().cloned().collect(),
        }
    }

    /// Rebuilds a graph from a document, validating every invariant.
    ///
    /// The ID counter is raised past the largest node ID if the document's
    /// counter is stale, so IDs are still never reused. No events are queued.
    pub fn from_document(doc: GraphDocument) -> Result<Self, CoreError> {
        let mut nodes: BTreeMap<NodeId, Node> = BTreeMap::new();
        for node in doc.nodes {
            if node.kind().is_empty() {
                return Err(CoreError::EmptyKind);
            }
            let id = node.id();
            if let Some((name, _)) = node.fields().iter().find(|(_, v)| !v.is_finite()) {
                return Err(CoreError::NonFiniteNumber {
                    node: id,
                    name: name.clone(),
                });
            }
            if nodes.insert(id, node).is_some() {
                return Err(CoreError::DuplicateNode { id });
            }
        }

        let mut parent_of: HashMap<NodeId, NodeId> = HashMap::new();
        for node in nodes.values() {
            for (slot, &child) in node.connections() {
                if !nodes.contains_key(&child) {
                    return Err(CoreError::DanglingConnection {
                        parent: node.id(),
                        slot: slot.clone(),
                        child,
                    });
                }
                if child == node.id() || parent_of.insert(child, node.id()).is_some() {
                    return Err(CoreError::MultipleParents { child });
                }
            }
        }

        // With single parents and no dangling edges, a node is on a cycle
        // exactly when walking up from it never reaches a root.
        let mut reaches_root: HashSet<NodeId> = HashSet::new();
        for &start in nodes.keys() {
            let mut path = Vec::new();
            let mut current = start;
            loop {
                if reaches_root.contains(&current) {
                    break;
                }
                if path.contains(&current) {
                    return Err(CoreError::CyclicDocument { id: current });
                }
                path.push(current);
                match parent_of.get(&current) {
                    Some(&parent) => current = parent,
                    None => break,
                }
            }
            reaches_root.extend(path);
        }

        let after_max = match nodes.keys().next_back() {
            Some(max) => max.0.checked_add(1).ok_or(CoreError::IdSpaceExhausted)?,
            None => 0,
        };
        let next_node_id = after_max.max(doc.next_node_id);

        Ok(ProgramGraph::from_parts(nodes, next_node_id))
    }
}
