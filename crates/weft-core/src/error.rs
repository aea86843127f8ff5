//! Core error types for weft-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of graph mutation and document loading.

use thiserror::Error;

use crate::id::NodeId;

/// Core errors produced by the weft-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node ID was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// Node kinds must be non-empty.
    #[error("node kind must not be empty")]
    EmptyKind,

    /// Slot names must be non-empty.
    #[error("slot name must not be empty")]
    EmptySlot,

    /// A node cannot be plugged into itself.
    #[error("cannot connect NodeId({id}) to itself", id = id.0)]
    SelfConnection { id: NodeId },

    /// The child already sits in another slot.
    #[error("NodeId({child}) is already attached to NodeId({parent})", child = child.0, parent = parent.0)]
    AlreadyAttached { child: NodeId, parent: NodeId },

    /// The connection would make a node its own ancestor.
    #[error("connecting NodeId({child}) under NodeId({parent}) would create a cycle", child = child.0, parent = parent.0)]
    WouldCreateCycle { parent: NodeId, child: NodeId },

    /// A document lists the same node twice.
    #[error("duplicate node in document: NodeId({id})", id = id.0)]
    DuplicateNode { id: NodeId },

    /// A document connection points at a node that does not exist.
    #[error("dangling connection: NodeId({parent}).{slot} -> NodeId({child})", parent = parent.0, child = child.0)]
    DanglingConnection {
        parent: NodeId,
        slot: String,
        child: NodeId,
    },

    /// A document plugs one node into more than one slot.
    #[error("NodeId({child}) has more than one parent", child = child.0)]
    MultipleParents { child: NodeId },

    /// A document's connections form a cycle.
    #[error("document connections form a cycle through NodeId({id})", id = id.0)]
    CyclicDocument { id: NodeId },

    /// Every node ID has been handed out.
    #[error("node ID space exhausted")]
    IdSpaceExhausted,

    /// Numeric fields must be finite.
    #[error("field '{name}' of NodeId({node}) must be a finite number", node = node.0)]
    NonFiniteNumber { node: NodeId, name: String },

    /// JSON serialization or deserialization of a document failed.
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),
}
