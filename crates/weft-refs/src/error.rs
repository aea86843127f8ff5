//! Reference graph error types.

use thiserror::Error;

use weft_core::id::NodeId;

/// Errors produced by reference operations.
///
/// Unknown reference IDs on update/delete are not errors; those calls log a
/// warning and report absence through their return value.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The source node of a new reference does not exist.
    #[error("source node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// A required argument was empty or otherwise unusable.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A bulk-import blob could not be parsed at all.
    #[error("failed to parse reference document: {0}")]
    Parse(String),

    /// Export serialization failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
