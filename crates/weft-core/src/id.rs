//! Stable ID newtypes for workspace entities.
//!
//! IDs are distinct newtype wrappers so that a `NodeId` cannot be used where
//! a `ReferenceId` is expected. Both are allocated from monotonically
//! increasing counters and never reused within their owner's lifetime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier, unique within one workspace.
///
/// Ordering is numeric, which gives the state hasher a total,
/// locale-independent sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Cross-fragment reference identifier, unique for the lifetime of one
/// reference graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(pub u64);

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        assert_eq!(format!("{}", NodeId(7)), "7");
    }

    #[test]
    fn reference_id_display() {
        assert_eq!(format!("{}", ReferenceId(99)), "99");
    }

    #[test]
    fn node_ids_order_numerically() {
        let mut ids = vec![NodeId(10), NodeId(2), NodeId(33), NodeId(1)];
        ids.sort();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(10), NodeId(33)]);
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&NodeId(42)).unwrap();
        assert_eq!(json, "42");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeId(42));

        let back: ReferenceId = serde_json::from_str("7").unwrap();
        assert_eq!(back, ReferenceId(7));
    }
}
