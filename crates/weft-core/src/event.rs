//! Change notifications raised by graph mutations.
//!
//! Every successful [`ProgramGraph`](crate::graph::ProgramGraph) mutation
//! queues a [`GraphEvent`]. Hosts may also feed presentation and load events
//! (selection, viewport, bulk load finished) into the same stream; these are
//! classified separately so invalidation logic can ignore them.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// How an event affects derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// The program content changed; hashes and generated code may differ.
    Content,
    /// Pure presentation change (selection, viewport).
    Presentation,
    /// Marker raised once a bulk load has finished.
    LoadFinished,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GraphEvent {
    NodeCreated {
        node: NodeId,
    },
    /// A node and its whole subtree were deleted.
    NodeDeleted {
        node: NodeId,
        subtree: Vec<NodeId>,
    },
    FieldChanged {
        node: NodeId,
        name: String,
    },
    DisabledChanged {
        node: NodeId,
        disabled: bool,
    },
    Connected {
        parent: NodeId,
        slot: String,
        child: NodeId,
    },
    Disconnected {
        parent: NodeId,
        slot: String,
        child: NodeId,
    },
    GraphCleared,
    SelectionChanged {
        node: Option<NodeId>,
    },
    ViewportMoved,
    LoadFinished,
}

impl GraphEvent {
    /// Classifies the event for invalidation purposes.
    pub fn class(&self) -> EventClass {
        match self {
            GraphEvent::SelectionChanged { .. } | GraphEvent::ViewportMoved => {
                EventClass::Presentation
            }
            GraphEvent::LoadFinished => EventClass::LoadFinished,
            _ => EventClass::Content,
        }
    }

    /// Returns `true` if the event changes program content.
    pub fn is_content(&self) -> bool {
        self.class() == EventClass::Content
    }
}
