//! Core data model for weft workspaces.
//!
//! A workspace is a forest of [`Node`]s edited through a visual surface.
//! [`ProgramGraph`] owns the nodes, enforces the tree invariants (no dangling
//! connections, single parent, no cycles), and queues a [`GraphEvent`] for
//! every mutation so that caching layers can react to edits.
//!
//! # Modules
//!
//! - [`id`]: stable ID newtypes
//! - [`node`]: nodes and scalar field values
//! - [`graph`]: the mutable program graph
//! - [`event`]: change notifications and their classification
//! - [`mode`]: sub-language modes and the swappable classification strategy
//! - [`document`]: JSON document form of a graph
//! - [`error`]: [`CoreError`]

pub mod document;
pub mod error;
pub mod event;
pub mod graph;
pub mod id;
pub mod mode;
pub mod node;

pub use document::GraphDocument;
pub use error::CoreError;
pub use event::{EventClass, GraphEvent};
pub use graph::ProgramGraph;
pub use id::{NodeId, ReferenceId};
pub use mode::{HeuristicClassifier, Mode, ModeClassifier};
pub use node::{FieldValue, Node};
