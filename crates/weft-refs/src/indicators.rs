//! Visual indicator collaborator.
//!
//! The editing surface draws a marker on nodes that have outgoing references.
//! [`ReferenceGraph`](crate::manager::ReferenceGraph) calls the renderer
//! after every mutation so the markers stay in sync; the drawing itself
//! lives outside this crate.

use weft_core::id::NodeId;

use crate::reference::Reference;

/// Receives indicator updates from the reference graph.
pub trait IndicatorRenderer {
    /// Redraws the indicators of `node`. `references` is its full current
    /// set, empty once the last one is gone.
    fn refresh(&mut self, node: NodeId, references: &[Reference]);

    /// Removes every indicator.
    fn clear(&mut self);
}

/// Renderer for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicators;

impl IndicatorRenderer for NoIndicators {
    fn refresh(&mut self, _node: NodeId, _references: &[Reference]) {}

    fn clear(&mut self) {}
}
