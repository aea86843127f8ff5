//! Program fragments and their scalar field values.
//!
//! A [`Node`] is one visual fragment: a schema `kind`, a `disabled` flag, an
//! ordered set of named scalar fields, and named connection slots holding
//! child node IDs. Slot contents are managed by
//! [`ProgramGraph`](crate::graph::ProgramGraph) so the tree invariants hold;
//! this module only exposes read access to them.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// A scalar value held by a node field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// False for NaN and infinite numbers, which have no JSON form.
    pub fn is_finite(&self) -> bool {
        match self {
            FieldValue::Number(n) => n.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// One visual program fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    kind: String,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    fields: IndexMap<String, FieldValue>,
    #[serde(default)]
    connections: IndexMap<String, NodeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: String) -> Self {
        Node {
            id,
            kind,
            disabled: false,
            fields: IndexMap::new(),
            connections: IndexMap::new(),
        }
    }

    /// The node's stable identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The schema tag this node was created with.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Disabled nodes are skipped by generators but still hashed.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// All fields in their edit order.
    pub fn fields(&self) -> &IndexMap<String, FieldValue> {
        &self.fields
    }

    /// Looks up a single field value.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Occupied connection slots in attachment order.
    pub fn connections(&self) -> &IndexMap<String, NodeId> {
        &self.connections
    }

    /// The child plugged into `slot`, if any.
    pub fn child(&self, slot: &str) -> Option<NodeId> {
        self.connections.get(slot).copied()
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub(crate) fn fields_mut(&mut self) -> &mut IndexMap<String, FieldValue> {
        &mut self.fields
    }

    pub(crate) fn connections_mut(&mut self) -> &mut IndexMap<String, NodeId> {
        &mut self.connections
    }
}
