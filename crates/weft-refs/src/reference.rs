//! The reference record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use weft_core::id::{NodeId, ReferenceId};
use weft_core::mode::Mode;

/// Directed edge from a source node to a target file/symbol.
///
/// Values handed out by [`ReferenceGraph`](crate::manager::ReferenceGraph)
/// are clones; mutating them never touches the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub id: ReferenceId,
    pub source_node_id: NodeId,
    pub source_mode: Mode,
    pub target_file: String,
    pub target_mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_symbol: Option<String>,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reference {
    /// Whether source and target are in different sub-languages.
    pub fn is_cross_language(&self) -> bool {
        self.source_mode != self.target_mode
    }
}

/// Optional fields for creating or updating a reference.
///
/// On update, only `Some` fields are applied. An empty `target_symbol`
/// clears the symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceOptions {
    /// Explicit target mode; inferred from the target file when absent.
    pub target_mode: Option<Mode>,
    pub target_symbol: Option<String>,
    pub description: Option<String>,
}

impl ReferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.target_mode = Some(mode);
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.target_symbol = Some(symbol.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Normalizes a symbol: blank means "no symbol".
pub(crate) fn normalize_symbol(symbol: String) -> Option<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == symbol.len() {
        Some(symbol)
    } else {
        Some(trimmed.to_string())
    }
}
