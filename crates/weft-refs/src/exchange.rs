//! JSON export and bulk import of references.
//!
//! The exchange document is
//! `{ "version": 1, "references": [ { "id": .., "sourceNodeId": .., ... } ] }`.
//! Import is tolerant: records that are malformed or whose source node no
//! longer exists are skipped with a warning and listed in the
//! [`ImportReport`]. Only a blob that cannot be parsed at all is an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use weft_core::graph::ProgramGraph;
use weft_core::id::NodeId;
use weft_core::mode::{Mode, ModeClassifier};

use crate::error::ReferenceError;
use crate::indicators::IndicatorRenderer;
use crate::manager::ReferenceGraph;
use crate::reference::{normalize_symbol, Reference};

/// Current exchange document version.
pub const REFERENCES_VERSION: u32 = 1;

#[derive(Serialize)]
struct ExportDocument<'a> {
    version: u32,
    references: &'a [Reference],
}

/// One imported record, with every field optional so that missing fields
/// become a skip rather than a parse failure.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRecord {
    source_node_id: Option<u32>,
    target_file: Option<String>,
    target_mode: Option<Mode>,
    target_symbol: Option<String>,
    description: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

/// A record that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSkip {
    /// Position of the record in the `references` array.
    pub index: usize,
    pub reason: String,
}

/// Outcome of [`ReferenceGraph::import_references`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Number of references created.
    pub imported: usize,
    pub skipped: Vec<ImportSkip>,
}

impl<R: IndicatorRenderer, C: ModeClassifier> ReferenceGraph<R, C> {
    /// Serializes every reference as a pretty-printed exchange document.
    pub fn export_references(&self) -> Result<String, ReferenceError> {
        let references = self.get_all_references();
        let doc = ExportDocument {
            version: REFERENCES_VERSION,
            references: &references,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Imports references from an exchange document.
    ///
    /// Existing references are kept. Imported references get fresh IDs; the
    /// source mode is re-derived from the node as it is now. A bare JSON
    /// array of records is accepted as well.
    pub fn import_references(
        &mut self,
        graph: &ProgramGraph,
        text: &str,
    ) -> Result<ImportReport, ReferenceError> {
        let blob: Value =
            serde_json::from_str(text).map_err(|e| ReferenceError::Parse(e.to_string()))?;
        let records = match blob {
            Value::Array(records) => records,
            Value::Object(mut doc) => match doc.remove("references") {
                Some(Value::Array(records)) => records,
                _ => {
                    return Err(ReferenceError::Parse(
                        "missing \"references\" array".to_string(),
                    ))
                }
            },
            _ => {
                return Err(ReferenceError::Parse(
                    "expected an object or an array".to_string(),
                ))
            }
        };

        let mut report = ImportReport::default();
        let mut touched: Vec<NodeId> = Vec::new();

        for (index, raw) in records.into_iter().enumerate() {
            match self.import_record(graph, raw) {
                Ok(source) => {
                    report.imported += 1;
                    if !touched.contains(&source) {
                        touched.push(source);
                    }
                }
                Err(reason) => {
                    warn!(index, %reason, "skipping reference record");
                    report.skipped.push(ImportSkip { index, reason });
                }
            }
        }

        if report.imported > 0 {
            self.bump_version();
        }
        for node in touched {
            self.refresh(node);
        }
        debug!(
            imported = report.imported,
            skipped = report.skipped.len(),
            "references imported"
        );
        Ok(report)
    }

    /// Validates and inserts one record. Returns its source node.
    fn import_record(&mut self, graph: &ProgramGraph, raw: Value) -> Result<NodeId, String> {
        let record: ImportRecord =
            serde_json::from_value(raw).map_err(|e| format!("malformed record: {}", e))?;

        let source = NodeId(record.source_node_id.ok_or("missing sourceNodeId")?);
        let target_file = record
            .target_file
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .ok_or("missing targetFile")?;
        let source_mode = self
            .classify(graph, source)
            .ok_or_else(|| format!("source node {} no longer exists", source))?;

        let now = Utc::now();
        let reference = Reference {
            id: self.allocate_id(),
            source_node_id: source,
            source_mode,
            target_mode: record
                .target_mode
                .unwrap_or_else(|| self.classify_file(&target_file)),
            target_file,
            target_symbol: record.target_symbol.and_then(normalize_symbol),
            description: record.description.unwrap_or_default(),
            created_at: record.created_at.unwrap_or(now),
            updated_at: now,
        };
        self.insert(reference);
        Ok(source)
    }
}
