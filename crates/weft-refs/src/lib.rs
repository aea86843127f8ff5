//! Cross-fragment reference graph for weft workspaces.
//!
//! A [`Reference`] is an explicit directed edge from a source node to a
//! target file (and optionally a symbol in it), possibly in a different
//! sub-language. References live in an overlay that is independent of the
//! program graph's tree: they may form cycles and they are never validated
//! against tree invariants.
//!
//! # Modules
//!
//! - [`reference`]: the reference record and creation/update options
//! - [`manager`]: [`ReferenceGraph`], the store plus reverse index
//! - [`imports`]: import/use statement synthesis
//! - [`exchange`]: JSON export and tolerant bulk import
//! - [`files`]: file-level view of the overlay for cycle reporting
//! - [`indicators`]: the visual-indicator collaborator seam
//! - [`error`]: [`ReferenceError`]

pub mod error;
pub mod exchange;
pub mod files;
pub mod imports;
pub mod indicators;
pub mod manager;
pub mod reference;

pub use error::ReferenceError;
pub use exchange::{ImportReport, ImportSkip, REFERENCES_VERSION};
pub use imports::{import_statement, module_path, ImportMap};
pub use indicators::{IndicatorRenderer, NoIndicators};
pub use manager::ReferenceGraph;
pub use reference::{Reference, ReferenceOptions};
