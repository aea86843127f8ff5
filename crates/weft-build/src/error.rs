//! Build error types covering every failure the workspace facade surfaces.

use weft_core::CoreError;
use weft_refs::ReferenceError;

/// Errors produced by the build layer.
///
/// Generator and validator failures are returned as-is and never cached.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Graph mutation or document failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reference operation failure.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Invalid cache configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The external code generator failed.
    #[error("code generation failed: {0}")]
    Generator(String),

    /// The external validator failed to produce a report.
    #[error("validation failed: {0}")]
    Validator(String),

    /// Filesystem or subprocess I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
