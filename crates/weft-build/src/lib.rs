//! Incremental build layer for weft workspaces.
//!
//! Ties the program graph, the content hasher, the artifact caches, and the
//! reference graph together behind [`Workspace`]. Generated code and
//! validation results are produced by external collaborators
//! ([`CodeGenerator`], [`Validator`]) and only invoked on a cache miss.
//!
//! # Modules
//!
//! - [`error`] -- [`BuildError`]
//! - [`generate`] -- collaborator traits and import prepending
//! - [`diagnostics`] -- validation reports and cargo message parsing
//! - [`checker`] -- `cargo check`, `rustc` and WGSL checks for generated sources
//! - [`caches`] -- the four artifact caches a workspace owns
//! - [`workspace`] -- the facade

pub mod caches;
pub mod checker;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod workspace;

pub use caches::{ArtifactCaches, CacheStatsReport};
pub use checker::{check_wgsl, is_cargo_available, is_rustc_available, CargoChecker, CheckOutcome};
pub use diagnostics::{parse_cargo_messages, parse_rustc_messages, Diagnostic, Level, ValidationReport};
pub use error::BuildError;
pub use generate::{prepend_imports, AcceptAll, CodeGenerator, GeneratedFiles, Validator};
pub use workspace::Workspace;

use serde::{Deserialize, Serialize};

use weft_cache::EvictionPolicy;

/// Environment variable overriding [`CacheConfig::code_capacity`].
pub const CODE_CAPACITY_VAR: &str = "WEFT_CODE_CACHE_CAPACITY";
/// Environment variable overriding [`CacheConfig::validation_capacity`].
pub const VALIDATION_CAPACITY_VAR: &str = "WEFT_VALIDATION_CACHE_CAPACITY";
/// Environment variable overriding [`CacheConfig::eviction`] (`fifo|lru`).
pub const EVICTION_VAR: &str = "WEFT_CACHE_EVICTION";

/// Sizing and eviction of the state-dependent caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum generated-code entries.
    pub code_capacity: usize,

    /// Maximum validation-report entries.
    pub validation_capacity: usize,

    /// Which entry a full cache evicts.
    pub eviction: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            code_capacity: 50,
            validation_capacity: 100,
            eviction: EvictionPolicy::Fifo,
        }
    }
}

impl CacheConfig {
    /// Defaults overlaid with the `WEFT_*` environment variables.
    pub fn from_env() -> Result<Self, BuildError> {
        Self::default().overlay_env()
    }

    /// Overlays the `WEFT_*` environment variables onto `self`.
    pub fn overlay_env(self) -> Result<Self, BuildError> {
        self.overlay(|name| std::env::var(name).ok())
    }

    /// Parses a JSON config file body. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        serde_json::from_str(text).map_err(|e| BuildError::Config(e.to_string()))
    }

    fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BuildError> {
        if let Some(raw) = lookup(CODE_CAPACITY_VAR) {
            self.code_capacity = parse_capacity(CODE_CAPACITY_VAR, &raw)?;
        }
        if let Some(raw) = lookup(VALIDATION_CAPACITY_VAR) {
            self.validation_capacity = parse_capacity(VALIDATION_CAPACITY_VAR, &raw)?;
        }
        if let Some(raw) = lookup(EVICTION_VAR) {
            self.eviction = raw
                .trim()
                .parse()
                .map_err(|e| BuildError::Config(format!("{}: {}", EVICTION_VAR, e)))?;
        }
        Ok(self)
    }
}

fn parse_capacity(var: &str, raw: &str) -> Result<usize, BuildError> {
    raw.trim()
        .parse()
        .map_err(|_| BuildError::Config(format!("{} must be a non-negative integer, got '{}'", var, raw)))
}
