//! The artifact caches a workspace owns.
//!
//! Two caches depend on graph state and are bounded: generated code (keyed
//! by [`ArtifactKey`], so reference edits miss too) and validation reports
//! (keyed by [`ContentHash`]). Two are static lookup tables keyed by plain
//! strings: toolbox definitions per mode and node definitions per kind.
//! Those are unbounded and only dropped by [`ArtifactCaches::clear_all`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use weft_cache::{ArtifactCache, ArtifactKey, CacheStats, ContentHash};

use crate::diagnostics::ValidationReport;
use crate::generate::GeneratedFiles;
use crate::CacheConfig;

/// Per-cache counters, as reported by [`ArtifactCaches::stats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub code: CacheStats,
    pub validation: CacheStats,
    pub toolbox: CacheStats,
    pub definitions: CacheStats,
}

/// Code, validation, toolbox, and node-definition caches.
#[derive(Debug, Clone)]
pub struct ArtifactCaches {
    pub code: ArtifactCache<ArtifactKey, GeneratedFiles>,
    pub validation: ArtifactCache<ContentHash, ValidationReport>,
    pub toolbox: ArtifactCache<String, Value>,
    pub definitions: ArtifactCache<String, Value>,
}

impl ArtifactCaches {
    pub fn new(config: &CacheConfig) -> Self {
        ArtifactCaches {
            code: ArtifactCache::bounded("code", config.code_capacity, config.eviction),
            validation: ArtifactCache::bounded(
                "validation",
                config.validation_capacity,
                config.eviction,
            ),
            toolbox: ArtifactCache::unbounded("toolbox"),
            definitions: ArtifactCache::unbounded("definitions"),
        }
    }

    /// Drops the state-dependent caches. Static lookups are kept.
    pub fn invalidate_all(&mut self) {
        self.code.invalidate_all();
        self.validation.invalidate_all();
        debug!("code and validation caches invalidated");
    }

    /// Drops every cache, static lookups included.
    pub fn clear_all(&mut self) {
        self.invalidate_all();
        self.toolbox.invalidate_all();
        self.definitions.invalidate_all();
        debug!("toolbox and definition caches cleared");
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            code: self.code.stats(),
            validation: self.validation.stats(),
            toolbox: self.toolbox.stats(),
            definitions: self.definitions.stats(),
        }
    }
}

impl Default for ArtifactCaches {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
