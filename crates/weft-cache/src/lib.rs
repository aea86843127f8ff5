//! Content hashing, artifact caching, and change tracking for weft
//! workspaces.
//!
//! # Architecture
//!
//! - [`hash`] fingerprints a [`ProgramGraph`](weft_core::ProgramGraph) by
//!   canonicalizing every node into a sorted record list and reducing it
//!   with blake3.
//! - [`cache`] is the bounded key/value store artifacts are kept in, keyed
//!   by those fingerprints (or by plain strings for static lookups).
//! - [`dirty`] observes graph events, tracks the saved baseline, and
//!   compares per-root hashes between builds.
//!
//! # Modules
//!
//! - [`types`]: [`ContentHash`] and [`ArtifactKey`]
//! - [`hash`]: state hasher
//! - [`cache`]: [`ArtifactCache`], [`CacheStats`], [`EvictionPolicy`]
//! - [`dirty`]: [`ChangeTracker`] and per-root change sets

pub mod cache;
pub mod dirty;
pub mod hash;
pub mod types;

// Re-export key types for ergonomic use.
pub use cache::{ArtifactCache, CacheStats, EvictionPolicy};
pub use dirty::{compute_root_changes, ChangeTracker, RootChanges};
pub use hash::{canonical_snapshot, hash_graph, hash_roots, hash_subtree};
pub use types::{ArtifactKey, ContentHash};
