//! # Cache Module
//!
//! Persistent per-directory caches for expensive per-file computations.
//!
//! Each scanned directory gets a hidden `.photo-triage/` subdirectory
//! holding one JSON file per cache kind. Entries are keyed by absolute
//! path and validated against the file's modification time, so an edited
//! or replaced photo is always recomputed. A corrupt or unreadable cache
//! file is treated as empty, never as a fatal error.

mod store;

pub use store::{mtime_seconds, CacheStore, CACHE_DIR_NAME};

use serde::{Deserialize, Serialize};

/// The kinds of per-file values the cache persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Exact content digest of the full file bytes
    ContentHash,
    /// Perceptual signature of the decoded image
    PerceptualHash,
}

impl CacheKind {
    /// File name of this kind's JSON store inside the cache directory
    pub fn file_name(&self) -> &'static str {
        match self {
            CacheKind::ContentHash => "content_hash_cache.json",
            CacheKind::PerceptualHash => "perceptual_hash_cache.json",
        }
    }

    pub fn all() -> [CacheKind; 2] {
        [CacheKind::ContentHash, CacheKind::PerceptualHash]
    }
}

/// One cached value together with the mtime it was computed at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Modification time of the source file, seconds since the Unix epoch
    pub mtime: i64,
    /// The cached value (hex digest or base64 signature)
    pub value: String,
}
