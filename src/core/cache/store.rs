//! JSON-backed cache store with mtime validation.

use super::{CacheEntry, CacheKind};
use crate::error::StateError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Name of the hidden cache directory created inside the scan root
pub const CACHE_DIR_NAME: &str = ".photo-triage";

/// In-memory view of the per-directory caches.
///
/// Loads every kind eagerly on construction, serves lookups from memory,
/// and writes everything back in one [`CacheStore::save_all`] call. When
/// constructed disabled, every operation is a no-op and nothing touches
/// disk.
pub struct CacheStore {
    cache_dir: PathBuf,
    enabled: bool,
    entries: HashMap<CacheKind, BTreeMap<String, CacheEntry>>,
    dirty: bool,
}

impl CacheStore {
    /// Open (or lazily create) the caches for one scan root
    pub fn open(root: &Path, enabled: bool) -> Self {
        let cache_dir = root.join(CACHE_DIR_NAME);
        let mut entries = HashMap::new();

        for kind in CacheKind::all() {
            let loaded = if enabled {
                load_kind(&cache_dir, kind)
            } else {
                BTreeMap::new()
            };
            entries.insert(kind, loaded);
        }

        Self {
            cache_dir,
            enabled,
            entries,
            dirty: false,
        }
    }

    /// Look up a cached value, honoring it only if the file's current
    /// modification time matches the one recorded at computation. A
    /// mismatched entry is evicted, never silently reused.
    pub fn get(&mut self, kind: CacheKind, path: &Path, mtime: i64) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        let key = key_for(path);
        let map = self.entries.get_mut(&kind)?;
        let stale = matches!(map.get(&key), Some(entry) if entry.mtime != mtime);
        if stale {
            map.remove(&key);
            self.dirty = true;
            return None;
        }
        map.get(&key).map(|entry| entry.value.as_str())
    }

    /// Record a freshly computed value
    pub fn put(&mut self, kind: CacheKind, path: &Path, mtime: i64, value: String) {
        if !self.enabled {
            return;
        }
        self.entries
            .entry(kind)
            .or_default()
            .insert(key_for(path), CacheEntry { mtime, value });
        self.dirty = true;
    }

    /// Number of entries held for a kind
    pub fn len(&self, kind: CacheKind) -> usize {
        self.entries.get(&kind).map(|m| m.len()).unwrap_or(0)
    }

    /// Drop entries whose file no longer exists on disk.
    ///
    /// Deleted or renamed photos never reach [`CacheStore::get`] again, so
    /// without this sweep their entries would persist in the backing files
    /// forever.
    pub fn prune_missing(&mut self) {
        if !self.enabled {
            return;
        }
        for map in self.entries.values_mut() {
            let before = map.len();
            map.retain(|key, _| Path::new(key).exists());
            if map.len() != before {
                self.dirty = true;
            }
        }
    }

    /// Flush every kind to disk.
    ///
    /// Idempotent: calling it again without intervening [`CacheStore::put`]
    /// calls rewrites nothing. Partially written caches only cost future
    /// recomputation, so callers typically log a warning instead of
    /// propagating the error.
    pub fn save_all(&mut self) -> Result<(), StateError> {
        if !self.enabled || !self.dirty {
            return Ok(());
        }

        fs::create_dir_all(&self.cache_dir).map_err(|e| StateError::WriteFailed {
            path: self.cache_dir.clone(),
            source: e,
        })?;

        for kind in CacheKind::all() {
            let map = &self.entries[&kind];
            let path = self.cache_dir.join(kind.file_name());
            let json = serde_json::to_string_pretty(map)
                .map_err(|e| StateError::SerializationFailed(e.to_string()))?;
            fs::write(&path, json).map_err(|e| StateError::WriteFailed {
                path: path.clone(),
                source: e,
            })?;
            debug!(path = %path.display(), entries = map.len(), "cache saved");
        }

        self.dirty = false;
        Ok(())
    }

    /// Delete the cache directory for a scan root.
    ///
    /// Missing caches are not an error.
    pub fn clear_all(root: &Path) -> Result<(), StateError> {
        let cache_dir = root.join(CACHE_DIR_NAME);
        if !cache_dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&cache_dir).map_err(|e| StateError::WriteFailed {
            path: cache_dir,
            source: e,
        })
    }
}

/// Canonical cache key for a file path
fn key_for(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Modification time as whole seconds since the Unix epoch
pub fn mtime_seconds(modified: SystemTime) -> i64 {
    match modified.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

fn load_kind(cache_dir: &Path, kind: CacheKind) -> BTreeMap<String, CacheEntry> {
    let path = cache_dir.join(kind.file_name());
    let contents = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return BTreeMap::new(),
    };

    match serde_json::from_str(&contents) {
        Ok(map) => map,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "cache file unreadable, starting empty"
            );
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn get_returns_value_when_mtime_matches() {
        let temp_dir = TempDir::new().unwrap();
        let photo = temp_dir.path().join("a.jpg");

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::ContentHash, &photo, 1000, "digest".to_string());

        assert_eq!(store.get(CacheKind::ContentHash, &photo, 1000), Some("digest"));
    }

    #[test]
    fn get_rejects_stale_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let photo = temp_dir.path().join("a.jpg");

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::ContentHash, &photo, 1000, "digest".to_string());

        assert_eq!(store.get(CacheKind::ContentHash, &photo, 2000), None);
        // The stale entry was evicted, not kept around.
        assert_eq!(store.len(CacheKind::ContentHash), 0);
    }

    #[test]
    fn kinds_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let photo = temp_dir.path().join("a.jpg");

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::ContentHash, &photo, 1000, "digest".to_string());

        assert_eq!(store.get(CacheKind::PerceptualHash, &photo, 1000), None);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let photo = temp_dir.path().join("a.jpg");

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::PerceptualHash, &photo, 42, "c2lnbg==".to_string());
        store.save_all().unwrap();

        let mut reloaded = CacheStore::open(temp_dir.path(), true);
        assert_eq!(
            reloaded.get(CacheKind::PerceptualHash, &photo, 42),
            Some("c2lnbg==")
        );
    }

    #[test]
    fn corrupt_cache_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join(CACHE_DIR_NAME);
        fs::create_dir_all(&cache_dir).unwrap();
        let mut file =
            fs::File::create(cache_dir.join(CacheKind::ContentHash.file_name())).unwrap();
        file.write_all(b"{ not json").unwrap();
        drop(file);

        let store = CacheStore::open(temp_dir.path(), true);
        assert_eq!(store.len(CacheKind::ContentHash), 0);
    }

    #[test]
    fn disabled_store_never_writes() {
        let temp_dir = TempDir::new().unwrap();
        let photo = temp_dir.path().join("a.jpg");

        let mut store = CacheStore::open(temp_dir.path(), false);
        store.put(CacheKind::ContentHash, &photo, 1000, "digest".to_string());
        store.save_all().unwrap();

        assert_eq!(store.get(CacheKind::ContentHash, &photo, 1000), None);
        assert!(!temp_dir.path().join(CACHE_DIR_NAME).exists());
    }

    #[test]
    fn save_all_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let photo = temp_dir.path().join("a.jpg");

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::ContentHash, &photo, 1000, "digest".to_string());
        store.save_all().unwrap();
        store.save_all().unwrap();

        let reloaded = CacheStore::open(temp_dir.path(), true);
        assert_eq!(reloaded.len(CacheKind::ContentHash), 1);
    }

    #[test]
    fn prune_missing_drops_entries_for_deleted_files() {
        let temp_dir = TempDir::new().unwrap();
        let kept = temp_dir.path().join("kept.jpg");
        fs::write(&kept, b"data").unwrap();
        let gone = temp_dir.path().join("gone.jpg");

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::ContentHash, &kept, 1000, "d1".to_string());
        store.put(CacheKind::ContentHash, &gone, 1000, "d2".to_string());
        store.prune_missing();

        assert_eq!(store.len(CacheKind::ContentHash), 1);
        assert_eq!(store.get(CacheKind::ContentHash, &kept, 1000), Some("d1"));
    }

    #[test]
    fn prune_missing_marks_store_dirty_for_the_next_save() {
        let temp_dir = TempDir::new().unwrap();
        let kept = temp_dir.path().join("kept.jpg");
        fs::write(&kept, b"data").unwrap();
        let doomed = temp_dir.path().join("doomed.jpg");
        fs::write(&doomed, b"data").unwrap();

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::ContentHash, &kept, 1000, "d1".to_string());
        store.put(CacheKind::ContentHash, &doomed, 1000, "d2".to_string());
        store.save_all().unwrap();

        fs::remove_file(&doomed).unwrap();
        let mut reopened = CacheStore::open(temp_dir.path(), true);
        reopened.prune_missing();
        reopened.save_all().unwrap();

        let reloaded = CacheStore::open(temp_dir.path(), true);
        assert_eq!(reloaded.len(CacheKind::ContentHash), 1);
    }

    #[test]
    fn clear_all_removes_cache_directory() {
        let temp_dir = TempDir::new().unwrap();
        let photo = temp_dir.path().join("a.jpg");

        let mut store = CacheStore::open(temp_dir.path(), true);
        store.put(CacheKind::ContentHash, &photo, 1000, "digest".to_string());
        store.save_all().unwrap();
        assert!(temp_dir.path().join(CACHE_DIR_NAME).exists());

        CacheStore::clear_all(temp_dir.path()).unwrap();
        assert!(!temp_dir.path().join(CACHE_DIR_NAME).exists());

        // Clearing again is fine.
        CacheStore::clear_all(temp_dir.path()).unwrap();
    }

    #[test]
    fn mtime_seconds_of_epoch_is_zero() {
        assert_eq!(mtime_seconds(SystemTime::UNIX_EPOCH), 0);
    }
}
