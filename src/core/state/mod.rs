//! # State Module
//!
//! Resumable scan checkpoints.
//!
//! The orchestrator snapshots its progress into a [`ScanState`] and this
//! module persists it under `.photo-triage/scan_state.json` in the scanned
//! root. On the next run the checkpoint is honored only when the
//! directory, format version and settings snapshot all match; anything
//! else means "no usable checkpoint" and a fresh scan, never a failure.
//!
//! In memory the state uses hash sets and maps for O(1) membership tests.
//! On disk every set becomes a sorted `Vec` and every map a `BTreeMap`, so
//! writing the same state twice produces byte-identical files.

use crate::config::ScanSettings;
use crate::core::cache::CACHE_DIR_NAME;
use crate::core::report::ScanResults;
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Version written into checkpoint files
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Checkpoint file name inside the cache directory
pub const STATE_FILE_NAME: &str = "scan_state.json";

/// Everything needed to resume an interrupted scan
#[derive(Debug, Clone)]
pub struct ScanState {
    /// The scanned root, canonical identity of this checkpoint
    pub directory: PathBuf,
    /// Settings the interrupted scan ran with
    pub settings: ScanSettings,
    /// Full candidate list as enumerated at scan start
    pub candidates: Vec<PathBuf>,
    /// Files whose blur scoring finished (successfully or not)
    pub blur_done: HashSet<PathBuf>,
    /// Files whose content digesting finished
    pub digest_done: HashSet<PathBuf>,
    /// Files whose perceptual hashing finished
    pub phash_done: HashSet<PathBuf>,
    /// Pairs whose final similarity stage finished, in canonical order
    pub compared_pairs: HashSet<(PathBuf, PathBuf)>,
    /// Digests computed so far; carried here so resume works with the
    /// cache disabled
    pub digests: HashMap<PathBuf, String>,
    /// Encoded perceptual hashes computed so far
    pub phashes: HashMap<PathBuf, String>,
    /// Partial findings accumulated before the interruption
    pub results: ScanResults,
}

impl ScanState {
    pub fn new(directory: PathBuf, settings: ScanSettings, candidates: Vec<PathBuf>) -> Self {
        Self {
            directory,
            settings,
            candidates,
            blur_done: HashSet::new(),
            digest_done: HashSet::new(),
            phash_done: HashSet::new(),
            compared_pairs: HashSet::new(),
            digests: HashMap::new(),
            phashes: HashMap::new(),
            results: ScanResults::default(),
        }
    }

    /// Canonical (sorted) form of an unordered pair
    pub fn pair_key(a: &Path, b: &Path) -> (PathBuf, PathBuf) {
        if a <= b {
            (a.to_path_buf(), b.to_path_buf())
        } else {
            (b.to_path_buf(), a.to_path_buf())
        }
    }

    pub fn mark_pair_compared(&mut self, a: &Path, b: &Path) {
        self.compared_pairs.insert(Self::pair_key(a, b));
    }

    pub fn is_pair_compared(&self, a: &Path, b: &Path) -> bool {
        self.compared_pairs.contains(&Self::pair_key(a, b))
    }

    /// Items finished across all per-file phases, for resume reporting
    pub fn processed_count(&self) -> usize {
        self.blur_done.len() + self.digest_done.len() + self.phash_done.len()
    }
}

/// On-disk checkpoint representation with deterministic ordering
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    format_version: u32,
    directory: PathBuf,
    settings: ScanSettings,
    candidates: Vec<PathBuf>,
    blur_done: Vec<PathBuf>,
    digest_done: Vec<PathBuf>,
    phash_done: Vec<PathBuf>,
    compared_pairs: Vec<(PathBuf, PathBuf)>,
    digests: BTreeMap<PathBuf, String>,
    phashes: BTreeMap<PathBuf, String>,
    results: ScanResults,
}

impl CheckpointFile {
    fn from_state(state: &ScanState) -> Self {
        let sorted_set = |set: &HashSet<PathBuf>| -> Vec<PathBuf> {
            let mut v: Vec<PathBuf> = set.iter().cloned().collect();
            v.sort();
            v
        };
        let blur_done = sorted_set(&state.blur_done);
        let digest_done = sorted_set(&state.digest_done);
        let phash_done = sorted_set(&state.phash_done);

        let mut compared_pairs: Vec<(PathBuf, PathBuf)> =
            state.compared_pairs.iter().cloned().collect();
        compared_pairs.sort();

        Self {
            format_version: STATE_FORMAT_VERSION,
            directory: state.directory.clone(),
            settings: state.settings.clone(),
            candidates: state.candidates.clone(),
            blur_done,
            digest_done,
            phash_done,
            compared_pairs,
            digests: state.digests.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            phashes: state.phashes.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            results: state.results.clone(),
        }
    }

    fn into_state(self) -> ScanState {
        ScanState {
            directory: self.directory,
            settings: self.settings,
            candidates: self.candidates,
            blur_done: self.blur_done.into_iter().collect(),
            digest_done: self.digest_done.into_iter().collect(),
            phash_done: self.phash_done.into_iter().collect(),
            compared_pairs: self.compared_pairs.into_iter().collect(),
            digests: self.digests.into_iter().collect(),
            phashes: self.phashes.into_iter().collect(),
            results: self.results,
        }
    }
}

fn state_path(directory: &Path) -> PathBuf {
    directory.join(CACHE_DIR_NAME).join(STATE_FILE_NAME)
}

/// Persist a checkpoint for the given scan root
pub fn save(state: &ScanState) -> Result<(), StateError> {
    let cache_dir = state.directory.join(CACHE_DIR_NAME);
    let path = cache_dir.join(STATE_FILE_NAME);
    fs::create_dir_all(&cache_dir).map_err(|e| StateError::WriteFailed {
        path: cache_dir.clone(),
        source: e,
    })?;

    let file = CheckpointFile::from_state(state);
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| StateError::SerializationFailed(e.to_string()))?;
    fs::write(&path, json).map_err(|e| StateError::WriteFailed { path, source: e })
}

/// Load a checkpoint for the given root, if a usable one exists.
///
/// "Usable" means: the file parses, carries the current format version,
/// records the same directory, and its settings snapshot equals
/// `settings`. Every other outcome logs a warning and returns `None`.
pub fn load(directory: &Path, settings: &ScanSettings) -> Option<ScanState> {
    let path = state_path(directory);
    let contents = fs::read_to_string(&path).ok()?;

    let file: CheckpointFile = match serde_json::from_str(&contents) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "checkpoint unreadable, starting fresh");
            return None;
        }
    };

    if file.format_version != STATE_FORMAT_VERSION {
        warn!(
            found = file.format_version,
            expected = STATE_FORMAT_VERSION,
            "checkpoint format version mismatch, starting fresh"
        );
        return None;
    }
    if file.directory != directory {
        warn!(
            recorded = %file.directory.display(),
            requested = %directory.display(),
            "checkpoint belongs to a different directory, starting fresh"
        );
        return None;
    }
    if &file.settings != settings {
        warn!("checkpoint settings differ from the requested scan, starting fresh");
        return None;
    }

    Some(file.into_state())
}

/// Remove the checkpoint for a scan root; missing files are fine
pub fn delete(directory: &Path) -> Result<(), StateError> {
    let path = state_path(directory);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StateError::WriteFailed { path, source: e }),
    }
}
