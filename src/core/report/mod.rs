//! # Report Module
//!
//! Result records produced by a scan, the container that collects them,
//! and a versioned JSON export so a finished scan can be reviewed later
//! without rescanning.

use crate::config::{BlurAlgorithm, ScanSettings};
use crate::error::StateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Version written into exported result documents
pub const RESULTS_FORMAT_VERSION: u32 = 1;

/// One image flagged by the blur scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlurResult {
    pub path: PathBuf,
    /// Score in the algorithm's own units
    pub score: f64,
    pub algorithm: BlurAlgorithm,
    /// The cutoff the score was compared against
    pub threshold: f64,
    pub is_blurry: bool,
}

/// Byte-identical files sharing one content digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub digest: String,
    /// At least two members, lexicographically sorted
    pub paths: Vec<PathBuf>,
}

/// Two visually similar (but not byte-identical) images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarPair {
    /// The lexicographically smaller path of the pair
    pub first: PathBuf,
    pub second: PathBuf,
    /// Hamming distance in hash-only mode, good-match count otherwise
    pub score: u32,
}

impl SimilarPair {
    /// Build a pair in canonical (sorted) order
    pub fn new(a: PathBuf, b: PathBuf, score: u32) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first,
            second,
            score,
        }
    }
}

/// The scan operation a failure occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Enumerate,
    BlurScore,
    ContentHash,
    PerceptualHash,
    DescriptorMatch,
}

/// What a recorded failure was about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSubject {
    /// A single file
    Path(PathBuf),
    /// An unordered pair of files, stored sorted
    Pair(PathBuf, PathBuf),
}

/// A non-fatal failure collected during the scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub operation: Operation,
    pub subject: ErrorSubject,
    pub message: String,
}

impl ErrorRecord {
    pub fn for_path(operation: Operation, path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            operation,
            subject: ErrorSubject::Path(path),
            message: message.into(),
        }
    }

    pub fn for_pair(
        operation: Operation,
        a: PathBuf,
        b: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            operation,
            subject: ErrorSubject::Pair(first, second),
            message: message.into(),
        }
    }
}

/// Everything one scan produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResults {
    pub blurry: Vec<BlurResult>,
    pub duplicates: Vec<DuplicateGroup>,
    pub similar: Vec<SimilarPair>,
    pub errors: Vec<ErrorRecord>,
}

impl ScanResults {
    /// Total number of flagged items across the three finding buckets
    pub fn finding_count(&self) -> usize {
        self.blurry.len() + self.duplicates.len() + self.similar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finding_count() == 0 && self.errors.is_empty()
    }
}

/// Envelope written by [`save_results`] and read by [`load_results`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub scanned_directory: PathBuf,
    pub settings_used: ScanSettings,
    pub results: ScanResults,
}

/// Export results to a JSON file
pub fn save_results(
    path: &Path,
    scanned_directory: &Path,
    settings: &ScanSettings,
    results: &ScanResults,
) -> Result<(), StateError> {
    let document = ResultsDocument {
        format_version: RESULTS_FORMAT_VERSION,
        saved_at: Utc::now(),
        scanned_directory: scanned_directory.to_path_buf(),
        settings_used: settings.clone(),
        results: results.clone(),
    };

    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| StateError::SerializationFailed(e.to_string()))?;
    fs::write(path, json).map_err(|e| StateError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a previously exported document.
///
/// A newer format version loads with a warning; structural problems are
/// hard errors.
pub fn load_results(path: &Path) -> Result<ResultsDocument, StateError> {
    let contents = fs::read_to_string(path).map_err(|e| StateError::InvalidState {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let document: ResultsDocument =
        serde_json::from_str(&contents).map_err(|e| StateError::InvalidState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if document.format_version != RESULTS_FORMAT_VERSION {
        warn!(
            found = document.format_version,
            expected = RESULTS_FORMAT_VERSION,
            "results document has an unexpected format version"
        );
    }

    Ok(document)
}
