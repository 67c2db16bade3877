//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the scan worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scan lifecycle events
    Scan(ScanEvent),
}

/// Lifecycle events for a single scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// The scan has started preparing (enumerating candidates)
    Preparing { target: PathBuf },

    /// The scan resumed from a checkpoint with this many items already done
    Resumed { already_processed: usize },

    /// A new phase has begun
    PhaseStarted { phase: ScanPhase, total: usize },

    /// Progress within the current phase
    Progress(PhaseProgress),

    /// A non-fatal per-item error occurred; the scan continues
    ItemError { path: PathBuf, message: String },

    /// The scan finished normally
    Completed,

    /// The scan stopped after a cancellation request was honored
    Cancelled,

    /// The scan hit an unrecoverable error; partial results are still returned
    Failed { message: String },
}

/// Ordered phases of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanPhase {
    Blur,
    Duplicate,
    Fingerprint,
    Similarity,
}

impl ScanPhase {
    /// Human-readable label used in progress reporting
    pub fn label(&self) -> &'static str {
        match self {
            ScanPhase::Blur => "Scoring blur",
            ScanPhase::Duplicate => "Finding duplicates",
            ScanPhase::Fingerprint => "Computing signatures",
            ScanPhase::Similarity => "Finding similar images",
        }
    }
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Monotonically increasing progress within a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseProgress {
    /// The phase this progress belongs to
    pub phase: ScanPhase,
    /// Items processed so far in this phase
    pub current: usize,
    /// Total items this phase will process
    pub total: usize,
}
