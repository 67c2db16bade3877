//! # Photo Triage
//!
//! A photo-corpus triage engine: score blurriness, group exact
//! duplicates, and find visually similar shots across a directory tree.
//!
//! ## Core Philosophy
//! - **Never delete anything** - triage reports findings, humans act on them
//! - **Pay for work once** - expensive per-file computations are cached
//!   next to the photos and validated by modification time
//! - **Interruptible** - scans checkpoint as they go and resume where
//!   they stopped
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation
//! layers:
//! - `core` - scanning, blur scoring, duplicate and similarity detection
//! - `config` - scan settings, validated once per scan
//! - `events` - event-driven progress reporting
//! - `error` - typed error taxonomy
//! - `cli` - command-line interface (binary only)

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use config::{BlurAlgorithm, ScanSettings, SimilarityMode};
pub use crate::core::orchestrator::{ScanOrchestrator, ScanOutcome, ScanStatus};
pub use error::{Result, TriageError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
