//! # Error Module
//!
//! Error types for the photo triage engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-item failures stay per-item** - they are collected into the scan's
//!   error list and never abort the whole scan

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("File access error: {0}")]
    FileAccess(#[from] FileAccessError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Compute error: {0}")]
    Compute(#[from] ComputeError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors accessing files or directories on disk
#[derive(Error, Debug)]
pub enum FileAccessError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors decoding image data
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode image {path}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },

    #[error("Image is empty: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors where a transform's preconditions are not met
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Image {path} is too small ({width}x{height}, minimum {min}x{min})")]
    ImageTooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        min: u32,
    },
}

/// Errors from resource exhaustion during a transform
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Out of memory computing {operation} for {path}")]
    OutOfMemory { operation: String, path: PathBuf },
}

/// Errors with persisted state (checkpoint or cache files)
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to write state file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    SerializationFailed(String),

    #[error("State file {path} is not usable: {reason}")]
    InvalidState { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_access_error_includes_path() {
        let error = FileAccessError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/vacation"));
    }

    #[test]
    fn decode_error_includes_reason() {
        let error = DecodeError::InvalidImage {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn compute_error_reports_dimensions() {
        let error = ComputeError::ImageTooSmall {
            path: PathBuf::from("/photos/tiny.png"),
            width: 2,
            height: 2,
            min: 4,
        };
        let message = error.to_string();
        assert!(message.contains("2x2"));
        assert!(message.contains("minimum 4x4"));
    }

    #[test]
    fn errors_convert_to_top_level() {
        let error: TriageError = StateError::SerializationFailed("bad json".to_string()).into();
        assert!(error.to_string().contains("bad json"));
    }
}
