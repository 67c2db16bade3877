//! # Scanner Module
//!
//! Discovers candidate image files under a scan root.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - WebP (.webp)
//! - HEIC (.heic, .heif) - iPhone photos
//! - GIF (.gif)
//! - BMP (.bmp)
//! - TIFF (.tiff, .tif)
//!
//! The enumerator returns a deduplicated, lexicographically sorted list of
//! absolute paths to regular files. Symlinks are never followed. Individual
//! unreadable entries are skipped silently; decode problems surface later,
//! when the file is actually opened.

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::FileEnumerator;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// Identity of one candidate image, derived on demand from the filesystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
    /// Absolute path to the image file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
}
