//! File filtering logic for the enumerator.

use std::collections::HashSet;
use std::path::Path;

/// Filters files to determine if they are supported images
pub struct ImageFilter {
    /// File extensions to include (lowercase)
    extensions: HashSet<String>,
}

impl ImageFilter {
    /// Create a new filter with default supported extensions
    pub fn new() -> Self {
        Self {
            extensions: [
                "jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif", "heic", "heif",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    /// Override the list of extensions to accept (matched case-insensitively)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().to_lowercase())
            .collect();
        self
    }

    /// Check if a file should be included based on its extension
    pub fn matches(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
