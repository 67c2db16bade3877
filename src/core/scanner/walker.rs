//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageFile};
use crate::error::FileAccessError;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerates candidate image files under a root directory
pub struct FileEnumerator {
    filter: ImageFilter,
    recursive: bool,
}

impl FileEnumerator {
    /// Create an enumerator with the default image extensions
    pub fn new(recursive: bool) -> Self {
        Self {
            filter: ImageFilter::new(),
            recursive,
        }
    }

    /// Replace the extension filter
    pub fn with_filter(mut self, filter: ImageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// List candidate image paths under `root`.
    ///
    /// Fails with [`FileAccessError`] only when the root itself cannot be
    /// listed. Unreadable individual entries are skipped; symlinks are never
    /// followed. The result is deduplicated and lexicographically sorted, so
    /// repeated scans over an unchanged tree see identical candidate lists.
    pub fn enumerate(&self, root: &Path) -> Result<Vec<PathBuf>, FileAccessError> {
        if !root.exists() {
            return Err(FileAccessError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(FileAccessError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        // Probe readability up front so a permission problem on the root is
        // fatal rather than silently producing an empty candidate list.
        fs::read_dir(root).map_err(|e| access_error(root, e))?;

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut paths = BTreeSet::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || entry.path_is_symlink() {
                continue;
            }
            if !self.filter.matches(path) {
                continue;
            }
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                match fs::canonicalize(path) {
                    Ok(p) => p,
                    Err(_) => continue,
                }
            };
            paths.insert(absolute);
        }

        Ok(paths.into_iter().collect())
    }

    /// Stat one candidate into an [`ImageFile`] record
    pub fn stat(&self, path: &Path) -> Result<ImageFile, FileAccessError> {
        let metadata = fs::metadata(path).map_err(|e| FileAccessError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ImageFile {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        })
    }
}

fn access_error(path: &Path, source: io::Error) -> FileAccessError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        FileAccessError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        FileAccessError::ReadDirectory {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_photo(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    #[test]
    fn enumerate_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let enumerator = FileEnumerator::new(true);

        let paths = enumerator.enumerate(temp_dir.path()).unwrap();

        assert!(paths.is_empty());
    }

    #[test]
    fn enumerate_finds_images_sorted() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "b.jpg");
        create_test_photo(temp_dir.path(), "a.png");
        create_test_photo(temp_dir.path(), "c.webp");

        let enumerator = FileEnumerator::new(true);
        let paths = enumerator.enumerate(temp_dir.path()).unwrap();

        assert_eq!(paths.len(), 3);
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.webp"]);
    }

    #[test]
    fn enumerate_excludes_non_image_files() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "photo.jpg");
        File::create(temp_dir.path().join("notes.txt")).unwrap();

        let enumerator = FileEnumerator::new(true);
        let paths = enumerator.enumerate(temp_dir.path()).unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("photo.jpg"));
    }

    #[test]
    fn recursive_flag_controls_subdirectory_traversal() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "root.jpg");
        let subdir = temp_dir.path().join("nested");
        fs::create_dir(&subdir).unwrap();
        create_test_photo(&subdir, "deep.jpg");

        let recursive = FileEnumerator::new(true);
        assert_eq!(recursive.enumerate(temp_dir.path()).unwrap().len(), 2);

        let flat = FileEnumerator::new(false);
        assert_eq!(flat.enumerate(temp_dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn enumerate_nonexistent_root_is_fatal() {
        let enumerator = FileEnumerator::new(true);
        let result = enumerator.enumerate(Path::new("/nonexistent/path/12345"));

        assert!(matches!(
            result,
            Err(FileAccessError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn enumerate_file_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_photo(temp_dir.path(), "photo.jpg");

        let enumerator = FileEnumerator::new(true);
        let result = enumerator.enumerate(&file_path);

        assert!(matches!(result, Err(FileAccessError::NotADirectory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn enumerate_skips_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let target = create_test_photo(temp_dir.path(), "real.jpg");
        std::os::unix::fs::symlink(&target, temp_dir.path().join("link.jpg")).unwrap();

        let enumerator = FileEnumerator::new(true);
        let paths = enumerator.enumerate(temp_dir.path()).unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("real.jpg"));
    }

    #[test]
    fn stat_reports_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_photo(temp_dir.path(), "photo.jpg");

        let enumerator = FileEnumerator::new(true);
        let record = enumerator.stat(&path).unwrap();

        assert_eq!(record.size, 4);
    }
}
