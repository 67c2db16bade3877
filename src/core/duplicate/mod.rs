//! # Duplicate Module
//!
//! Exact-duplicate detection over file contents.
//!
//! Two pruning stages keep hashing cheap: files are first bucketed by
//! size (a file with a unique size cannot have a duplicate and is never
//! hashed), then surviving candidates are digested with blake3 in
//! streamed chunks. Files sharing a digest form a [`DuplicateGroup`].

use crate::core::report::DuplicateGroup;
use crate::core::scanner::ImageFile;
use crate::error::{FileAccessError, TriageError};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read size for streamed digesting
const DIGEST_CHUNK_BYTES: usize = 64 * 1024;

/// Drop every file whose size no other candidate shares.
///
/// Returned candidates keep the input's relative order.
pub fn prune_unique_sizes(files: &[ImageFile]) -> Vec<ImageFile> {
    let mut size_counts: HashMap<u64, usize> = HashMap::new();
    for file in files {
        *size_counts.entry(file.size).or_insert(0) += 1;
    }

    files
        .iter()
        .filter(|f| size_counts[&f.size] > 1)
        .cloned()
        .collect()
}

/// Hex blake3 digest of the full file contents, read in 64 KiB chunks
pub fn content_digest(path: &Path) -> Result<String, TriageError> {
    let mut file = File::open(path).map_err(|e| FileAccessError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; DIGEST_CHUNK_BYTES];
    loop {
        let read = file.read(&mut buffer).map_err(|e| FileAccessError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Group digested files into duplicate groups.
///
/// Only digests shared by at least two files are reported. Group members
/// are sorted lexicographically and groups are ordered by their first
/// member, so the output is deterministic regardless of map iteration
/// order.
pub fn group_by_digest(digests: &HashMap<PathBuf, String>) -> Vec<DuplicateGroup> {
    let mut by_digest: HashMap<&str, Vec<&PathBuf>> = HashMap::new();
    for (path, digest) in digests {
        by_digest.entry(digest.as_str()).or_default().push(path);
    }

    let mut groups: Vec<DuplicateGroup> = by_digest
        .into_iter()
        .filter(|(_, paths)| paths.len() >= 2)
        .map(|(digest, mut paths)| {
            paths.sort();
            DuplicateGroup {
                digest: digest.to_string(),
                paths: paths.into_iter().cloned().collect(),
            }
        })
        .collect();

    groups.sort_by(|a, b| a.paths[0].cmp(&b.paths[0]));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn image_file(path: PathBuf, size: u64) -> ImageFile {
        ImageFile {
            path,
            size,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn unique_sizes_are_pruned() {
        let files = vec![
            image_file(PathBuf::from("/a.jpg"), 100),
            image_file(PathBuf::from("/b.jpg"), 100),
            image_file(PathBuf::from("/c.jpg"), 250),
        ];

        let survivors = prune_unique_sizes(&files);
        let paths: Vec<_> = survivors.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/a.jpg"), PathBuf::from("/b.jpg")]);
    }

    #[test]
    fn identical_contents_share_a_digest() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        let b = temp_dir.path().join("b.jpg");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();

        assert_eq!(content_digest(&a).unwrap(), content_digest(&b).unwrap());
    }

    #[test]
    fn different_contents_of_equal_size_differ() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        let b = temp_dir.path().join("b.jpg");
        fs::write(&a, b"same length A").unwrap();
        fs::write(&b, b"same length B").unwrap();

        assert_ne!(content_digest(&a).unwrap(), content_digest(&b).unwrap());
    }

    #[test]
    fn digest_streams_past_one_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let big = temp_dir.path().join("big.bin");
        fs::write(&big, vec![0xABu8; DIGEST_CHUNK_BYTES * 2 + 17]).unwrap();

        let streamed = content_digest(&big).unwrap();
        let whole = blake3::hash(&fs::read(&big).unwrap()).to_hex().to_string();
        assert_eq!(streamed, whole);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(content_digest(Path::new("/nonexistent/photo.jpg")).is_err());
    }

    #[test]
    fn grouping_drops_singletons_and_sorts_members() {
        let mut digests = HashMap::new();
        digests.insert(PathBuf::from("/z.jpg"), "d1".to_string());
        digests.insert(PathBuf::from("/a.jpg"), "d1".to_string());
        digests.insert(PathBuf::from("/m.jpg"), "d2".to_string());

        let groups = group_by_digest(&digests);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].digest, "d1");
        assert_eq!(
            groups[0].paths,
            vec![PathBuf::from("/a.jpg"), PathBuf::from("/z.jpg")]
        );
    }

    #[test]
    fn groups_are_ordered_by_first_member() {
        let mut digests = HashMap::new();
        digests.insert(PathBuf::from("/q1.jpg"), "dq".to_string());
        digests.insert(PathBuf::from("/q2.jpg"), "dq".to_string());
        digests.insert(PathBuf::from("/b1.jpg"), "db".to_string());
        digests.insert(PathBuf::from("/b2.jpg"), "db".to_string());

        let groups = group_by_digest(&digests);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].digest, "db");
        assert_eq!(groups[1].digest, "dq");
    }
}
