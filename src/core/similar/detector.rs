//! Pairwise similarity evaluation across detection modes.

use super::{descriptor, descriptor::DescriptorSet, phash};
use crate::config::{ScanSettings, SimilarityMode};
use crate::error::TriageError;
use image_hasher::ImageHash;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Evaluates unordered pairs of images for visual similarity.
///
/// Stage A compares perceptual hashes; stage B extracts and matches
/// binary descriptors. Which stages run depends on the configured mode.
/// Descriptor sets are memoized per image for the lifetime of the
/// detector, so an image appearing in many pairs is decoded once.
pub struct SimilarityDetector {
    mode: SimilarityMode,
    hash_threshold: u32,
    n_features: usize,
    ratio_threshold: f32,
    min_good_matches: usize,
    descriptors: HashMap<PathBuf, Option<DescriptorSet>>,
}

impl SimilarityDetector {
    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self {
            mode: settings.similarity_mode,
            hash_threshold: settings.hash_threshold,
            n_features: settings.n_features,
            ratio_threshold: settings.ratio_threshold,
            min_good_matches: settings.min_good_matches,
            descriptors: HashMap::new(),
        }
    }

    pub fn mode(&self) -> SimilarityMode {
        self.mode
    }

    /// Decide whether two images are similar.
    ///
    /// Returns `Ok(Some(score))` when the pair qualifies: the Hamming
    /// distance in hash-only mode, the good-match count otherwise. A pair
    /// with a missing hash is skipped rather than failed, since the
    /// failure was already recorded when hashing that file. Descriptor
    /// extraction failures surface as an error on the first pair touching
    /// the broken file and are remembered as empty afterwards.
    pub fn evaluate_pair(
        &mut self,
        a: &Path,
        b: &Path,
        hash_a: Option<&ImageHash>,
        hash_b: Option<&ImageHash>,
    ) -> Result<Option<u32>, TriageError> {
        match self.mode {
            SimilarityMode::HashOnly => {
                let (ha, hb) = match (hash_a, hash_b) {
                    (Some(ha), Some(hb)) => (ha, hb),
                    _ => return Ok(None),
                };
                let dist = phash::distance(ha, hb);
                Ok((dist <= self.hash_threshold).then_some(dist))
            }
            SimilarityMode::DescriptorOnly => self.confirm_with_descriptors(a, b),
            SimilarityMode::Combined => {
                let (ha, hb) = match (hash_a, hash_b) {
                    (Some(ha), Some(hb)) => (ha, hb),
                    _ => return Ok(None),
                };
                if phash::distance(ha, hb) > self.hash_threshold {
                    return Ok(None);
                }
                self.confirm_with_descriptors(a, b)
            }
        }
    }

    fn confirm_with_descriptors(&mut self, a: &Path, b: &Path) -> Result<Option<u32>, TriageError> {
        self.ensure_descriptors(a)?;
        self.ensure_descriptors(b)?;
        let set_a = self.descriptors.get(a).and_then(|o| o.as_ref());
        let set_b = self.descriptors.get(b).and_then(|o| o.as_ref());
        let (set_a, set_b) = match (set_a, set_b) {
            (Some(sa), Some(sb)) => (sa, sb),
            _ => return Ok(None),
        };

        let good = descriptor::match_count(set_a, set_b, self.ratio_threshold);
        if good >= self.min_good_matches {
            Ok(Some(good as u32))
        } else {
            Ok(None)
        }
    }

    fn ensure_descriptors(&mut self, path: &Path) -> Result<(), TriageError> {
        if self.descriptors.contains_key(path) {
            return Ok(());
        }
        match descriptor::extract(path, self.n_features) {
            Ok(set) => {
                self.descriptors.insert(path.to_path_buf(), Some(set));
                Ok(())
            }
            Err(e) => {
                self.descriptors.insert(path.to_path_buf(), None);
                Err(e)
            }
        }
    }
}

/// Every unordered pair over a sorted candidate list, in deterministic order
pub fn candidate_pairs(paths: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    let mut pairs = Vec::with_capacity(paths.len().saturating_sub(1) * paths.len() / 2);
    for i in 0..paths.len() {
        for j in i + 1..paths.len() {
            pairs.push((paths[i].clone(), paths[j].clone()));
        }
    }
    pairs
}
