//! # Configuration Module
//!
//! One immutable, explicitly typed settings structure, validated once and
//! constructed per scan. A snapshot of it rides in every checkpoint and
//! result export so a resumed or reloaded scan knows exactly what produced
//! its data.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};

/// Selectable blur scoring algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlurAlgorithm {
    /// Frequency-domain score in [0, 1]; low score = energy concentrated in
    /// low frequencies = blurry
    Frequency,
    /// Variance of the Laplacian response, unbounded; low variance = blurry
    LocalVariance,
}

impl std::fmt::Display for BlurAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlurAlgorithm::Frequency => write!(f, "frequency"),
            BlurAlgorithm::LocalVariance => write!(f, "local-variance"),
        }
    }
}

/// Selectable similarity detection modes, trading cost for recall/precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMode {
    /// Perceptual hash only; fastest, score = Hamming distance
    HashOnly,
    /// Descriptor matching over every pair; most precise, O(n²) expensive
    DescriptorOnly,
    /// Hash prefilter, then descriptor confirmation; default balance
    Combined,
}

impl std::fmt::Display for SimilarityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityMode::HashOnly => write!(f, "hash-only"),
            SimilarityMode::DescriptorOnly => write!(f, "descriptor-only"),
            SimilarityMode::Combined => write!(f, "combined"),
        }
    }
}

/// All settings for one scan.
///
/// Construct with [`ScanSettings::default`] and adjust, then call
/// [`ScanSettings::validate`] before handing it to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Which blur scorer to run
    pub blur_algorithm: BlurAlgorithm,
    /// "Is blurry" cutoff, in the selected algorithm's own units.
    /// Frequency: [0, 1]. Local variance: non-negative, typically 50-500.
    pub blur_threshold: f64,
    /// Low-frequency disk radius as a fraction of min(width, height)
    /// for the frequency scorer
    pub radius_ratio: f64,
    /// Similarity detection mode
    pub similarity_mode: SimilarityMode,
    /// Maximum Hamming distance (0-64) for the perceptual-hash prefilter
    pub hash_threshold: u32,
    /// Maximum keypoints extracted per image for descriptor matching
    pub n_features: usize,
    /// Ratio-test acceptance bound in (0, 1]; a match is kept when
    /// best_distance < ratio * second_best_distance
    pub ratio_threshold: f32,
    /// Minimum good-match count for a pair to be reported similar
    pub min_good_matches: usize,
    /// Recurse into subdirectories of the scan root
    pub recursive: bool,
    /// Use the persistent per-directory cache
    pub cache_enabled: bool,
    /// Write a checkpoint every this many processed items
    pub checkpoint_interval: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            blur_algorithm: BlurAlgorithm::LocalVariance,
            blur_threshold: 100.0,
            radius_ratio: 0.05,
            similarity_mode: SimilarityMode::Combined,
            hash_threshold: 5,
            n_features: 1000,
            ratio_threshold: 0.75,
            min_good_matches: 30,
            recursive: true,
            cache_enabled: true,
            checkpoint_interval: 25,
        }
    }
}

impl ScanSettings {
    /// Check that every field is inside its documented range.
    ///
    /// The hash threshold is a raw Hamming-distance bound over the 64-bit
    /// perceptual signature; there is no secondary 0-100 scale.
    pub fn validate(&self) -> Result<(), TriageError> {
        match self.blur_algorithm {
            BlurAlgorithm::Frequency => {
                if !(0.0..=1.0).contains(&self.blur_threshold) {
                    return Err(TriageError::Config(format!(
                        "frequency blur threshold must be in [0, 1], got {}",
                        self.blur_threshold
                    )));
                }
            }
            BlurAlgorithm::LocalVariance => {
                if self.blur_threshold < 0.0 {
                    return Err(TriageError::Config(format!(
                        "local-variance blur threshold must be non-negative, got {}",
                        self.blur_threshold
                    )));
                }
            }
        }

        if !(self.radius_ratio > 0.0 && self.radius_ratio <= 0.5) {
            return Err(TriageError::Config(format!(
                "radius ratio must be in (0, 0.5], got {}",
                self.radius_ratio
            )));
        }

        if self.hash_threshold > 64 {
            return Err(TriageError::Config(format!(
                "hash threshold must be at most 64 (Hamming distance over a 64-bit hash), got {}",
                self.hash_threshold
            )));
        }

        if self.n_features < 8 {
            return Err(TriageError::Config(format!(
                "feature count must be at least 8, got {}",
                self.n_features
            )));
        }

        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return Err(TriageError::Config(format!(
                "ratio threshold must be in (0, 1], got {}",
                self.ratio_threshold
            )));
        }

        if self.min_good_matches == 0 {
            return Err(TriageError::Config(
                "minimum good-match count must be at least 1".to_string(),
            ));
        }

        if self.checkpoint_interval == 0 {
            return Err(TriageError::Config(
                "checkpoint interval must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(ScanSettings::default().validate().is_ok());
    }

    #[test]
    fn frequency_threshold_above_one_rejected() {
        let settings = ScanSettings {
            blur_algorithm: BlurAlgorithm::Frequency,
            blur_threshold: 1.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn local_variance_threshold_above_one_accepted() {
        let settings = ScanSettings {
            blur_algorithm: BlurAlgorithm::LocalVariance,
            blur_threshold: 250.0,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn hash_threshold_above_64_rejected() {
        let settings = ScanSettings {
            hash_threshold: 100,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_checkpoint_interval_rejected() {
        let settings = ScanSettings {
            checkpoint_interval: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = ScanSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let restored: ScanSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, restored);
    }

    #[test]
    fn enums_serialize_kebab_case() {
        let json = serde_json::to_string(&SimilarityMode::HashOnly).unwrap();
        assert_eq!(json, "\"hash-only\"");
        let json = serde_json::to_string(&BlurAlgorithm::LocalVariance).unwrap();
        assert_eq!(json, "\"local-variance\"");
    }
}
