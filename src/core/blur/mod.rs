//! # Blur Module
//!
//! Scores how blurry an image is. Two interchangeable algorithms share one
//! contract: `score_file(path) -> score`, where the score's range and the
//! meaning of "blurry" depend on the algorithm.
//!
//! - [`BlurAlgorithm::Frequency`]: fraction of spectral energy outside a
//!   low-frequency disk, clamped to [0, 1]. Near 0 means the energy sits in
//!   low frequencies, i.e. the image is blurry.
//! - [`BlurAlgorithm::LocalVariance`]: variance of the Laplacian response,
//!   unbounded and non-negative. Low variance means few defined edges.
//!
//! Thresholds live in the selected algorithm's own units and are not
//! interchangeable between algorithms.

mod frequency;
mod variance;

pub use frequency::frequency_score;
pub use variance::laplacian_variance;

use crate::config::{BlurAlgorithm, ScanSettings};
use crate::error::TriageError;
use std::path::Path;

/// Scores blurriness with the configured algorithm
pub struct BlurScorer {
    algorithm: BlurAlgorithm,
    threshold: f64,
    radius_ratio: f64,
}

impl BlurScorer {
    /// Build a scorer from validated settings
    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self {
            algorithm: settings.blur_algorithm,
            threshold: settings.blur_threshold,
            radius_ratio: settings.radius_ratio,
        }
    }

    /// Score one image file
    pub fn score_file(&self, path: &Path) -> Result<f64, TriageError> {
        match self.algorithm {
            BlurAlgorithm::Frequency => frequency_score(path, self.radius_ratio),
            BlurAlgorithm::LocalVariance => laplacian_variance(path),
        }
    }

    /// Apply the configured threshold to a score
    pub fn is_blurry(&self, score: f64) -> bool {
        score < self.threshold
    }

    /// The algorithm this scorer runs
    pub fn algorithm(&self) -> BlurAlgorithm {
        self.algorithm
    }

    /// The configured threshold, in the algorithm's own units
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use tempfile::TempDir;

    #[test]
    fn scorer_applies_threshold_below() {
        let settings = ScanSettings {
            blur_algorithm: BlurAlgorithm::LocalVariance,
            blur_threshold: 100.0,
            ..Default::default()
        };
        let scorer = BlurScorer::from_settings(&settings);

        assert!(scorer.is_blurry(40.0));
        assert!(!scorer.is_blurry(250.0));
        assert!(!scorer.is_blurry(100.0));
    }

    #[test]
    fn scorer_dispatches_to_configured_algorithm() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("checker.png");
        let img = ImageBuffer::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });
        img.save(&path).unwrap();

        let frequency = BlurScorer::from_settings(&ScanSettings {
            blur_algorithm: BlurAlgorithm::Frequency,
            blur_threshold: 0.3,
            ..Default::default()
        });
        let variance = BlurScorer::from_settings(&ScanSettings {
            blur_algorithm: BlurAlgorithm::LocalVariance,
            blur_threshold: 100.0,
            ..Default::default()
        });

        // A checkerboard is as sharp as an image gets under both metrics.
        let f = frequency.score_file(&path).unwrap();
        let v = variance.score_file(&path).unwrap();
        assert!(f > 0.5, "frequency score should be high, got {}", f);
        assert!(v > 1000.0, "variance score should be high, got {}", v);
    }
}
