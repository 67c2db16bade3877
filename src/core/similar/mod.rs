//! # Similar Module
//!
//! Perceptual similarity detection over images that survived exact
//! duplicate grouping.
//!
//! Detection runs in up to two stages. Stage A compares 64-bit
//! perceptual hashes by Hamming distance; it is cheap enough to run over
//! every unordered pair. Stage B extracts binary keypoint descriptors and
//! confirms candidates with ratio-test matching; it is expensive, so in
//! the default combined mode it only sees pairs stage A let through.

pub mod descriptor;
pub mod detector;
pub mod phash;

pub use descriptor::DescriptorSet;
pub use detector::{candidate_pairs, SimilarityDetector};
