//! Perceptual hashing via image_hasher.
//!
//! One global hasher configuration: DCT preprocessing with a mean filter
//! over an 8x8 grid, yielding a 64-bit signature. Hamming distance between
//! signatures is the stage-A similarity score.

use crate::core::decode::ImageDecoder;
use crate::error::TriageError;
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use std::path::Path;

/// Number of bits in the signature
pub const HASH_BITS: u32 = 64;

fn hasher() -> Hasher {
    HasherConfig::new()
        .hash_alg(HashAlg::Mean)
        .hash_size(8, 8)
        .preproc_dct()
        .to_hasher()
}

/// Compute the perceptual signature of an image file
pub fn hash_file(path: &Path) -> Result<ImageHash, TriageError> {
    let image = ImageDecoder::decode(path)?;
    Ok(hasher().hash_image(&image))
}

/// Hamming distance between two signatures, 0..=64
pub fn distance(a: &ImageHash, b: &ImageHash) -> u32 {
    a.dist(b)
}

/// Encode a signature for the cache and checkpoint files
pub fn encode(hash: &ImageHash) -> String {
    hash.to_base64()
}

/// Decode a signature previously produced by [`encode`].
///
/// Returns `None` on malformed input; callers fall back to recomputing.
pub fn decode(encoded: &str) -> Option<ImageHash> {
    ImageHash::from_base64(encoded).ok()
}
