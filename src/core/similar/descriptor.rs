//! Binary keypoint descriptors for stage-B similarity confirmation.
//!
//! Segment-test corner detection (a 16-pixel Bresenham circle of radius 3,
//! requiring 9 contiguous pixels all brighter or all darker than the
//! center) followed by 256-bit binary intensity-comparison descriptors
//! sampled from a fixed pattern over a smoothed 31x31 patch. Everything is
//! computed on a grayscale rendition capped at 640 px on the long edge, so
//! cost is bounded regardless of source resolution.

use crate::core::decode::ImageDecoder;
use crate::error::TriageError;
use image::imageops::{self, FilterType};
use image::GrayImage;
use std::path::Path;

/// Long-edge cap for the working image
const MAX_LONG_EDGE: u32 = 640;

/// Brightness delta for the segment test
const CORNER_THRESHOLD: i16 = 20;

/// Contiguous circle pixels required for a corner
const CORNER_ARC: usize = 9;

/// Keypoints must keep this margin so the descriptor patch fits
const PATCH_MARGIN: u32 = 16;

/// Descriptor width in bytes (256 bits)
const DESCRIPTOR_BYTES: usize = 32;

/// Bresenham circle of radius 3 around a candidate center
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// The descriptors extracted from one image
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    descriptors: Vec<[u8; DESCRIPTOR_BYTES]>,
}

impl DescriptorSet {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Extract up to `n_features` descriptors from an image file.
///
/// Images too small or too flat to produce keypoints yield an empty set,
/// not an error; matching against an empty set simply finds nothing.
pub fn extract(path: &Path, n_features: usize) -> Result<DescriptorSet, TriageError> {
    let gray = ImageDecoder::decode_gray(path)?;
    Ok(extract_from_gray(&gray, n_features))
}

fn extract_from_gray(gray: &GrayImage, n_features: usize) -> DescriptorSet {
    let working = cap_long_edge(gray);
    let (width, height) = working.dimensions();
    if width <= 2 * PATCH_MARGIN || height <= 2 * PATCH_MARGIN {
        return DescriptorSet::default();
    }

    let mut corners = detect_corners(&working);
    corners.sort_by(|a, b| b.score.cmp(&a.score));
    corners.truncate(n_features);

    let smoothed = imageops::blur(&working, 2.0);
    let pattern = sampling_pattern();

    let descriptors = corners
        .iter()
        .map(|c| describe(&smoothed, c.x, c.y, &pattern))
        .collect();

    DescriptorSet { descriptors }
}

/// Count ratio-test matches from `a` into `b`.
///
/// For each descriptor in `a` the two nearest neighbors in `b` are found
/// by Hamming distance; the match is kept when the best distance is below
/// `ratio` times the second best. Either side having fewer than two
/// descriptors yields zero matches.
pub fn match_count(a: &DescriptorSet, b: &DescriptorSet, ratio: f32) -> usize {
    if a.len() < 2 || b.len() < 2 {
        return 0;
    }

    let mut good = 0;
    for query in &a.descriptors {
        let mut best = u32::MAX;
        let mut second = u32::MAX;
        for candidate in &b.descriptors {
            let d = hamming(query, candidate);
            if d < best {
                second = best;
                best = d;
            } else if d < second {
                second = d;
            }
        }
        if (best as f32) < ratio * (second as f32) {
            good += 1;
        }
    }
    good
}

fn hamming(a: &[u8; DESCRIPTOR_BYTES], b: &[u8; DESCRIPTOR_BYTES]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

fn cap_long_edge(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let long_edge = width.max(height);
    if long_edge <= MAX_LONG_EDGE {
        return gray.clone();
    }
    let scale = MAX_LONG_EDGE as f64 / long_edge as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    imageops::resize(gray, new_width, new_height, FilterType::Triangle)
}

struct Corner {
    x: u32,
    y: u32,
    score: u32,
}

fn detect_corners(gray: &GrayImage) -> Vec<Corner> {
    let (width, height) = gray.dimensions();
    let mut scores = vec![0u32; (width * height) as usize];

    for y in PATCH_MARGIN..height - PATCH_MARGIN {
        for x in PATCH_MARGIN..width - PATCH_MARGIN {
            if let Some(score) = segment_test(gray, x, y) {
                scores[(y * width + x) as usize] = score;
            }
        }
    }

    // 3x3 non-maximum suppression so clustered responses collapse to one
    // keypoint each.
    let mut corners = Vec::new();
    for y in PATCH_MARGIN..height - PATCH_MARGIN {
        for x in PATCH_MARGIN..width - PATCH_MARGIN {
            let score = scores[(y * width + x) as usize];
            if score == 0 {
                continue;
            }
            let mut is_max = true;
            'neighbors: for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = (x as i32 + dx) as u32;
                    let ny = (y as i32 + dy) as u32;
                    if scores[(ny * width + nx) as usize] > score {
                        is_max = false;
                        break 'neighbors;
                    }
                }
            }
            if is_max {
                corners.push(Corner { x, y, score });
            }
        }
    }
    corners
}

/// Segment test at one pixel; returns the corner score if it passes
fn segment_test(gray: &GrayImage, x: u32, y: u32) -> Option<u32> {
    let center = gray.get_pixel(x, y)[0] as i16;
    let bright_bound = center + CORNER_THRESHOLD;
    let dark_bound = center - CORNER_THRESHOLD;

    let mut states = [0i8; 16];
    let mut score = 0u32;
    for (i, (dx, dy)) in CIRCLE.iter().enumerate() {
        let value = gray.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i16;
        if value > bright_bound {
            states[i] = 1;
            score += (value - center) as u32;
        } else if value < dark_bound {
            states[i] = -1;
            score += (center - value) as u32;
        }
    }

    // Look for CORNER_ARC contiguous same-sign pixels, wrapping around.
    for target in [1i8, -1i8] {
        let mut run = 0usize;
        for i in 0..CIRCLE.len() * 2 {
            if states[i % CIRCLE.len()] == target {
                run += 1;
                if run >= CORNER_ARC {
                    return Some(score);
                }
            } else {
                run = 0;
            }
        }
    }
    None
}

/// Fixed pseudo-random point pairs inside the 31x31 patch
fn sampling_pattern() -> Vec<(i32, i32, i32, i32)> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next_offset = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) % 31) as i32 - 15
    };

    (0..DESCRIPTOR_BYTES * 8)
        .map(|_| (next_offset(), next_offset(), next_offset(), next_offset()))
        .collect()
}

fn describe(
    smoothed: &GrayImage,
    x: u32,
    y: u32,
    pattern: &[(i32, i32, i32, i32)],
) -> [u8; DESCRIPTOR_BYTES] {
    let mut descriptor = [0u8; DESCRIPTOR_BYTES];
    for (bit, (dx1, dy1, dx2, dy2)) in pattern.iter().enumerate() {
        let p1 = smoothed.get_pixel((x as i32 + dx1) as u32, (y as i32 + dy1) as u32)[0];
        let p2 = smoothed.get_pixel((x as i32 + dx2) as u32, (y as i32 + dy2) as u32)[0];
        if p1 < p2 {
            descriptor[bit / 8] |= 1 << (bit % 8);
        }
    }
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use tempfile::TempDir;

    fn noise_image(size: u32, seed: u64) -> GrayImage {
        let mut state = seed;
        ImageBuffer::from_fn(size, size, |_, _| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            Luma([(state >> 56) as u8])
        })
    }

    fn save_png(dir: &TempDir, name: &str, img: &GrayImage) -> std::path::PathBuf {
        let path = dir.path().join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn flat_image_yields_no_descriptors() {
        let flat = ImageBuffer::from_fn(128, 128, |_, _| Luma([128u8]));
        let set = extract_from_gray(&flat, 500);
        assert!(set.is_empty());
    }

    #[test]
    fn textured_image_yields_descriptors() {
        let noisy = noise_image(128, 7);
        let set = extract_from_gray(&noisy, 500);
        assert!(set.len() >= 2, "got {} descriptors", set.len());
        assert!(set.len() <= 500);
    }

    #[test]
    fn feature_cap_is_honored() {
        let noisy = noise_image(128, 7);
        let set = extract_from_gray(&noisy, 10);
        assert!(set.len() <= 10);
    }

    #[test]
    fn tiny_image_yields_empty_set_not_error() {
        let temp_dir = TempDir::new().unwrap();
        let tiny = ImageBuffer::from_fn(8, 8, |_, _| Luma([128u8]));
        let path = save_png(&temp_dir, "tiny.png", &tiny);

        let set = extract(&path, 500).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn image_matches_itself() {
        let noisy = noise_image(128, 7);
        let set = extract_from_gray(&noisy, 200);
        assert!(set.len() >= 2);

        let matches = match_count(&set, &set, 0.75);
        assert!(matches >= 1, "self-match produced {} matches", matches);
        assert!(matches <= set.len());
    }

    #[test]
    fn fewer_than_two_descriptors_yields_zero_matches() {
        let noisy = noise_image(128, 7);
        let populated = extract_from_gray(&noisy, 200);
        let empty = DescriptorSet::default();

        assert_eq!(match_count(&populated, &empty, 0.75), 0);
        assert_eq!(match_count(&empty, &populated, 0.75), 0);
    }

    #[test]
    fn large_image_is_downscaled_before_detection() {
        let big = noise_image(1400, 11);
        let capped = cap_long_edge(&big);
        assert_eq!(capped.width().max(capped.height()), MAX_LONG_EDGE);
    }
}
