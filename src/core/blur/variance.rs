//! Local-variance blur score.
//!
//! Applies a discrete 3x3 Laplacian to the intensity image and returns the
//! variance of the response. Sharp images have strong edges and therefore a
//! wide Laplacian distribution; blurred ones cluster near zero.

use crate::core::decode::ImageDecoder;
use crate::error::{ComputeError, TriageError};
use image::GrayImage;
use std::path::Path;

/// Minimum image dimension for the 3x3 operator
const MIN_DIMENSION: u32 = 3;

/// Score an image file; non-negative and unbounded, lower = blurrier.
pub fn laplacian_variance(path: &Path) -> Result<f64, TriageError> {
    let gray = ImageDecoder::decode_gray(path)?;
    variance_gray(&gray, path)
}

fn variance_gray(gray: &GrayImage, path: &Path) -> Result<f64, TriageError> {
    let (width, height) = gray.dimensions();
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(ComputeError::ImageTooSmall {
            path: path.to_path_buf(),
            width,
            height,
            min: MIN_DIMENSION,
        }
        .into());
    }

    // Laplacian kernel: [0, 1, 0; 1, -4, 1; 0, 1, 0]
    let mut responses: Vec<f64> = Vec::with_capacity(((width - 2) * (height - 2)) as usize);

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = gray.get_pixel(x, y)[0] as f64;
            let top = gray.get_pixel(x, y - 1)[0] as f64;
            let bottom = gray.get_pixel(x, y + 1)[0] as f64;
            let left = gray.get_pixel(x - 1, y)[0] as f64;
            let right = gray.get_pixel(x + 1, y)[0] as f64;

            responses.push(top + bottom + left + right - 4.0 * center);
        }
    }

    if responses.is_empty() {
        return Ok(0.0);
    }

    let n = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / n;
    let variance = responses.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use tempfile::TempDir;

    fn save_png(dir: &TempDir, name: &str, img: &GrayImage) -> std::path::PathBuf {
        let path = dir.path().join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn uniform_image_has_zero_variance() {
        let temp_dir = TempDir::new().unwrap();
        let img = ImageBuffer::from_fn(32, 32, |_, _| Luma([128u8]));
        let path = save_png(&temp_dir, "flat.png", &img);

        let score = laplacian_variance(&path).unwrap();
        assert!(score < 1.0, "flat image scored {}", score);
    }

    #[test]
    fn checkerboard_has_high_variance() {
        let temp_dir = TempDir::new().unwrap();
        let img = ImageBuffer::from_fn(32, 32, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });
        let path = save_png(&temp_dir, "checker.png", &img);

        let score = laplacian_variance(&path).unwrap();
        assert!(score > 1000.0, "checkerboard scored {}", score);
    }

    #[test]
    fn blurred_copy_scores_below_sharp_original() {
        let temp_dir = TempDir::new().unwrap();
        let sharp: GrayImage = ImageBuffer::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });
        let blurred = image::imageops::blur(&sharp, 3.0);

        let sharp_path = save_png(&temp_dir, "sharp.png", &sharp);
        let blurred_path = save_png(&temp_dir, "blurred.png", &blurred);

        let sharp_score = laplacian_variance(&sharp_path).unwrap();
        let blurred_score = laplacian_variance(&blurred_path).unwrap();
        assert!(
            blurred_score < sharp_score,
            "blurred {} should score below sharp {}",
            blurred_score,
            sharp_score
        );
    }

    #[test]
    fn tiny_image_is_compute_error() {
        let temp_dir = TempDir::new().unwrap();
        let img = ImageBuffer::from_fn(2, 2, |_, _| Luma([128u8]));
        let path = save_png(&temp_dir, "tiny.png", &img);

        let result = laplacian_variance(&path);
        assert!(matches!(
            result,
            Err(TriageError::Compute(ComputeError::ImageTooSmall { .. }))
        ));
    }
}
