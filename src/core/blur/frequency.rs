//! Frequency-domain blur score.
//!
//! Computes a 2D Fourier transform of the intensity image and measures how
//! much of the magnitude spectrum falls outside a centered low-frequency
//! disk of radius `radius_ratio * min(width, height)`. Sharp images carry
//! substantial high-frequency energy; blurred ones concentrate energy near
//! the zero-frequency component.

use crate::core::decode::ImageDecoder;
use crate::error::{ComputeError, ResourceError, TriageError};
use image::GrayImage;
use rustfft::{num_complex::Complex, FftPlanner};
use std::path::Path;

/// Minimum image dimension for a meaningful spectrum
const MIN_DIMENSION: u32 = 4;

/// Score an image file in [0, 1]; lower = blurrier.
///
/// A flat image (total spectral energy ~0) scores 0, not an error.
pub fn frequency_score(path: &Path, radius_ratio: f64) -> Result<f64, TriageError> {
    let gray = ImageDecoder::decode_gray(path)?;
    score_gray(&gray, radius_ratio, path)
}

fn score_gray(gray: &GrayImage, radius_ratio: f64, path: &Path) -> Result<f64, TriageError> {
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

    let w = width as usize;
    let h = height as usize;
    let len = w * h;

    let mut spectrum: Vec<Complex<f32>> = Vec::new();
    spectrum
        .try_reserve_exact(len)
        .map_err(|_| ResourceError::OutOfMemory {
            operation: "frequency blur score".to_string(),
            path: path.to_path_buf(),
        })?;
    spectrum.extend(gray.pixels().map(|p| Complex::new(p[0] as f32, 0.0)));

    // Row pass, then column pass through a scratch buffer.
    let mut planner = FftPlanner::<f32>::new();
    let row_fft = planner.plan_fft_forward(w);
    for row in spectrum.chunks_exact_mut(w) {
        row_fft.process(row);
    }

    let col_fft = planner.plan_fft_forward(h);
    let mut column = vec![Complex::new(0.0f32, 0.0); h];
    for x in 0..w {
        for y in 0..h {
            column[y] = spectrum[y * w + x];
        }
        col_fft.process(&mut column);
        for y in 0..h {
            spectrum[y * w + x] = column[y];
        }
    }

    // Summing over signed frequency indices is equivalent to shifting the
    // zero-frequency component to the image center and masking a disk there.
    let radius = ((radius_ratio * width.min(height) as f64) as i64).max(1);
    let radius_sq = radius * radius;

    let mut total = 0.0f64;
    let mut low = 0.0f64;
    for y in 0..h {
        let fy = signed_frequency(y, h);
        for x in 0..w {
            let fx = signed_frequency(x, w);
            let magnitude = spectrum[y * w + x].norm() as f64;
            total += magnitude;
            if fx * fx + fy * fy <= radius_sq {
                low += magnitude;
            }
        }
    }

    if total <= 1e-6 {
        return Ok(0.0);
    }

    Ok(((total - low) / total).clamp(0.0, 1.0))
}

/// Map an FFT bin index to its signed frequency offset from DC
fn signed_frequency(index: usize, n: usize) -> i64 {
    if index < n.div_ceil(2) {
        index as i64
    } else {
        index as i64 - n as i64
    }
}
