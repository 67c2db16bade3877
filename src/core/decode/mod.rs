//! # Decode Module
//!
//! Image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than the image crate),
//! falls back to the image crate for every other format. All per-image
//! transforms in this crate (blur scoring, perceptual hashing, descriptor
//! extraction) go through here, so decode failures are reported uniformly
//! as [`DecodeError`]s.

use crate::error::DecodeError;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Image decoder that picks the fastest available backend per format
pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode an image from a file path.
    pub fn decode(path: &Path) -> Result<DynamicImage, DecodeError> {
        let is_jpeg = matches!(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .as_deref(),
            Some("jpg" | "jpeg")
        );

        if is_jpeg {
            Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))
        } else {
            Self::decode_fallback(path)
        }
    }

    /// Decode straight to a single-channel intensity image
    pub fn decode_gray(path: &Path) -> Result<GrayImage, DecodeError> {
        let image = Self::decode(path)?;
        let gray = image.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Err(DecodeError::EmptyImage {
                path: path.to_path_buf(),
            });
        }
        Ok(gray)
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(path: &Path) -> Result<DynamicImage, DecodeError> {
        let file_bytes = fs::read(path).map_err(|e| DecodeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| DecodeError::InvalidImage {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| DecodeError::InvalidImage {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

        let image = match out_colorspace {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        DecodeError::InvalidImage {
                            path: path.to_path_buf(),
                            reason: "Failed to create RGB buffer".to_string(),
                        }
                    })?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        DecodeError::InvalidImage {
                            path: path.to_path_buf(),
                            reason: "Failed to create RGBA buffer".to_string(),
                        }
                    })?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                        DecodeError::InvalidImage {
                            path: path.to_path_buf(),
                            reason: "Failed to create Luma buffer".to_string(),
                        }
                    })?;
                DynamicImage::ImageLuma8(buffer)
            }
            _ => {
                // Unsupported colorspace, fall back to the image crate
                return Self::decode_fallback(path);
            }
        };

        Ok(image)
    }

    /// Fallback decoder covering the remaining formats
    fn decode_fallback(path: &Path) -> Result<DynamicImage, DecodeError> {
        image::open(path).map_err(|e| DecodeError::InvalidImage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
