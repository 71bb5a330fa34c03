//! Upload decoding: raw file bytes to an RGBA [`PixelBuffer`].
//!
//! Pipeline flow:
//! 1. Validate byte length (size bounds)
//! 2. Detect format from magic bytes (JPEG, PNG, TIFF)
//! 3. Read header dimensions and enforce the pixel budget
//! 4. Decode and convert to RGBA
//! 5. Pre-downscale oversized images so extraction cost stays bounded

use std::borrow::Cow;
use std::io::Cursor;

use image::imageops::FilterType;
use image::RgbaImage;
use tracing::debug;

use super::types::{ImageDecoder, PixelBuffer};
use super::AnalysisError;

/// Default upload limit (5 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default longest edge handed to the extractor.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Default cap on decoded pixels (40 megapixels, 160 MB of RGBA).
pub const DEFAULT_MAX_PIXELS: u64 = 40_000_000;

/// Upload formats the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Jpeg,
    Png,
    Tiff,
}

impl UploadFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
        }
    }
}

/// Detect the upload format from magic bytes (NOT file extensions or client MIME types).
pub fn detect_format(bytes: &[u8]) -> Option<UploadFormat> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some(UploadFormat::Jpeg),
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(UploadFormat::Png),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Some(UploadFormat::Tiff),
        _ => None,
    }
}

/// Decoder limits.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Uploads larger than this are rejected before decoding.
    pub max_bytes: usize,
    /// Longest edge after pre-downscale.
    pub max_dimension: u32,
    /// Images whose header declares more pixels than this are rejected
    /// before any pixel data is decoded.
    pub max_pixels: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

/// Production decoder backed by the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct RasterDecoder {
    config: DecoderConfig,
}

impl RasterDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, AnalysisError> {
        validate_image_bytes(bytes, self.config.max_bytes)?;

        let format = detect_format(bytes).ok_or_else(|| {
            AnalysisError::Decode("Unsupported file type; upload a JPEG, PNG or TIFF image".into())
        })?;

        let (orig_w, orig_h) = read_dimensions(bytes)?;
        check_dimensions(orig_w, orig_h, self.config.max_pixels)?;

        let img = image::load_from_memory(bytes)
            .map_err(|e| AnalysisError::Decode(format!("Failed to decode image: {e}")))?;

        let rgba = img.to_rgba8();
        let scaled = pre_downscale(&rgba, self.config.max_dimension);
        let (width, height) = scaled.dimensions();

        debug!(
            format = format.mime_type(),
            original = format!("{orig_w}x{orig_h}"),
            analyzed = format!("{width}x{height}"),
            "Image decoded for analysis"
        );

        PixelBuffer::new(width, height, scaled.into_owned().into_raw())
    }
}

/// Validate image bytes before decoding.
/// Rejects clearly invalid input before the decoder runs.
pub fn validate_image_bytes(bytes: &[u8], max_bytes: usize) -> Result<(), AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::Validation("Uploaded file is empty".into()));
    }
    if bytes.len() > max_bytes {
        return Err(AnalysisError::Validation(format!(
            "File size should be less than {}MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Read width and height from the image header without decoding pixels.
fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), AnalysisError> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AnalysisError::Decode(format!("Failed to read image header: {e}")))?
        .into_dimensions()
        .map_err(|e| AnalysisError::Decode(format!("Failed to read image header: {e}")))
}

/// Reject zero-area images and images over the pixel budget.
pub fn check_dimensions(width: u32, height: u32, max_pixels: u64) -> Result<(), AnalysisError> {
    if width == 0 || height == 0 {
        return Err(AnalysisError::Validation(format!(
            "Image has zero area ({width}x{height})"
        )));
    }
    let pixels = width as u64 * height as u64;
    if pixels > max_pixels {
        return Err(AnalysisError::Validation(format!(
            "Image is too large to analyze ({width}x{height}, limit {max_pixels} pixels)"
        )));
    }
    Ok(())
}

/// Pre-downscale oversized images so the extractor walks a bounded number of pixels.
/// Uses `Cow` to avoid cloning when no downscale is needed.
fn pre_downscale(img: &RgbaImage, max_dim: u32) -> Cow<'_, RgbaImage> {
    let (w, h) = (img.width(), img.height());
    let largest = w.max(h);

    if max_dim == 0 || largest <= max_dim {
        return Cow::Borrowed(img);
    }

    let scale = max_dim as f32 / largest as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);

    debug!(
        from = format!("{w}x{h}"),
        to = format!("{new_w}x{new_h}"),
        "Pre-downscaling oversized image"
    );

    Cow::Owned(image::imageops::resize(img, new_w, new_h, FilterType::Triangle))
}
