//! Image encoding for sizefit.
//!
//! This module provides:
//! - The [`Encoder`] trait, the only oracle the quality search consults
//! - [`ImageCodec`], the production encoder (JPEG via `image`, lossy WebP
//!   via `webp` when the `webp` feature is enabled)
//!
//! Each call produces an independent encode; nothing is cached between
//! trials.
//!
//! # Examples
//!
//! ```ignore
//! use sizefit_core::encode::{EncodeRequest, Encoder, ImageCodec};
//! use sizefit_core::OutputFormat;
//!
//! let request = EncodeRequest::new(&image, 0.8, Some(1200), OutputFormat::Jpeg);
//! let result = ImageCodec::default().encode(&request)?;
//! println!("Encoded {} bytes", result.size());
//! ```

mod jpeg;
#[cfg(feature = "webp")]
mod webp;

use thiserror::Error;

use crate::decode::{resize_to_width, DecodeError, DecodedImage, ResampleFilter};
use crate::format::OutputFormat;

pub use jpeg::encode_jpeg;
#[cfg(feature = "webp")]
pub use self::webp::encode_webp;

/// Errors that can occur while producing one trial's bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The source could not be decoded or resized
    #[error("Source image unusable: {0}")]
    Decode(#[from] DecodeError),

    /// The requested format is not compiled in
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(OutputFormat),

    /// The codec produced no bytes
    #[error("Encoder produced no output")]
    EmptyOutput,

    /// The codec itself failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },
}

/// One trial's encode parameters.
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pub image: &'a DecodedImage,
    /// Encoder fidelity in (0, 1].
    pub quality: f32,
    /// Fixed downscale width; ignored when not smaller than the image.
    pub target_width: Option<u32>,
    pub format: OutputFormat,
}

impl<'a> EncodeRequest<'a> {
    pub fn new(
        image: &'a DecodedImage,
        quality: f32,
        target_width: Option<u32>,
        format: OutputFormat,
    ) -> Self {
        Self {
            image,
            quality,
            target_width,
            format,
        }
    }
}

/// Encoded bytes of one trial.
///
/// Only constructible from the bytes, so `size()` is always `bytes().len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResult {
    bytes: Vec<u8>,
}

impl EncodeResult {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Raster codec used by the quality search.
pub trait Encoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeResult, EncodeError>;
}

impl<F> Encoder for F
where
    F: Fn(&EncodeRequest<'_>) -> Result<EncodeResult, EncodeError>,
{
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeResult, EncodeError> {
        self(request)
    }
}

/// Production encoder backed by the `image` and `webp` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    /// Filter used for the fixed-width downscale.
    pub filter: ResampleFilter,
}

impl ImageCodec {
    pub fn with_filter(filter: ResampleFilter) -> Self {
        Self { filter }
    }
}

impl Encoder for ImageCodec {
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeResult, EncodeError> {
        let image = request.image;
        let resized;
        let source = match request.target_width {
            Some(width) if width < image.width => {
                resized = resize_to_width(image, width, self.filter)?;
                &resized
            }
            _ => image,
        };

        let bytes = match request.format {
            OutputFormat::Jpeg => encode_jpeg(
                &source.pixels,
                source.width,
                source.height,
                jpeg_quality(request.quality),
            )?,
            #[cfg(feature = "webp")]
            OutputFormat::WebP => encode_webp(
                &source.pixels,
                source.width,
                source.height,
                webp_quality(request.quality),
            )?,
            #[cfg(not(feature = "webp"))]
            OutputFormat::WebP => return Err(EncodeError::UnsupportedFormat(OutputFormat::WebP)),
        };

        if bytes.is_empty() {
            return Err(EncodeError::EmptyOutput);
        }
        Ok(EncodeResult::new(bytes))
    }
}

/// Map a unit quality onto libjpeg's 1-100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().max(1.0).min(100.0) as u8
}

/// Map a unit quality onto libwebp's 0-100 float scale.
#[cfg_attr(not(feature = "webp"), allow(dead_code))]
fn webp_quality(quality: f32) -> f32 {
    (quality * 100.0).clamp(0.0, 100.0)
}
