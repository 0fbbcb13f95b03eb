//! Lossy WebP encoding through libwebp.
//!
//! The `image` crate only writes lossless WebP, which has no quality knob,
//! so lossy output goes through the `webp` bindings.

use super::jpeg::validate_rgb;
use super::EncodeError;
use crate::format::OutputFormat;

/// Encode RGB pixel data to lossy WebP. `quality` is libwebp's 0-100 scale.
pub fn encode_webp(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: f32,
) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(pixels, width, height)?;

    let memory = ::webp::Encoder::from_rgb(pixels, width, height)
        .encode_simple(false, quality.clamp(0.0, 100.0))
        .map_err(|e| EncodeError::EncodingFailed {
            format: OutputFormat::WebP,
            message: format!("{e:?}"),
        })?;

    Ok(memory.to_vec())
}
