//! Resizing for the session's fixed-width downscale.
//!
//! A session decides its width once and every trial encodes at that width,
//! so these functions are pure and never modify the input.

use super::{DecodeError, DecodedImage, ResampleFilter};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for a zero target and
/// `DecodeError::CorruptedFile` if the pixel buffer does not match the
/// declared dimensions.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: ResampleFilter,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let view = image
        .as_rgb_view()
        .ok_or_else(|| DecodeError::CorruptedFile("Pixel buffer size mismatch".to_string()))?;

    let resized = image::imageops::resize(&view, width, height, filter.into());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Downscale an image to `target_width`, recomputing height from the aspect
/// ratio.
///
/// Never upscales: a target at or above the current width returns an
/// unchanged copy.
pub fn resize_to_width(
    image: &DecodedImage,
    target_width: u32,
    filter: ResampleFilter,
) -> Result<DecodedImage, DecodeError> {
    let (width, height) = scaled_dimensions(image.width, image.height, target_width);
    resize(image, width, height, filter)
}

/// Dimensions after scaling to `target_width`.
///
/// Height is `target_width * height / width`, rounded, at least 1. Targets of
/// zero or not smaller than `width` leave the dimensions unchanged.
pub fn scaled_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    if target_width == 0 || target_width >= width {
        return (width, height);
    }

    let aspect = height as f64 / width as f64;
    let new_height = (target_width as f64 * aspect).round() as u32;
    (target_width, new_height.max(1))
}
