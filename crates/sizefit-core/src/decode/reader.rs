//! Upload decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::ImageReader;
use tracing::debug;

use super::{DecodeError, DecodedImage, Orientation};

/// Decode an uploaded image, applying EXIF orientation correction.
///
/// The format is guessed from the bytes. Alpha is dropped since every
/// output format the session produces is opaque.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes match no known format,
/// `DecodeError::CorruptedFile` if decoding fails, and
/// `DecodeError::InvalidDimensions` for zero-sized images.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = read_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let rgb = orientation.apply(img).into_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    debug!(width, height, ?orientation, "decoded source image");
    Ok(DecodedImage::from_rgb_image(rgb))
}

/// EXIF orientation of the upload, upright when there is no tag.
fn read_orientation(bytes: &[u8]) -> Orientation {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from_exif)
        .unwrap_or_default()
}
