//! Decoded raster and the knobs applied to it before encoding.

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an upload could not become a [`DecodedImage`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes match no compiled-in format.
    #[error("Unrecognized image format")]
    InvalidFormat,

    /// The format was recognized but the data is broken.
    #[error("Image data is corrupted: {0}")]
    CorruptedFile(String),

    /// A zero-sized image, or a zero-sized resize target.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Resampling used for the session's downscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    /// Nearest neighbour.
    Fast,
    /// Triangle (bilinear).
    #[default]
    Balanced,
    /// Lanczos3. Slowest; sharper edges also cost bytes at a given quality.
    Sharp,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Fast => FilterType::Nearest,
            ResampleFilter::Balanced => FilterType::Triangle,
            ResampleFilter::Sharp => FilterType::Lanczos3,
        }
    }
}

/// EXIF `Orientation` tag, as the transform that makes the image upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Upright,
    Mirrored,
    UpsideDown,
    MirroredUpsideDown,
    MirroredRotatedLeft,
    RotatedRight,
    MirroredRotatedRight,
    RotatedLeft,
}

impl Orientation {
    /// Map a tag value 1-8; anything else is treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::Mirrored,
            3 => Self::UpsideDown,
            4 => Self::MirroredUpsideDown,
            5 => Self::MirroredRotatedLeft,
            6 => Self::RotatedRight,
            7 => Self::MirroredRotatedRight,
            8 => Self::RotatedLeft,
            _ => Self::Upright,
        }
    }

    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Upright => img,
            Self::Mirrored => img.fliph(),
            Self::UpsideDown => img.rotate180(),
            Self::MirroredUpsideDown => img.flipv(),
            Self::MirroredRotatedLeft => img.rotate90().fliph(),
            Self::RotatedRight => img.rotate90(),
            Self::MirroredRotatedRight => img.rotate270().fliph(),
            Self::RotatedLeft => img.rotate270(),
        }
    }
}

/// Upright RGB8 raster, row-major, 3 bytes per pixel.
///
/// A session borrows one of these for every trial and never mutates it.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 3);
        Self { width, height, pixels }
    }

    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Zero-copy `image` view, `None` if the buffer is short.
    pub fn as_rgb_view(&self) -> Option<ImageBuffer<Rgb<u8>, &[u8]>> {
        ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
