//! Image decoding for sizefit.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG and WebP uploads to RGB pixels
//! - Applying EXIF orientation so dimensions match what the user sees
//! - Downscaling to a fixed width while preserving aspect ratio
//!
//! All operations are synchronous; the session calls them between awaits.

mod reader;
mod resize;
mod types;

pub use reader::decode_image;
pub use resize::{resize, resize_to_width, scaled_dimensions};
pub use types::{DecodeError, DecodedImage, Orientation, ResampleFilter};
