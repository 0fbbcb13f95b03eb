//! WASM-compatible wrapper types.
//!
//! These wrap the core session outcome so JavaScript can read sizes and
//! copy the encoded bytes out of WASM memory.

use sizefit_core::{OutputFormat, SearchOutcome};
use wasm_bindgen::prelude::*;

/// Result of a successful compression session.
///
/// # Memory Management
///
/// The encoded bytes live in WASM memory. `bytes()` copies them into a
/// `Uint8Array`; call it once and keep the copy.
#[wasm_bindgen]
pub struct JsCompressionResult {
    bytes: Vec<u8>,
    quality: f32,
    within_target: bool,
    width: Option<u32>,
    trial_count: usize,
    format: OutputFormat,
}

#[wasm_bindgen]
impl JsCompressionResult {
    /// Encoded size in bytes
    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Quality (0-1) the chosen result was encoded at
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// False when no trial fit and the closest result was returned instead
    #[wasm_bindgen(getter)]
    pub fn within_target(&self) -> bool {
        self.within_target
    }

    /// Width the image was downscaled to, if any
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    /// MIME type of the encoded bytes, e.g. `image/jpeg`
    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.format.mime_type().to_string()
    }

    /// File extension for downloads, e.g. `jpg`
    #[wasm_bindgen(getter)]
    pub fn extension(&self) -> String {
        self.format.extension().to_string()
    }

    /// Returns the encoded bytes as a Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl JsCompressionResult {
    pub(crate) fn from_outcome(outcome: SearchOutcome, format: OutputFormat) -> Self {
        Self {
            quality: outcome.quality,
            within_target: outcome.within_target,
            width: outcome.width,
            trial_count: outcome.trials.len(),
            bytes: outcome.result.into_bytes(),
            format,
        }
    }
}

/// Dimensions and format of an uploaded image.
#[wasm_bindgen]
pub struct JsImageInfo {
    width: u32,
    height: u32,
    output_format: OutputFormat,
}

#[wasm_bindgen]
impl JsImageInfo {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// MIME type a session on this image will produce
    #[wasm_bindgen(getter)]
    pub fn output_mime_type(&self) -> String {
        self.output_format.mime_type().to_string()
    }
}

impl JsImageInfo {
    pub(crate) fn new(width: u32, height: u32, output_format: OutputFormat) -> Self {
        Self {
            width,
            height,
            output_format,
        }
    }
}

/// Convert a JavaScript number of bytes to `u64`.
///
/// Negative, fractional-below-one or non-finite values become 0, which the
/// session rejects as an invalid target.
pub(crate) fn bytes_from_f64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sizefit_core::{EncodeResult, Trial};

    fn outcome() -> SearchOutcome {
        SearchOutcome {
            result: EncodeResult::new(vec![0xFF, 0xD8, 0xFF, 0xD9]),
            quality: 0.42,
            within_target: true,
            width: Some(800),
            trials: vec![
                Trial {
                    index: 0,
                    quality: 0.505,
                    size: 4,
                    lower: 0.505,
                    upper: 1.0,
                };
                8
            ],
        }
    }

    #[test]
    fn test_from_outcome() {
        let result = JsCompressionResult::from_outcome(outcome(), OutputFormat::Jpeg);
        assert_eq!(result.size(), 4);
        assert_eq!(result.quality(), 0.42);
        assert!(result.within_target());
        assert_eq!(result.width(), Some(800));
        assert_eq!(result.trial_count(), 8);
        assert_eq!(result.mime_type(), "image/jpeg");
        assert_eq!(result.extension(), "jpg");
        assert_eq!(result.bytes(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_image_info() {
        let info = JsImageInfo::new(640, 480, OutputFormat::WebP);
        assert_eq!(info.width(), 640);
        assert_eq!(info.height(), 480);
        assert_eq!(info.output_mime_type(), "image/webp");
    }

    #[test]
    fn test_bytes_from_f64() {
        assert_eq!(bytes_from_f64(512_000.0), 512_000);
        assert_eq!(bytes_from_f64(1536.9), 1536);
        assert_eq!(bytes_from_f64(-1.0), 0);
        assert_eq!(bytes_from_f64(f64::NAN), 0);
        assert_eq!(bytes_from_f64(f64::INFINITY), 0);
    }
}
