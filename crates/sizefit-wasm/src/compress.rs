//! Compression session bindings.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! import { compress_to_target, image_info } from '@sizefit/wasm';
//!
//! const info = image_info(bytes);
//! console.log(`${info.width}x${info.height} -> ${info.output_mime_type}`);
//!
//! try {
//!   const result = await compress_to_target(bytes, 200 * 1024, askGemini);
//!   console.log(`${result.size} bytes at quality ${result.quality}`);
//! } catch (e) {
//!   // "Invalid target: ..."
//!   // "Could not get compression settings: ..."
//!   // "Encoding failed: ..."
//!   // "Compression resulted in a larger file ..."
//! }
//! ```

use sizefit_core::{decode_image, Compressor, ImageCodec, OutputFormat, Progress, ProgressSink, SourceFormat};
use wasm_bindgen::prelude::*;

use crate::hint::JsHintProvider;
use crate::types::{bytes_from_f64, JsCompressionResult, JsImageInfo};

/// Forwards progress percentages to an optional JavaScript callback.
struct JsProgress(Option<js_sys::Function>);

impl ProgressSink for JsProgress {
    fn report(&mut self, progress: Progress) {
        if let Some(callback) = &self.0 {
            // Progress is advisory; a throwing callback does not stop the session.
            let _ = callback.call1(&JsValue::NULL, &JsValue::from(progress.percent()));
        }
    }
}

/// Compress an uploaded image to at most `target_bytes`.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes (JPEG, PNG, WebP, ...)
/// * `target_bytes` - Desired maximum size; must be positive and below the file size
/// * `hint_fn` - Called once with `{ originalBytes, width, height, targetBytes, format }`;
///   returns `{ quality, newWidth }` or a Promise of it
/// * `progress_fn` - Optional, called with 10, 30, 60, 90 and 100
///
/// # Errors
///
/// Rejects with the session error message when the target is invalid, the hint
/// callback fails or answers out of range, encoding fails, or no trial is
/// smaller than the original.
#[wasm_bindgen]
pub async fn compress_to_target(
    bytes: Vec<u8>,
    target_bytes: f64,
    hint_fn: js_sys::Function,
    progress_fn: Option<js_sys::Function>,
) -> Result<JsCompressionResult, JsValue> {
    let compressor = Compressor::new(JsHintProvider::new(hint_fn), ImageCodec::default());
    let mut progress = JsProgress(progress_fn);

    match compressor
        .attempt_bytes(&bytes, bytes_from_f64(target_bytes), &mut progress)
        .await
    {
        Ok((outcome, format)) => Ok(JsCompressionResult::from_outcome(outcome, format)),
        Err(e) => {
            let message = e.to_string();
            web_sys::console::error_1(&JsValue::from_str(&message));
            Err(JsValue::from_str(&message))
        }
    }
}

/// Decode an image and report its oriented dimensions and output format.
///
/// Useful for showing the user what a session will produce before asking
/// for a target size.
#[wasm_bindgen]
pub fn image_info(bytes: &[u8]) -> Result<JsImageInfo, JsValue> {
    let format = OutputFormat::for_source(SourceFormat::detect(bytes));
    let image = decode_image(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(JsImageInfo::new(image.width, image.height, format))
}
