//! Sizefit WASM - WebAssembly bindings for sizefit
//!
//! This crate exposes target-size compression to a browser front end. The
//! page supplies the compression hint (typically from its own Gemini call)
//! through a callback, and may subscribe to progress checkpoints.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible result and info types
//! - `hint` - Hint provider backed by a JavaScript callback
//! - `compress` - Session bindings
//!
//! # Usage
//!
//! ```typescript
//! import init, { compress_to_target } from '@sizefit/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = await compress_to_target(
//!   bytes,
//!   500 * 1024,
//!   async (req) => fetchHintFromGemini(req), // -> { quality, newWidth }
//!   (percent) => setProgress(percent),
//! );
//! const blob = new Blob([result.bytes()], { type: result.mime_type });
//! ```

use wasm_bindgen::prelude::*;

mod compress;
mod hint;
mod types;

pub use compress::{compress_to_target, image_info};
pub use types::{JsCompressionResult, JsImageInfo};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
