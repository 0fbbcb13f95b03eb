//! Hint provider backed by a JavaScript callback.
//!
//! The callback receives `{ originalBytes, width, height, targetBytes, format }`
//! and returns `{ quality, newWidth }` or a Promise of it. A thrown error or
//! rejected Promise surfaces as `HintUnavailable`; the core validates the
//! returned values.

use sizefit_core::hint::HintError;
use sizefit_core::{HintProvider, HintRequest, RawHint};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Adapts the `hint_fn` passed to `compress_to_target`.
pub(crate) struct JsHintProvider {
    callback: js_sys::Function,
}

impl JsHintProvider {
    pub(crate) fn new(callback: js_sys::Function) -> Self {
        Self { callback }
    }
}

impl HintProvider for JsHintProvider {
    async fn fetch_size_hint(&self, request: &HintRequest) -> Result<RawHint, HintError> {
        let arg = serde_wasm_bindgen::to_value(request)
            .map_err(|e| HintError::Request(e.to_string()))?;

        let returned = self
            .callback
            .call1(&JsValue::NULL, &arg)
            .map_err(|e| HintError::Request(js_error_message(&e)))?;

        let resolved = JsFuture::from(js_sys::Promise::resolve(&returned))
            .await
            .map_err(|e| HintError::Request(js_error_message(&e)))?;

        serde_wasm_bindgen::from_value(resolved).map_err(|e| HintError::InvalidResponse(e.to_string()))
    }
}

/// Best-effort message from a thrown JavaScript value.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| "hint callback failed".to_string())
}
