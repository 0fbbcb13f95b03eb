//! Gemini-backed hint provider.
//!
//! Sends a single `generateContent` request with a JSON response schema and
//! parses the `{quality, newWidth}` object out of the first candidate.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info_span, Instrument};

use super::{HintError, HintProvider, HintRequest, RawHint};
use crate::config::GeminiConfig;

/// Hint provider calling the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiHintProvider {
    client: reqwest::Client,
    api_key: String,
    config: GeminiConfig,
}

impl GeminiHintProvider {
    /// Build a provider. Fails with `MissingApiKey` when no key is set.
    pub fn new(config: GeminiConfig) -> Result<Self, HintError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(HintError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HintError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl HintProvider for GeminiHintProvider {
    async fn fetch_size_hint(&self, request: &HintRequest) -> Result<RawHint, HintError> {
        let body = request_body(&build_prompt(request));
        let span = info_span!("gemini_hint", model = %self.config.model);

        async {
            let resp = self
                .client
                .post(self.url())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(HintError::Request(format!(
                    "Gemini API error {status}: {}",
                    error_message(&text)
                )));
            }

            let json: Value = resp.json().await.map_err(map_reqwest_error)?;
            let hint = parse_generate_response(&json)?;
            debug!(?hint, "gemini answered");
            Ok(hint)
        }
        .instrument(span)
        .await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> HintError {
    if err.is_timeout() {
        HintError::Timeout
    } else if err.is_decode() {
        HintError::InvalidResponse(err.to_string())
    } else {
        HintError::Request(err.to_string())
    }
}

/// `error.message` from an API error body, or the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Prompt describing the session to the model.
pub fn build_prompt(request: &HintRequest) -> String {
    let original_kb = request.original_bytes as f64 / 1024.0;
    let target_kb = request.target_bytes as f64 / 1024.0;
    let mime = request.format.mime_type();

    format!(
        "I need to compress an image with the following properties:\n\
         - Original file size: {original_kb:.2} KB\n\
         - Dimensions: {width}x{height} pixels\n\
         - MIME type: {mime}\n\
         \n\
         My target file size is approximately {target_kb:.2} KB.\n\
         \n\
         The image will be re-encoded as {mime} with a quality parameter between 0 and 1.\n\
         Suggest the parameters most likely to reach the target:\n\
         1. quality: a float between 0.1 and 1.0 that hits the target size while preserving visual fidelity.\n\
         2. newWidth: a smaller width in pixels if downscaling would give better quality at the target size, otherwise null.\n\
         \n\
         Respond ONLY with a JSON object. No markdown, no explanations.",
        width = request.width,
        height = request.height,
    )
}

/// `generateContent` body with the response schema attached.
pub(crate) fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "quality": {
                        "type": "NUMBER",
                        "description": "A float between 0.1 and 1.0 for the image quality."
                    },
                    "newWidth": {
                        "type": "INTEGER",
                        "description": "The suggested new width in pixels, or null if no resize is needed.",
                        "nullable": true
                    }
                },
                "required": ["quality", "newWidth"]
            }
        }
    })
}

/// Pull the hint out of a `generateContent` response.
pub fn parse_generate_response(json: &Value) -> Result<RawHint, HintError> {
    let text = json["candidates"]
        .as_array()
        .and_then(|a| a.first())
        .and_then(|c| c["content"]["parts"].as_array())
        .and_then(|p| p.first())
        .and_then(|p| p["text"].as_str())
        .ok_or_else(|| HintError::InvalidResponse("no candidate text".to_string()))?;

    let text = strip_code_fence(text.trim());
    serde_json::from_str(text).map_err(|e| HintError::InvalidResponse(e.to_string()))
}

/// Models occasionally wrap JSON in a fenced block despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(text)
}
