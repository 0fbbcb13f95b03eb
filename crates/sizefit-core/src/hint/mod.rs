//! Compression hints.
//!
//! A [`HintProvider`] suggests `{quality, newWidth}` for a session. The
//! [`resolve`] step validates what comes back and reduces it to a
//! [`SizeHint`]; the width is the only part the search acts on.
//!
//! Providers:
//! - [`GeminiHintProvider`] asks Gemini through its REST API (`gemini` feature)
//! - [`HeuristicHintProvider`] derives a width locally from the size ratio
//! - [`FixedHint`] hands back a caller-supplied hint

#[cfg(feature = "gemini")]
mod gemini;
mod heuristic;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::DecodedImage;
use crate::format::OutputFormat;

#[cfg(feature = "gemini")]
pub use gemini::{build_prompt, parse_generate_response, GeminiHintProvider};
pub use heuristic::HeuristicHintProvider;

/// Lowest quality a provider may suggest.
pub const MIN_HINT_QUALITY: f64 = 0.1;
/// Highest quality a provider may suggest.
pub const MAX_HINT_QUALITY: f64 = 1.0;

/// Errors from fetching or validating a hint.
#[derive(Debug, Error)]
pub enum HintError {
    /// No API key was configured for a remote provider.
    #[error("No API key configured")]
    MissingApiKey,

    /// The request could not be sent or the service returned an error.
    #[error("Hint request failed: {0}")]
    Request(String),

    /// The service did not answer in time.
    #[error("Hint request timed out")]
    Timeout,

    /// The response body could not be understood.
    #[error("Malformed hint response: {0}")]
    InvalidResponse(String),

    /// Quality outside [0.1, 1.0].
    #[error("Invalid quality value received: {0}")]
    InvalidQuality(f64),

    /// Width present but not a positive integer.
    #[error("Invalid newWidth value received: {0}")]
    InvalidWidth(i64),
}

/// What a provider is told about the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRequest {
    pub original_bytes: u64,
    pub width: u32,
    pub height: u32,
    pub target_bytes: u64,
    pub format: OutputFormat,
}

impl HintRequest {
    /// Ratio of target to original size.
    pub fn size_ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 1.0;
        }
        self.target_bytes as f64 / self.original_bytes as f64
    }
}

/// Unvalidated provider answer, in the wire shape `{quality, newWidth}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawHint {
    pub quality: f64,
    #[serde(rename = "newWidth", default)]
    pub new_width: Option<i64>,
}

/// Validated hint.
///
/// `suggested_quality` is advisory and never seeds the search;
/// `suggested_width` is applied to every trial of the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeHint {
    pub suggested_quality: f32,
    pub suggested_width: Option<u32>,
}

/// Source of compression hints.
///
/// One call per session; implementations must not retry internally.
#[allow(async_fn_in_trait)]
pub trait HintProvider {
    async fn fetch_size_hint(&self, request: &HintRequest) -> Result<RawHint, HintError>;
}

/// Provider returning a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedHint(pub RawHint);

impl FixedHint {
    pub fn new(quality: f64, new_width: Option<i64>) -> Self {
        Self(RawHint { quality, new_width })
    }
}

impl HintProvider for FixedHint {
    async fn fetch_size_hint(&self, _request: &HintRequest) -> Result<RawHint, HintError> {
        Ok(self.0)
    }
}

/// Check a raw hint against the provider contract.
///
/// Out-of-range values are rejected, never clamped.
pub fn validate(raw: RawHint) -> Result<SizeHint, HintError> {
    if !(MIN_HINT_QUALITY..=MAX_HINT_QUALITY).contains(&raw.quality) {
        return Err(HintError::InvalidQuality(raw.quality));
    }

    let suggested_width = match raw.new_width {
        None => None,
        Some(width) => match u32::try_from(width) {
            Ok(w) if w > 0 => Some(w),
            _ => return Err(HintError::InvalidWidth(width)),
        },
    };

    Ok(SizeHint {
        suggested_quality: raw.quality as f32,
        suggested_width,
    })
}

/// Fetch and validate a hint for `image`.
///
/// A width at or above the image's current width is dropped, so no trial
/// ever enlarges the image.
pub async fn resolve<P: HintProvider>(
    provider: &P,
    image: &DecodedImage,
    original_bytes: u64,
    target_bytes: u64,
    format: OutputFormat,
) -> Result<SizeHint, HintError> {
    let request = HintRequest {
        original_bytes,
        width: image.width,
        height: image.height,
        target_bytes,
        format,
    };

    let raw = provider
        .fetch_size_hint(&request)
        .await
        .inspect_err(|e| warn!(error = %e, "hint provider failed"))?;

    let mut hint = validate(raw).inspect_err(|e| warn!(error = %e, ?raw, "hint rejected"))?;

    if let Some(width) = hint.suggested_width {
        if width >= image.width {
            debug!(width, image_width = image.width, "discarding non-shrinking width hint");
            hint.suggested_width = None;
        }
    }

    debug!(?hint, "hint resolved");
    Ok(hint)
}
