//! Session-level error type.
//!
//! Each stage has its own error enum (`DecodeError`, `EncodeError`,
//! `HintError`); a compression session surfaces exactly one of the four
//! outcomes below so callers can tell "pick another target" apart from
//! "try again later".

use thiserror::Error;

use crate::encode::EncodeError;
use crate::hint::HintError;

/// Terminal failure of a compression session.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Target is zero, or not smaller than the original.
    #[error(
        "Invalid target: {target_bytes} bytes must be greater than 0 and smaller than the original ({original_bytes} bytes)"
    )]
    InvalidTarget {
        target_bytes: u64,
        original_bytes: u64,
    },

    /// The hint provider failed or returned data that did not validate.
    #[error("Could not get compression settings: {0}")]
    HintUnavailable(#[source] HintError),

    /// A trial could not produce encoded bytes.
    #[error("Encoding failed: {0}")]
    EncodeFailure(#[source] EncodeError),

    /// The best trial is still not smaller than the original.
    #[error(
        "Compression resulted in a larger file ({best_size} bytes vs {original_size} bytes); try a lower target size or a different image"
    )]
    CompressionIneffective { best_size: u64, original_size: u64 },
}

impl From<HintError> for CompressionError {
    fn from(err: HintError) -> Self {
        CompressionError::HintUnavailable(err)
    }
}

impl From<EncodeError> for CompressionError {
    fn from(err: EncodeError) -> Self {
        CompressionError::EncodeFailure(err)
    }
}
