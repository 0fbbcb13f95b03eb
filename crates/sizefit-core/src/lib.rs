//! Sizefit Core - Target-size image recompression
//!
//! This crate recompresses an image so that its encoded size lands at or just
//! under a requested byte count. An advisory hint (from Gemini, a local
//! heuristic, or the caller) decides a fixed resize width, and a bounded
//! bisection over encoder quality does the rest.
//!
//! # Module Structure
//!
//! - `decode` - Image decoding with EXIF orientation, width-preserving resize
//! - `encode` - The `Encoder` seam and the `image`/`webp` backed `ImageCodec`
//! - `hint` - Hint providers and the validating resolver
//! - `search` - The fixed-iteration quality bisection
//! - `session` - End-to-end orchestration with progress checkpoints
//!
//! # Example
//!
//! ```ignore
//! use sizefit_core::{Compressor, HeuristicHintProvider, ImageCodec};
//!
//! let bytes = std::fs::read("photo.png")?;
//! let compressor = Compressor::new(HeuristicHintProvider, ImageCodec::default());
//! let (outcome, format) = compressor.attempt_bytes(&bytes, 500 * 1024, &mut ()).await?;
//! std::fs::write(format!("photo-small.{}", format.extension()), outcome.result.bytes())?;
//! ```

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod hint;
pub mod search;
pub mod session;
pub mod target;

pub use config::{GeminiConfig, HintSource, SizefitConfig};
pub use decode::{decode_image, DecodedImage};
pub use encode::{EncodeRequest, EncodeResult, Encoder, ImageCodec};
pub use error::CompressionError;
pub use format::{OutputFormat, SourceFormat};
#[cfg(feature = "gemini")]
pub use hint::GeminiHintProvider;
pub use hint::{FixedHint, HeuristicHintProvider, HintProvider, HintRequest, RawHint, SizeHint};
pub use search::{compress, SearchOutcome, Trial};
pub use session::{decode_upload, run_search, Compressor, Progress, ProgressSink, SearchPlan};
pub use target::{CompressionTarget, SizeUnit, TargetSize};
