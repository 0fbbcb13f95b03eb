//! Fixed-iteration quality bisection.
//!
//! Encoded size has no closed form in quality, so the only oracle is to
//! encode and measure. The search bisects on "is this quality's output at or
//! under target?" for exactly [`SEARCH_ITERATIONS`] trials, which bounds the
//! cost of a session to that many full encodes whatever the image.
//!
//! Two candidates are tracked:
//! - the largest result at or under target (highest compliant quality)
//! - the result closest to target on either side, as a fallback
//!
//! The width hint is applied identically to every trial; width and quality
//! are never searched jointly.

use tracing::{debug, info};

use crate::decode::DecodedImage;
use crate::encode::{EncodeError, EncodeRequest, EncodeResult, Encoder};
use crate::error::CompressionError;
use crate::format::OutputFormat;
use crate::target::CompressionTarget;

/// Number of encode trials per session.
pub const SEARCH_ITERATIONS: usize = 8;
/// Initial lower quality bound.
pub const MIN_QUALITY: f32 = 0.01;
/// Initial upper quality bound.
pub const MAX_QUALITY: f32 = 1.0;

/// One trial as seen by the search, with the bounds it left behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub index: usize,
    pub quality: f32,
    pub size: u64,
    pub lower: f32,
    pub upper: f32,
}

/// Successful result of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub result: EncodeResult,
    /// Quality the chosen result was encoded at.
    pub quality: f32,
    /// Whether the chosen result is at or under target.
    pub within_target: bool,
    /// Width every trial was encoded at, if downscaled.
    pub width: Option<u32>,
    pub trials: Vec<Trial>,
}

#[derive(Debug, Clone)]
struct Candidate {
    result: EncodeResult,
    quality: f32,
}

/// Loop-local search state, owned by one `compress` call and seeded from
/// its first trial.
#[derive(Debug)]
struct SearchState {
    lower: f32,
    upper: f32,
    /// Closest to target on either side.
    best_result: Candidate,
    /// Largest result at or under target; `None` is the empty sentinel.
    best_under_target: Option<Candidate>,
}

impl SearchState {
    fn start(first: Candidate, target_bytes: u64) -> Self {
        let fits = first.result.size() <= target_bytes;
        Self {
            lower: if fits { first.quality } else { MIN_QUALITY },
            upper: if fits { MAX_QUALITY } else { first.quality },
            best_under_target: fits.then(|| first.clone()),
            best_result: first,
        }
    }

    fn next_quality(&self) -> f32 {
        (self.lower + self.upper) / 2.0
    }

    /// Fold one trial into the state and move a bound.
    fn record(&mut self, quality: f32, result: EncodeResult, target_bytes: u64) {
        let size = result.size();
        let best_distance = self.best_result.result.size().abs_diff(target_bytes);
        let closer = size.abs_diff(target_bytes) < best_distance;

        if size <= target_bytes {
            let larger = self
                .best_under_target
                .as_ref()
                .map_or(true, |best| size > best.result.size());

            match (closer, larger) {
                (true, true) => {
                    self.best_result = Candidate {
                        result: result.clone(),
                        quality,
                    };
                    self.best_under_target = Some(Candidate { result, quality });
                }
                (true, false) => self.best_result = Candidate { result, quality },
                (false, true) => self.best_under_target = Some(Candidate { result, quality }),
                (false, false) => {}
            }
            self.lower = quality;
        } else {
            if closer {
                self.best_result = Candidate { result, quality };
            }
            self.upper = quality;
        }
    }

    /// Under-target result if any, otherwise the closest overall.
    fn into_choice(self) -> (Candidate, bool) {
        match self.best_under_target {
            Some(under) => (under, true),
            None => (self.best_result, false),
        }
    }

    fn trial(&self, index: usize, quality: f32, size: u64) -> Trial {
        debug!(
            index,
            quality,
            size,
            lower = self.lower,
            upper = self.upper,
            "trial"
        );
        Trial {
            index,
            quality,
            size,
            lower: self.lower,
            upper: self.upper,
        }
    }
}

fn encode_trial<E: Encoder>(
    encoder: &E,
    request: &EncodeRequest<'_>,
    index: usize,
) -> Result<EncodeResult, CompressionError> {
    let result = encoder.encode(request).map_err(|e| {
        debug!(index, quality = request.quality, error = %e, "trial encode failed");
        CompressionError::EncodeFailure(e)
    })?;
    if result.bytes().is_empty() {
        return Err(CompressionError::EncodeFailure(EncodeError::EmptyOutput));
    }
    Ok(result)
}

/// Search for the highest quality whose output fits `target`.
///
/// Runs exactly [`SEARCH_ITERATIONS`] trials unless an encode fails, in
/// which case the session aborts with `EncodeFailure` and no partial result.
/// A chosen result that is not smaller than the original yields
/// `CompressionIneffective`.
pub fn compress<E: Encoder>(
    encoder: &E,
    image: &DecodedImage,
    target: CompressionTarget,
    width_hint: Option<u32>,
    format: OutputFormat,
) -> Result<SearchOutcome, CompressionError> {
    let target_bytes = target.target_bytes();
    let width = width_hint.filter(|&w| w > 0 && w < image.width);
    let mut trials = Vec::with_capacity(SEARCH_ITERATIONS);

    let quality = (MIN_QUALITY + MAX_QUALITY) / 2.0;
    let first = encode_trial(encoder, &EncodeRequest::new(image, quality, width, format), 0)?;
    let size = first.size();
    let mut state = SearchState::start(Candidate { result: first, quality }, target_bytes);
    trials.push(state.trial(0, quality, size));

    for index in 1..SEARCH_ITERATIONS {
        let quality = state.next_quality();
        let request = EncodeRequest::new(image, quality, width, format);
        let result = encode_trial(encoder, &request, index)?;

        let size = result.size();
        state.record(quality, result, target_bytes);
        trials.push(state.trial(index, quality, size));
    }

    let (chosen, within_target) = state.into_choice();
    let size = chosen.result.size();

    if size >= target.original_bytes() {
        info!(
            best_size = size,
            original_size = target.original_bytes(),
            "compression ineffective"
        );
        return Err(CompressionError::CompressionIneffective {
            best_size: size,
            original_size: target.original_bytes(),
        });
    }

    info!(
        size,
        target = target_bytes,
        quality = chosen.quality,
        within_target,
        "search complete"
    );

    Ok(SearchOutcome {
        result: chosen.result,
        quality: chosen.quality,
        within_target,
        width,
        trials,
    })
}
