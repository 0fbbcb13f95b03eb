//! Local hint provider.
//!
//! Picks a width from size tiers of the *target* byte count, and shrinks
//! further when the target is a small fraction of the original. Quality is
//! the size ratio clamped into the provider range.

use super::{HintError, HintProvider, HintRequest, RawHint, MAX_HINT_QUALITY, MIN_HINT_QUALITY};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;

/// Below this ratio the pixel count is reduced along with quality.
const RESIZE_RATIO: f64 = 0.25;

/// Deterministic provider that needs no network.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicHintProvider;

impl HeuristicHintProvider {
    /// Compute the hint synchronously.
    pub fn suggest(&self, request: &HintRequest) -> RawHint {
        let ratio = request.size_ratio();
        let quality = ratio.clamp(MIN_HINT_QUALITY, MAX_HINT_QUALITY);

        let tier_width = tier_width(request.target_bytes);
        let ratio_width = ratio_width(request.width, ratio);

        let new_width = [tier_width, ratio_width]
            .into_iter()
            .flatten()
            .min()
            .filter(|&w| w < request.width);

        RawHint {
            quality,
            new_width: new_width.map(i64::from),
        }
    }
}

impl HintProvider for HeuristicHintProvider {
    async fn fetch_size_hint(&self, request: &HintRequest) -> Result<RawHint, HintError> {
        Ok(self.suggest(request))
    }
}

/// Widest output that is sensible for a target byte count.
fn tier_width(target_bytes: u64) -> Option<u32> {
    match target_bytes {
        t if t < 50 * KB => Some(640),
        t if t < 150 * KB => Some(1024),
        t if t < 500 * KB => Some(1600),
        t if t < 2 * MB => Some(2560),
        _ => None,
    }
}

/// Width that keeps bytes-per-pixel constant once the ratio is small.
///
/// Encoded size scales roughly with pixel count, so width scales with the
/// square root of the remaining ratio.
fn ratio_width(width: u32, ratio: f64) -> Option<u32> {
    if !(ratio > 0.0 && ratio < RESIZE_RATIO) {
        return None;
    }
    let scale = (ratio / RESIZE_RATIO).sqrt();
    Some(((width as f64 * scale).round() as u32).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;

    fn request(original: u64, target: u64, width: u32, height: u32) -> HintRequest {
        HintRequest {
            original_bytes: original,
            width,
            height,
            target_bytes: target,
            format: OutputFormat::Jpeg,
        }
    }

    #[test]
    fn test_mild_reduction_keeps_width() {
        let hint = HeuristicHintProvider.suggest(&request(3 * MB, 2 * MB + 1, 2000, 1500));
        assert_eq!(hint.new_width, None);
        assert!((hint.quality - (2 * MB + 1) as f64 / (3 * MB) as f64).abs() < 1e-9);
    }

    #[test]
    fn test_small_target_uses_tier() {
        let hint = HeuristicHintProvider.suggest(&request(4 * MB, 100 * KB, 6000, 4000));
        assert_eq!(hint.new_width, Some(1024));
        assert_eq!(hint.quality, MIN_HINT_QUALITY);
    }

    #[test]
    fn test_ratio_width_below_tier() {
        // ratio 1/16 -> scale 0.5 -> 1000 px, under the 2560 tier
        let hint = HeuristicHintProvider.suggest(&request(8 * MB, MB / 2, 2000, 1000));
        assert_eq!(hint.new_width, Some(1000));
    }

    #[test]
    fn test_never_suggests_upscale() {
        let hint = HeuristicHintProvider.suggest(&request(60 * KB, 10 * KB, 320, 240));
        assert_eq!(hint.new_width.map(|w| w < 320), Some(true));

        let hint = HeuristicHintProvider.suggest(&request(100 * KB, 80 * KB, 300, 200));
        assert_eq!(hint.new_width, None);
    }

    #[test]
    fn test_suggestion_validates() {
        let hint = HeuristicHintProvider.suggest(&request(2_000_000, 500_000, 4000, 3000));
        assert!(super::super::validate(hint).is_ok());
    }
}
