//! End-to-end compression session.
//!
//! A session validates the target, resolves a hint (the one await point),
//! then runs the quality search. Progress checkpoints are reported along the
//! way for UI feedback; they carry no correctness meaning.
//!
//! The two phases are also exposed separately ([`Compressor::prepare`] and
//! [`run_search`]) so a host can move the CPU-bound search onto a blocking
//! thread.

use tracing::{info, info_span, warn, Instrument};

use crate::decode::{decode_image, DecodedImage};
use crate::encode::{EncodeError, Encoder};
use crate::error::CompressionError;
use crate::format::{OutputFormat, SourceFormat};
use crate::hint::{resolve, HintProvider};
use crate::search::{compress, SearchOutcome};
use crate::target::CompressionTarget;

/// Advisory session checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Started,
    DimensionsResolved { width: u32, height: u32 },
    HintResolved { width: Option<u32> },
    SearchComplete { size: u64 },
    Finished,
}

impl Progress {
    /// Percentage shown for this checkpoint.
    pub fn percent(self) -> u8 {
        match self {
            Progress::Started => 10,
            Progress::DimensionsResolved { .. } => 30,
            Progress::HintResolved { .. } => 60,
            Progress::SearchComplete { .. } => 90,
            Progress::Finished => 100,
        }
    }
}

/// Receiver of progress checkpoints.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress);
}

impl ProgressSink for () {
    fn report(&mut self, _progress: Progress) {}
}

impl<F: FnMut(Progress)> ProgressSink for F {
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// What the hint phase fixed for the search phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPlan {
    pub target: CompressionTarget,
    /// Validated downscale width applied to every trial.
    pub width: Option<u32>,
    pub format: OutputFormat,
}

/// Check the target, detect the output format and decode an upload.
///
/// The target is checked before decoding, so an invalid target costs
/// nothing. PNG and other lossless sources become JPEG.
pub fn decode_upload(bytes: &[u8], target_bytes: u64) -> Result<(DecodedImage, OutputFormat), CompressionError> {
    CompressionTarget::new(bytes.len() as u64, target_bytes)?;

    let format = OutputFormat::for_source(SourceFormat::detect(bytes));
    let image = decode_image(bytes).map_err(EncodeError::from)?;
    Ok((image, format))
}

/// Search phase of a session: the quality bisection plus its checkpoints.
///
/// Synchronous and CPU-bound; every trial is a full encode.
pub fn run_search<E: Encoder>(
    encoder: &E,
    image: &DecodedImage,
    plan: SearchPlan,
    progress: &mut impl ProgressSink,
) -> Result<SearchOutcome, CompressionError> {
    let outcome = compress(encoder, image, plan.target, plan.width, plan.format)
        .inspect_err(|e| warn!(error = %e, "search failed"))?;
    progress.report(Progress::SearchComplete {
        size: outcome.result.size(),
    });

    info!(
        size = outcome.result.size(),
        quality = outcome.quality,
        "compression finished"
    );
    progress.report(Progress::Finished);
    Ok(outcome)
}

/// Runs compression sessions with a fixed hint provider and encoder.
///
/// Holds no per-session state; concurrent sessions on one `Compressor`
/// share nothing mutable.
#[derive(Debug, Clone)]
pub struct Compressor<P, E> {
    provider: P,
    encoder: E,
}

impl<P: HintProvider, E: Encoder> Compressor<P, E> {
    pub fn new(provider: P, encoder: E) -> Self {
        Self { provider, encoder }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Hint phase of a session: validate the target and resolve the hint.
    ///
    /// No encode runs here.
    pub async fn prepare(
        &self,
        image: &DecodedImage,
        original_bytes: u64,
        target_bytes: u64,
        format: OutputFormat,
        progress: &mut impl ProgressSink,
    ) -> Result<SearchPlan, CompressionError> {
        let target = CompressionTarget::new(original_bytes, target_bytes)?;
        progress.report(Progress::Started);

        progress.report(Progress::DimensionsResolved {
            width: image.width,
            height: image.height,
        });

        let hint = resolve(&self.provider, image, original_bytes, target_bytes, format).await?;
        progress.report(Progress::HintResolved {
            width: hint.suggested_width,
        });

        Ok(SearchPlan {
            target,
            width: hint.suggested_width,
            format,
        })
    }

    /// Compress a decoded image to `target_bytes`.
    ///
    /// `original_bytes` is the size of the uploaded file the image came from;
    /// the result is always strictly smaller than it.
    pub async fn attempt(
        &self,
        image: &DecodedImage,
        original_bytes: u64,
        target_bytes: u64,
        format: OutputFormat,
        progress: &mut impl ProgressSink,
    ) -> Result<SearchOutcome, CompressionError> {
        let span = info_span!("compression", original_bytes, target_bytes, %format);

        async {
            let plan = self
                .prepare(image, original_bytes, target_bytes, format, progress)
                .await?;
            run_search(&self.encoder, image, plan, progress)
        }
        .instrument(span)
        .await
    }

    /// Decode an uploaded file and compress it to `target_bytes`.
    ///
    /// The output format is chosen once from the detected source format.
    /// See [`decode_upload`].
    pub async fn attempt_bytes(
        &self,
        bytes: &[u8],
        target_bytes: u64,
        progress: &mut impl ProgressSink,
    ) -> Result<(SearchOutcome, OutputFormat), CompressionError> {
        let (image, format) = decode_upload(bytes, target_bytes)?;
        let outcome = self
            .attempt(&image, bytes.len() as u64, target_bytes, format, progress)
            .await?;
        Ok((outcome, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{EncodeRequest, EncodeResult, ImageCodec};
    use crate::hint::{FixedHint, HeuristicHintProvider, HintError, HintRequest, RawHint};
    use crate::search::SEARCH_ITERATIONS;
    use std::cell::{Cell, RefCell};

    struct CountingEncoder {
        calls: Cell<usize>,
        widths: RefCell<Vec<Option<u32>>>,
    }

    impl CountingEncoder {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                widths: RefCell::new(Vec::new()),
            }
        }
    }

    impl Encoder for CountingEncoder {
        fn encode(&self, request: &EncodeRequest<'_>) -> Result<EncodeResult, EncodeError> {
            self.calls.set(self.calls.get() + 1);
            self.widths.borrow_mut().push(request.target_width);
            let size = 100_000 + (request.quality * 3_000_000.0) as u64;
            Ok(EncodeResult::new(vec![0u8; size as usize]))
        }
    }

    struct UnreachableProvider {
        calls: Cell<usize>,
    }

    impl HintProvider for UnreachableProvider {
        async fn fetch_size_hint(&self, _request: &HintRequest) -> Result<RawHint, HintError> {
            self.calls.set(self.calls.get() + 1);
            Err(HintError::Request("connection refused".to_string()))
        }
    }

    fn blank_image(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(width, height, vec![0u8; (width * height * 3) as usize])
    }

    /// PNG of LCG noise, which PNG cannot compress much.
    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        use image::{ExtendedColorType, ImageEncoder};
        let mut state = 0x2545_F491_u32;
        let pixels: Vec<u8> = (0..width * height * 3)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_session_reports_checkpoints() {
        let compressor = Compressor::new(FixedHint::new(0.7, Some(50)), CountingEncoder::new());
        let mut seen = Vec::new();
        let mut sink = |p: Progress| seen.push(p.percent());

        let outcome = compressor
            .attempt(&blank_image(100, 50), 2_000_000, 500_000, OutputFormat::Jpeg, &mut sink)
            .await
            .unwrap();

        assert_eq!(seen, vec![10, 30, 60, 90, 100]);
        assert!(outcome.result.size() <= 500_000);
        assert_eq!(compressor.encoder().calls.get(), SEARCH_ITERATIONS);
        assert!(compressor
            .encoder()
            .widths
            .borrow()
            .iter()
            .all(|w| *w == Some(50)));
    }

    #[tokio::test]
    async fn test_target_equal_to_original_runs_nothing() {
        let provider = UnreachableProvider { calls: Cell::new(0) };
        let compressor = Compressor::new(provider, CountingEncoder::new());

        let result = compressor
            .attempt(&blank_image(10, 10), 2_000_000, 2_000_000, OutputFormat::Jpeg, &mut ())
            .await;

        assert!(matches!(result, Err(CompressionError::InvalidTarget { .. })));
        assert_eq!(compressor.provider().calls.get(), 0);
        assert_eq!(compressor.encoder().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_hint_failure_is_terminal() {
        let provider = UnreachableProvider { calls: Cell::new(0) };
        let compressor = Compressor::new(provider, CountingEncoder::new());
        let mut seen = Vec::new();

        let result = compressor
            .attempt(
                &blank_image(10, 10),
                2_000_000,
                500_000,
                OutputFormat::Jpeg,
                &mut |p: Progress| seen.push(p),
            )
            .await;

        assert!(matches!(result, Err(CompressionError::HintUnavailable(_))));
        assert_eq!(compressor.provider().calls.get(), 1);
        assert_eq!(compressor.encoder().calls.get(), 0);
        assert!(!seen.iter().any(|p| matches!(p, Progress::HintResolved { .. })));
    }

    #[tokio::test]
    async fn test_invalid_hint_rejected_not_clamped() {
        let compressor = Compressor::new(FixedHint::new(0.7, Some(-3)), CountingEncoder::new());
        let result = compressor
            .attempt(&blank_image(10, 10), 2_000_000, 500_000, OutputFormat::Jpeg, &mut ())
            .await;
        assert!(matches!(result, Err(CompressionError::HintUnavailable(_))));
        assert_eq!(compressor.encoder().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_upscale_hint_ignored() {
        let compressor = Compressor::new(FixedHint::new(0.7, Some(4_000)), CountingEncoder::new());
        let outcome = compressor
            .attempt(&blank_image(100, 50), 2_000_000, 500_000, OutputFormat::Jpeg, &mut ())
            .await
            .unwrap();

        assert_eq!(outcome.width, None);
        assert!(compressor.encoder().widths.borrow().iter().all(|w| w.is_none()));
    }

    #[tokio::test]
    async fn test_attempt_bytes_png_becomes_jpeg() {
        let png = noise_png(96, 64);
        let target = png.len() as u64 / 2;
        let compressor = Compressor::new(HeuristicHintProvider, ImageCodec::default());

        let (outcome, format) = compressor.attempt_bytes(&png, target, &mut ()).await.unwrap();

        assert_eq!(format, OutputFormat::Jpeg);
        assert_eq!(&outcome.result.bytes()[0..2], &[0xFF, 0xD8]);
        assert!(outcome.result.size() < png.len() as u64);
        assert_eq!(outcome.trials.len(), SEARCH_ITERATIONS);
    }

    #[tokio::test]
    async fn test_attempt_bytes_rejects_target_before_decoding() {
        let compressor = Compressor::new(HeuristicHintProvider, ImageCodec::default());
        let garbage = vec![0u8; 64];

        let result = compressor.attempt_bytes(&garbage, 64, &mut ()).await;
        assert!(matches!(result, Err(CompressionError::InvalidTarget { .. })));
    }

    #[tokio::test]
    async fn test_attempt_bytes_undecodable_is_encode_failure() {
        let compressor = Compressor::new(HeuristicHintProvider, ImageCodec::default());
        let garbage = vec![0u8; 64];

        let result = compressor.attempt_bytes(&garbage, 32, &mut ()).await;
        assert!(matches!(result, Err(CompressionError::EncodeFailure(EncodeError::Decode(_)))));
    }

    #[tokio::test]
    async fn test_prepare_then_search_matches_attempt() {
        let compressor = Compressor::new(FixedHint::new(0.7, Some(50)), CountingEncoder::new());
        let img = blank_image(100, 50);
        let mut seen = Vec::new();
        let mut sink = |p: Progress| seen.push(p.percent());

        let plan = compressor
            .prepare(&img, 2_000_000, 500_000, OutputFormat::Jpeg, &mut sink)
            .await
            .unwrap();
        assert_eq!(plan.width, Some(50));
        assert_eq!(plan.target.target_bytes(), 500_000);
        assert_eq!(compressor.encoder().calls.get(), 0);

        let outcome = run_search(compressor.encoder(), &img, plan, &mut sink).unwrap();
        assert_eq!(seen, vec![10, 30, 60, 90, 100]);
        assert_eq!(outcome.width, Some(50));
        assert_eq!(compressor.encoder().calls.get(), SEARCH_ITERATIONS);
    }

    #[test]
    fn test_decode_upload_checks_target_first() {
        let result = decode_upload(&[0u8; 16], 16);
        assert!(matches!(result, Err(CompressionError::InvalidTarget { .. })));

        let png = noise_png(8, 8);
        let (image, format) = decode_upload(&png, 10).unwrap();
        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(format, OutputFormat::Jpeg);
    }

    #[test]
    fn test_progress_percentages_increase() {
        let steps = [
            Progress::Started,
            Progress::DimensionsResolved { width: 1, height: 1 },
            Progress::HintResolved { width: None },
            Progress::SearchComplete { size: 1 },
            Progress::Finished,
        ];
        assert!(steps.windows(2).all(|w| w[0].percent() < w[1].percent()));
    }
}
