//! Session runner with an overall deadline.
//!
//! The hint phase is awaited on the runtime; the search phase runs on tokio's
//! blocking pool so the deadline can fire while trials are still encoding.

use std::time::Duration;

use anyhow::{Context, Result};
use sizefit_core::{run_search, Compressor, DecodedImage, Encoder, HintProvider, OutputFormat, Progress, SearchOutcome};
use tracing::{debug, info_span, Instrument};

fn log_progress(progress: Progress) {
    debug!(percent = progress.percent(), checkpoint = ?progress, "progress");
}

/// Run one session, giving up once `deadline` has elapsed.
///
/// A search abandoned at the deadline keeps its blocking thread until the
/// trial in flight returns; its result is dropped.
pub async fn compress_within<P, E>(
    compressor: &Compressor<P, E>,
    image: DecodedImage,
    original_bytes: u64,
    target_bytes: u64,
    format: OutputFormat,
    deadline: Duration,
) -> Result<SearchOutcome>
where
    P: HintProvider,
    E: Encoder + Clone + Send + 'static,
{
    let span = info_span!("compression", original_bytes, target_bytes, %format);

    let session = async move {
        let mut sink = log_progress;
        let plan = compressor
            .prepare(&image, original_bytes, target_bytes, format, &mut sink)
            .await?;

        let encoder = compressor.encoder().clone();
        let outcome = tokio::task::spawn_blocking(move || run_search(&encoder, &image, plan, &mut sink))
            .await
            .context("search task failed")??;
        Ok::<_, anyhow::Error>(outcome)
    }
    .instrument(span);

    tokio::time::timeout(deadline, session)
        .await
        .with_context(|| format!("gave up after {}s", deadline.as_secs_f64()))?
}
