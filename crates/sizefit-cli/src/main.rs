//! sizefit CLI
//!
//! Recompress an image so it fits under a target file size.

mod backend;
mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use sizefit_core::{decode_upload, Compressor, HintSource, ImageCodec, OutputFormat, SizefitConfig, TargetSize};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use backend::HintBackend;
use session::compress_within;

#[derive(Parser, Debug)]
#[command(name = "sizefit")]
#[command(about = "Recompress an image to fit under a target file size")]
#[command(version)]
struct Cli {
    /// Image to compress (JPEG, PNG, WebP, ...)
    input: PathBuf,

    /// Target size, e.g. 500KB, 1.5MB or 900B (bare numbers are KB)
    #[arg(short, long)]
    target: TargetSize,

    /// Output path [default: <input>-compressed.<ext>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where the compression hint comes from: gemini or heuristic
    #[arg(long = "hint", env = "SIZEFIT_HINT_SOURCE")]
    hint_source: Option<HintSource>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "SIZEFIT_MODEL")]
    model: Option<String>,

    /// Timeout for the hint request, in seconds
    #[arg(long, env = "SIZEFIT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Give up on the whole session after this many seconds
    #[arg(long, env = "SIZEFIT_DEADLINE_SECS", default_value_t = 120)]
    deadline_secs: u64,

    /// Increase output verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Environment config with flag overrides applied.
    fn config(&self) -> SizefitConfig {
        let mut config = SizefitConfig::from_env();
        if let Some(source) = self.hint_source {
            config.hint_source = source;
        }
        if let Some(key) = &self.api_key {
            config.gemini.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            config.gemini.model = model.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.gemini.timeout_secs = secs;
        }
        config
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// `photos/cat.png` -> `photos/cat-compressed.jpg`
fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}-compressed.{}", format.extension()))
}

fn kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let result = runtime.block_on(run(cli));
    // Do not wait on a search abandoned at the deadline.
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let bytes = std::fs::read(&cli.input).with_context(|| format!("failed to read {}", cli.input.display()))?;
    let target_bytes = cli.target.to_bytes();
    if target_bytes == 0 {
        bail!("target size must be greater than 0");
    }

    let backend = HintBackend::from_config(&cli.config()).context("failed to set up hint provider")?;
    info!(
        input = %cli.input.display(),
        original_kb = kb(bytes.len() as u64),
        target_kb = kb(target_bytes),
        hint = backend.name(),
        "compressing"
    );

    let (image, format) = decode_upload(&bytes, target_bytes)?;
    let compressor = Compressor::new(backend, ImageCodec::default());
    let outcome = compress_within(
        &compressor,
        image,
        bytes.len() as u64,
        target_bytes,
        format,
        Duration::from_secs(cli.deadline_secs),
    )
    .await?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, format));
    std::fs::write(&output, outcome.result.bytes()).with_context(|| format!("failed to write {}", output.display()))?;

    if !outcome.within_target {
        warn!("no trial fit under the target; wrote the closest result");
    }
    println!(
        "{} -> {}: {:.2} KB -> {:.2} KB (quality {:.2}{})",
        cli.input.display(),
        output.display(),
        kb(bytes.len() as u64),
        kb(outcome.result.size()),
        outcome.quality,
        outcome.width.map(|w| format!(", width {w}px")).unwrap_or_default(),
    );

    Ok(())
}
