//! # News Shorts Harvester
//!
//! Command-line entry point: resolves configuration, runs the harvest
//! pipeline against the live channel, and writes the dataset.
//!
//! ## Usage
//!
//! ```sh
//! news_shorts_harvester --channel kbs -o ./data
//! ```
//!
//! Exits non-zero when Discovery fails fatally or the dataset cannot be
//! written; the run summary is logged either way.

use clap::Parser;
use news_shorts_harvester::cli::Cli;
use news_shorts_harvester::config::Config;
use news_shorts_harvester::outputs::json;
use news_shorts_harvester::pipeline::Pipeline;
use news_shorts_harvester::sources::{ChannelPage, WatchPageSource};
use news_shorts_harvester::utils::ensure_writable_dir;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_shorts_harvester starting up");

    // Parse CLI and resolve configuration
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let config = Config::resolve(&args)?;
    info!(
        channel = %config.channel,
        target = %config.target,
        min_seconds = config.min_seconds,
        max_seconds = config.max_seconds,
        max_age_hours = config.max_age.as_secs() / 3600,
        workers = config.workers,
        "Configuration resolved"
    );

    // Early check: output dir writability is only a warning, the run can
    // still report its records
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        warn!(
            path = %config.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
    }

    let output_dir = config.output_dir.clone();
    let output_file = config.output_file.clone();
    let pipeline = Pipeline::new(config, ChannelPage::new()?, WatchPageSource::new()?);

    let outcome = match pipeline.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, elapsed = ?start_time.elapsed(), "Discovery failed; aborting run with no records");
            return Err(e.into());
        }
    };

    for (reason, count) in &outcome.summary.drops {
        info!(%reason, count, "Dropped candidates");
    }

    let write_result = json::write_records(&outcome.records, &output_dir, &output_file).await;
    if let Err(ref e) = write_result {
        error!(error = %e, records = outcome.records.len(), "Failed to write dataset");
    }

    let elapsed = start_time.elapsed();
    info!(
        candidates = outcome.summary.candidates,
        records = outcome.summary.records,
        dropped = outcome.summary.dropped(),
        stop_reason = %outcome.summary.stop_reason,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    write_result.map(|path| debug!(path = %path.display(), "Dataset path"))
}
