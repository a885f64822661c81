//! Command-line interface definitions.
//!
//! Every option can also come from a `HARVEST_*` environment variable or the
//! YAML file named by `--config`; see [`crate::config`] for precedence.

use crate::config::{BodyMode, MissingInstantPolicy};
use crate::lang::LanguageCode;
use clap::Parser;

/// Harvest recent short news videos from a broadcaster channel.
///
/// # Examples
///
/// ```sh
/// # Last 24 hours of KBS videos between 1 and 5 minutes long
/// news_shorts_harvester -o ./data
///
/// # YTN, last 12 hours, four workers, token output for vectorization
/// news_shorts_harvester --channel ytn --max-age-hours 12 -w 4 --body-mode tokens
///
/// # Everything from a config file, overriding one value
/// news_shorts_harvester --config harvest.yaml --no-early-stop
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "HARVEST_CONFIG")]
    pub config: Option<String>,

    /// Channel selector: ytn, kbs or sbs
    #[arg(long, env = "HARVEST_CHANNEL")]
    pub channel: Option<String>,

    /// Explicit list page URL, overriding the channel's videos tab
    #[arg(long, env = "HARVEST_TARGET_URL")]
    pub target_url: Option<String>,

    /// Output directory for the JSON dataset
    #[arg(short, long, env = "HARVEST_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Output file name (defaults to the channel's dataset name)
    #[arg(long, env = "HARVEST_OUTPUT_FILE")]
    pub output_file: Option<String>,

    /// Shortest accepted video, in seconds
    #[arg(long, env = "HARVEST_MIN_SECONDS")]
    pub min_seconds: Option<u64>,

    /// Longest accepted video, in seconds
    #[arg(long, env = "HARVEST_MAX_SECONDS")]
    pub max_seconds: Option<u64>,

    /// Recency window, in hours
    #[arg(long, env = "HARVEST_MAX_AGE_HOURS")]
    pub max_age_hours: Option<u64>,

    /// Pause after each reveal step, in seconds
    #[arg(long, env = "HARVEST_REVEAL_PAUSE_SECS")]
    pub reveal_pause_secs: Option<u64>,

    /// Maximum number of reveal steps
    #[arg(long, env = "HARVEST_MAX_REVEALS")]
    pub max_reveals: Option<usize>,

    /// Consecutive reveal steps without growth before discovery stops
    #[arg(long, env = "HARVEST_STALL_LIMIT")]
    pub stall_limit: Option<usize>,

    /// Initial page-load timeout, in seconds
    #[arg(long, env = "HARVEST_LOAD_TIMEOUT_SECS")]
    pub load_timeout_secs: Option<u64>,

    /// Per-reveal-step settle timeout, in seconds
    #[arg(long, env = "HARVEST_REVEAL_TIMEOUT_SECS")]
    pub reveal_timeout_secs: Option<u64>,

    /// Per-candidate metadata fetch timeout, in seconds
    #[arg(long, env = "HARVEST_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Concurrent enrichment workers (defaults to the number of CPUs)
    #[arg(short, long, env = "HARVEST_WORKERS")]
    pub workers: Option<usize>,

    /// Keep scanning past items older than the window
    #[arg(long)]
    pub no_early_stop: bool,

    /// What to do with videos that have no upload instant
    #[arg(long, value_enum, env = "HARVEST_MISSING_INSTANT")]
    pub missing_instant: Option<MissingInstantPolicy>,

    /// Rendition stored as cleaned_description
    #[arg(long, value_enum, env = "HARVEST_BODY_MODE")]
    pub body_mode: Option<BodyMode>,

    /// Language kept by the language filter
    #[arg(long, value_enum, env = "HARVEST_TARGET_LANGUAGE")]
    pub target_language: Option<LanguageCode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(&[
            "news_shorts_harvester",
            "--channel",
            "sbs",
            "--output-dir",
            "./data",
            "--max-age-hours",
            "12",
        ]);

        assert_eq!(cli.channel.as_deref(), Some("sbs"));
        assert_eq!(cli.output_dir.as_deref(), Some("./data"));
        assert_eq!(cli.max_age_hours, Some(12));
        assert!(!cli.no_early_stop);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(&["news_shorts_harvester", "-o", "/tmp/out", "-w", "4", "-c", "h.yaml"]);

        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/out"));
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.config.as_deref(), Some("h.yaml"));
    }

    #[test]
    fn test_cli_policies() {
        let cli = Cli::parse_from(&[
            "news_shorts_harvester",
            "--missing-instant",
            "drop",
            "--body-mode",
            "tokens",
            "--target-language",
            "en",
            "--no-early-stop",
        ]);

        assert_eq!(cli.missing_instant, Some(MissingInstantPolicy::Drop));
        assert_eq!(cli.body_mode, Some(BodyMode::Tokens));
        assert_eq!(cli.target_language, Some(LanguageCode::En));
        assert!(cli.no_early_stop);
    }
}
