//! Run configuration.
//!
//! A [`Config`] is resolved once at start-up from three layers, highest
//! precedence first:
//!
//! 1. command-line flags and `HARVEST_*` environment variables ([`Cli`])
//! 2. an optional YAML file (`--config harvest.yaml`, [`ConfigFile`])
//! 3. built-in defaults ([`Config::for_channel`])
//!
//! and is immutable for the rest of the run.
//!
//! # Example file
//!
//! ```yaml
//! channel: ytn
//! max_age_hours: 12
//! workers: 4
//! missing_instant: drop
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::lang::LanguageCode;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const CHANNEL_ORIGIN: &str = "https://www.youtube.com";

/// Supported broadcaster channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Ytn,
    Kbs,
    Sbs,
}

impl Channel {
    pub fn handle(self) -> &'static str {
        match self {
            Channel::Ytn => "@ytnnews24",
            Channel::Kbs => "@newskbs",
            Channel::Sbs => "@sbsnews8",
        }
    }

    /// Default output file name for the channel's dataset.
    pub fn file_name(self) -> &'static str {
        match self {
            Channel::Ytn => "YTN_VIDEO_DATA.json",
            Channel::Kbs => "KBS_VIDEO_DATA.json",
            Channel::Sbs => "SBS_VIDEO_DATA.json",
        }
    }

    /// The channel's `/videos` tab.
    pub fn videos_url(self) -> Result<Url, ConfigError> {
        let raw = format!("{CHANNEL_ORIGIN}/{}/videos", self.handle());
        Url::parse(&raw).map_err(|_| ConfigError::InvalidTarget(raw))
    }
}

impl FromStr for Channel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ytn" => Ok(Channel::Ytn),
            "kbs" => Ok(Channel::Kbs),
            "sbs" => Ok(Channel::Sbs),
            other => Err(ConfigError::UnknownChannel(other.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Ytn => "ytn",
            Channel::Kbs => "kbs",
            Channel::Sbs => "sbs",
        })
    }
}

/// What Enrichment does with a video that has no upload instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingInstantPolicy {
    /// Pass the item through unfiltered on age, with a warning.
    #[default]
    Keep,
    /// Drop the item.
    Drop,
}

/// Which description rendition goes into `cleaned_description`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    /// Boilerplate-free prose (`clean_body`).
    #[default]
    Clean,
    /// Space-joined content tokens (`tokenize_for_vector`).
    Tokens,
}

/// Values accepted from a YAML config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub channel: Option<String>,
    pub target_url: Option<String>,
    pub output_dir: Option<String>,
    pub output_file: Option<String>,
    pub min_seconds: Option<u64>,
    pub max_seconds: Option<u64>,
    pub max_age_hours: Option<u64>,
    pub reveal_pause_secs: Option<u64>,
    pub max_reveals: Option<usize>,
    pub stall_limit: Option<usize>,
    pub load_timeout_secs: Option<u64>,
    pub reveal_timeout_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub workers: Option<usize>,
    pub early_stop: Option<bool>,
    pub missing_instant: Option<MissingInstantPolicy>,
    pub body_mode: Option<BodyMode>,
    pub target_language: Option<LanguageCode>,
}

impl ConfigFile {
    /// Read and parse a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }
}

/// Immutable parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub channel: Channel,
    /// The list page Discovery walks.
    pub target: Url,
    pub output_dir: String,
    pub output_file: String,
    pub min_seconds: u64,
    pub max_seconds: u64,
    pub max_age: Duration,
    pub reveal_pause: Duration,
    pub max_reveals: usize,
    pub stall_limit: usize,
    pub load_timeout: Duration,
    pub reveal_timeout: Duration,
    pub fetch_timeout: Duration,
    pub workers: usize,
    /// Stop discovery at the first item past the age boundary.
    pub early_stop: bool,
    pub missing_instant: MissingInstantPolicy,
    pub body_mode: BodyMode,
    pub target_language: LanguageCode,
}

impl Config {
    /// Built-in defaults for `channel`, taken from the production harvest runs.
    pub fn for_channel(channel: Channel) -> Result<Self, ConfigError> {
        Ok(Self {
            channel,
            target: channel.videos_url()?,
            output_dir: ".".to_string(),
            output_file: channel.file_name().to_string(),
            min_seconds: 60,
            max_seconds: 300,
            max_age: Duration::from_secs(24 * 3600),
            reveal_pause: Duration::from_secs(3),
            max_reveals: 500,
            stall_limit: 3,
            load_timeout: Duration::from_secs(30),
            reveal_timeout: Duration::from_secs(15),
            fetch_timeout: Duration::from_secs(30),
            workers: num_cpus::get().max(1),
            early_stop: true,
            missing_instant: MissingInstantPolicy::Keep,
            body_mode: BodyMode::Clean,
            target_language: LanguageCode::Ko,
        })
    }

    /// Resolve CLI flags over the optional config file over defaults.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => {
                info!(%path, "Loading config file");
                ConfigFile::load(path)?
            }
            None => ConfigFile::default(),
        };
        let config = Self::merge(cli, &file)?;
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    fn merge(cli: &Cli, file: &ConfigFile) -> Result<Self, ConfigError> {
        let secs = |cli: Option<u64>, file: Option<u64>, default: Duration| {
            cli.or(file).map_or(default, Duration::from_secs)
        };

        let channel = match cli.channel.as_deref().or(file.channel.as_deref()) {
            Some(s) => s.parse()?,
            None => Channel::Kbs,
        };
        let defaults = Config::for_channel(channel)?;
        let target = match cli.target_url.as_deref().or(file.target_url.as_deref()) {
            Some(raw) => Url::parse(raw).map_err(|_| ConfigError::InvalidTarget(raw.to_string()))?,
            None => defaults.target,
        };
        let output_file = cli
            .output_file
            .clone()
            .or_else(|| file.output_file.clone())
            .unwrap_or(defaults.output_file);

        Ok(Self {
            channel,
            target,
            output_dir: cli
                .output_dir
                .clone()
                .or_else(|| file.output_dir.clone())
                .unwrap_or(defaults.output_dir),
            output_file,
            min_seconds: cli.min_seconds.or(file.min_seconds).unwrap_or(defaults.min_seconds),
            max_seconds: cli.max_seconds.or(file.max_seconds).unwrap_or(defaults.max_seconds),
            max_age: cli
                .max_age_hours
                .or(file.max_age_hours)
                .map_or(defaults.max_age, |h| Duration::from_secs(h.saturating_mul(3600))),
            reveal_pause: secs(cli.reveal_pause_secs, file.reveal_pause_secs, defaults.reveal_pause),
            max_reveals: cli.max_reveals.or(file.max_reveals).unwrap_or(defaults.max_reveals),
            stall_limit: cli.stall_limit.or(file.stall_limit).unwrap_or(defaults.stall_limit),
            load_timeout: secs(cli.load_timeout_secs, file.load_timeout_secs, defaults.load_timeout),
            reveal_timeout: secs(
                cli.reveal_timeout_secs,
                file.reveal_timeout_secs,
                defaults.reveal_timeout,
            ),
            fetch_timeout: secs(cli.fetch_timeout_secs, file.fetch_timeout_secs, defaults.fetch_timeout),
            workers: cli.workers.or(file.workers).unwrap_or(defaults.workers),
            early_stop: if cli.no_early_stop {
                false
            } else {
                file.early_stop.unwrap_or(defaults.early_stop)
            },
            missing_instant: cli
                .missing_instant
                .or(file.missing_instant)
                .unwrap_or(defaults.missing_instant),
            body_mode: cli.body_mode.or(file.body_mode).unwrap_or(defaults.body_mode),
            target_language: cli
                .target_language
                .or(file.target_language)
                .unwrap_or(defaults.target_language),
        })
    }

    /// Reject parameter combinations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_seconds > self.max_seconds {
            return Err(ConfigError::Invalid(format!(
                "min_seconds ({}) exceeds max_seconds ({})",
                self.min_seconds, self.max_seconds
            )));
        }
        if self.max_age.is_zero() {
            return Err(ConfigError::Invalid("max_age must be positive".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.stall_limit == 0 {
            return Err(ConfigError::Invalid("stall_limit must be at least 1".into()));
        }
        Ok(())
    }
}
