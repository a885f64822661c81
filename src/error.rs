//! Error taxonomy for the harvesting pipeline.
//!
//! Errors fall into three groups:
//!
//! - [`DiscoveryError`]: page-source failures. Load and navigation failures are
//!   fatal and abort the run; reveal failures only count as a stalled step.
//! - [`MetadataError`]: per-candidate fetch failures. The candidate is dropped
//!   and the run continues.
//! - [`ConfigError`]: invalid run parameters, reported before any network I/O.
//!
//! [`DropReason`] is not an error: it names why Enrichment discarded an item so
//! the run summary can count drops per cause.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failures raised by a page source while discovering candidates.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The list container did not become present before the load timeout.
    #[error("page content did not load within {0:?}")]
    LoadTimeout(Duration),
    /// The page could not be requested at all.
    #[error("navigation to {locator} failed: {message}")]
    Navigation { locator: String, message: String },
    /// The page loaded but carried no recognizable list container.
    #[error("no video list found on {0}")]
    ContentMissing(String),
    /// A single reveal step failed; the discovery loop treats it as no growth.
    #[error("reveal step failed: {0}")]
    Reveal(String),
}

impl DiscoveryError {
    /// Whether the error ends the run (as opposed to a skipped reveal step).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DiscoveryError::Reveal(_))
    }
}

/// Failures fetching the authoritative metadata for one candidate.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("video not found: {0}")]
    NotFound(String),
    #[error("transient fetch failure: {0}")]
    Transient(String),
    #[error("metadata format changed: {0}")]
    FormatChanged(String),
    #[error("metadata fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
                MetadataError::NotFound(e.to_string())
            }
            _ => MetadataError::Transient(e.to_string()),
        }
    }
}

/// Invalid or unreadable run parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unknown channel selector '{0}' (expected ytn, kbs or sbs)")]
    UnknownChannel(String),
    #[error("invalid target url '{0}'")]
    InvalidTarget(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Why Enrichment discarded a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropReason {
    /// Metadata could not be fetched or parsed.
    Fetch,
    /// The precise upload instant is outside the age window.
    TooOld,
    /// No upload instant and the run is configured to exclude such items.
    MissingInstant,
    /// The authoritative length is outside the duration band.
    Duration,
    /// Title and description were both classified as a non-target language.
    ForeignLanguage,
    /// Text processing failed for this item.
    Processing,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::Fetch => "fetch_failed",
            DropReason::TooOld => "too_old",
            DropReason::MissingInstant => "missing_upload_instant",
            DropReason::Duration => "out_of_duration_band",
            DropReason::ForeignLanguage => "foreign_language",
            DropReason::Processing => "processing_failed",
        };
        f.write_str(s)
    }
}
