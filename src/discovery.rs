//! Discovery: walk a revealable list and collect cheap-filtered candidates.
//!
//! The stage drives one [`PageSource`] through a small state machine:
//!
//! ```text
//! Loading ──> Extracting ──> Revealing ──> Extracting ──> ... ──> Stopped
//! ```
//!
//! - **Loading** waits (bounded by `load_timeout`) for the list to appear. Any
//!   failure here aborts the run.
//! - **Extracting** reads the materialized items and evaluates each unseen one
//!   against filters in increasing cost order: key, recency label, coarse age,
//!   duration band.
//! - **Revealing** asks for more content, waits `reveal_pause`, and compares the
//!   height signal to detect stalls.
//!
//! The run stops after `stall_limit` consecutive steps without growth, after
//! `max_reveals` steps, or as soon as an item at or beyond the age boundary is
//! seen (when `early_stop` is on; the list is assumed newest-first).

use crate::config::Config;
use crate::error::DiscoveryError;
use crate::models::{CandidateRef, RenderedItem};
use crate::sources::PageSource;
use crate::timing::{RelativeAge, coarse_within_age, parse_duration};
use std::collections::HashSet;
use std::fmt;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

/// Why discovery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An item at or beyond the age window was reached.
    AgeBoundary,
    /// The height signal did not change for `stall_limit` reveal steps.
    Stalled,
    /// `max_reveals` reveal steps were spent.
    MaxReveals,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::AgeBoundary => "age_boundary",
            StopReason::Stalled => "stalled",
            StopReason::MaxReveals => "max_reveals",
        })
    }
}

/// Mutable state owned by one discovery run.
#[derive(Debug, Default)]
pub struct DiscoveryState {
    seen: HashSet<String>,
    candidates: Vec<CandidateRef>,
    stop: bool,
}

impl DiscoveryState {
    pub fn candidates(&self) -> &[CandidateRef] {
        &self.candidates
    }

    pub fn is_stopped(&self) -> bool {
        self.stop
    }

    /// Finish the run: deduplicate by key, last write wins.
    pub fn into_candidates(self) -> Vec<CandidateRef> {
        dedup_last_wins(self.candidates)
    }
}

/// Result of a completed discovery run.
#[derive(Debug)]
pub struct DiscoveryOutcome {
    pub candidates: Vec<CandidateRef>,
    pub stop_reason: StopReason,
    pub reveals: usize,
}

/// Why a single rendered item was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Skip {
    NoLink,
    NoKey,
    Seen,
    NoRecency,
    UnparsedRecency(String),
    /// At or beyond the window; halts extraction when early stop is on.
    Boundary(String),
    TooOld(String),
    Duration(u64),
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Loading,
    Extracting,
    Revealing,
    Stopped(StopReason),
}

/// Evaluate one rendered item against the cheap filters.
fn admit(
    item: &RenderedItem,
    seen: &HashSet<String>,
    config: &Config,
) -> Result<CandidateRef, Skip> {
    let href = item.href.as_deref().ok_or(Skip::NoLink)?;
    let locator = config.target.join(href).map_err(|_| Skip::NoLink)?;
    let label = item.recency_label.as_deref().ok_or(Skip::NoRecency)?;
    let candidate = CandidateRef::new(&locator, label).ok_or(Skip::NoKey)?;
    if seen.contains(&candidate.key) {
        return Err(Skip::Seen);
    }

    let age = RelativeAge::parse(label).ok_or_else(|| Skip::UnparsedRecency(label.to_string()))?;
    if config.early_stop && age.is_beyond(config.max_age) {
        return Err(Skip::Boundary(label.to_string()));
    }
    if !coarse_within_age(&age, config.max_age) {
        return Err(Skip::TooOld(label.to_string()));
    }

    let seconds = parse_duration(item.duration_label.as_deref().unwrap_or_default());
    if seconds < config.min_seconds || seconds > config.max_seconds {
        return Err(Skip::Duration(seconds));
    }
    Ok(candidate)
}

/// Run one extraction pass over the rendered items. Returns the number of
/// new candidates.
pub fn extract(items: &[RenderedItem], state: &mut DiscoveryState, config: &Config) -> usize {
    let mut added = 0;
    for item in items {
        if state.stop {
            break;
        }
        match admit(item, &state.seen, config) {
            Ok(candidate) => {
                debug!(key = %candidate.key, "Accepted candidate");
                state.seen.insert(candidate.key.clone());
                state.candidates.push(candidate);
                added += 1;
            }
            Err(Skip::Boundary(label)) => {
                info!(%label, "Reached age boundary; stopping discovery");
                state.stop = true;
            }
            Err(Skip::Seen) => {}
            Err(skip) => debug!(?skip, href = ?item.href, "Skipped item"),
        }
    }
    added
}

/// Drive `page` until a stop condition and return the deduplicated candidates.
#[instrument(level = "info", skip_all, fields(target = %config.target))]
pub async fn discover<P: PageSource>(
    page: &mut P,
    config: &Config,
) -> Result<DiscoveryOutcome, DiscoveryError> {
    let mut state = DiscoveryState::default();
    let mut phase = Phase::Loading;
    let mut reveals = 0usize;
    let mut stalled = 0usize;

    let stop_reason = loop {
        phase = match phase {
            Phase::Loading => {
                timeout(config.load_timeout, page.open(config.target.as_str()))
                    .await
                    .map_err(|_| DiscoveryError::LoadTimeout(config.load_timeout))??;
                info!(height = page.content_height(), "List container present");
                Phase::Extracting
            }
            Phase::Extracting => {
                let added = extract(&page.rendered_items(), &mut state, config);
                info!(
                    step = reveals,
                    added,
                    total = state.candidates.len(),
                    height = page.content_height(),
                    "Extraction pass complete"
                );
                if state.stop {
                    Phase::Stopped(StopReason::AgeBoundary)
                } else if stalled >= config.stall_limit {
                    Phase::Stopped(StopReason::Stalled)
                } else if reveals >= config.max_reveals {
                    Phase::Stopped(StopReason::MaxReveals)
                } else {
                    Phase::Revealing
                }
            }
            Phase::Revealing => {
                reveals += 1;
                let before = page.content_height();
                match timeout(config.reveal_timeout, page.reveal_more()).await {
                    Err(_) => warn!(step = reveals, "Reveal step timed out"),
                    Ok(Err(e)) if e.is_fatal() => return Err(e),
                    Ok(Err(e)) => warn!(step = reveals, error = %e, "Reveal step failed"),
                    Ok(Ok(())) => {}
                }
                sleep(config.reveal_pause).await;

                let after = page.content_height();
                if after == before {
                    stalled += 1;
                    debug!(step = reveals, stalled, "No growth after reveal");
                } else {
                    stalled = 0;
                }
                Phase::Extracting
            }
            Phase::Stopped(reason) => break reason,
        };
    };

    let candidates = state.into_candidates();
    info!(
        candidates = candidates.len(),
        reveals,
        stop_reason = %stop_reason,
        "Discovery finished"
    );
    Ok(DiscoveryOutcome {
        candidates,
        stop_reason,
        reveals,
    })
}

/// Keep one candidate per key: the last one written, at its own position.
fn dedup_last_wins(candidates: Vec<CandidateRef>) -> Vec<CandidateRef> {
    let mut seen = HashSet::new();
    let mut kept: Vec<CandidateRef> = candidates
        .into_iter()
        .rev()
        .filter(|c| seen.insert(c.key.clone()))
        .collect();
    kept.reverse();
    kept
}
