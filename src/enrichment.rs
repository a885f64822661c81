//! Enrichment: fetch authoritative metadata per candidate and build records.
//!
//! Every candidate is processed independently with at most `workers` in
//! flight. For each one:
//!
//! 1. fetch metadata (bounded by `fetch_timeout`, no retries)
//! 2. duration band re-check against the authoritative length, when known
//! 3. precise age check against the upload instant, or apply the
//!    missing-instant policy when the source has none
//! 4. language filter over title and description
//! 5. text cleaning on the blocking pool, with a segmenter built for this
//!    item alone
//!
//! Any failure drops that candidate only; the outcome of the others is
//! unaffected. Records are either fully populated or absent.

use crate::config::{BodyMode, Config, MissingInstantPolicy};
use crate::error::{DropReason, MetadataError};
use crate::lang::{LanguageClassifier, is_foreign};
use crate::models::{CandidateRef, EnrichedRecord, VideoMetadata};
use crate::sources::MetadataSource;
use crate::text::{SegmenterFactory, clean_body, clean_title, tokenize_for_vector};
use crate::timing::precise_within_age;
use chrono::{DateTime, FixedOffset};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::pin::pin;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Shared, read-only inputs for one enrichment run.
#[derive(Clone)]
pub struct Enrichment {
    pub config: Arc<Config>,
    pub classifier: Arc<dyn LanguageClassifier>,
    pub segmenters: SegmenterFactory,
    /// Reference instant for every age check in this run.
    pub now: DateTime<FixedOffset>,
}

/// Records that survived enrichment plus drop counts per reason.
#[derive(Debug, Default)]
pub struct EnrichmentOutcome {
    /// In completion order; one entry per candidate, `None` when dropped.
    pub results: Vec<Option<EnrichedRecord>>,
    pub drops: BTreeMap<DropReason, usize>,
}

impl EnrichmentOutcome {
    pub fn kept(&self) -> usize {
        self.results.iter().flatten().count()
    }

    pub fn dropped(&self) -> usize {
        self.drops.values().sum()
    }
}

impl Enrichment {
    /// Enrich one candidate, or name why it was dropped.
    #[instrument(level = "debug", skip_all, fields(locator = %candidate.locator))]
    pub async fn enrich<M: MetadataSource>(
        &self,
        source: &M,
        candidate: &CandidateRef,
    ) -> Result<EnrichedRecord, DropReason> {
        let metadata = timeout(self.config.fetch_timeout, source.fetch(&candidate.locator))
            .await
            .unwrap_or(Err(MetadataError::Timeout(self.config.fetch_timeout)))
            .map_err(|e| {
                warn!(locator = %candidate.locator, error = %e, "Metadata fetch failed");
                DropReason::Fetch
            })?;

        if let Some(secs) = metadata.length_seconds {
            if !(self.config.min_seconds..=self.config.max_seconds).contains(&secs) {
                debug!(locator = %candidate.locator, secs, "Length is outside the duration band");
                return Err(DropReason::Duration);
            }
        }

        match metadata.upload_instant {
            Some(instant) if !precise_within_age(&instant, &self.now, self.config.max_age) => {
                debug!(locator = %candidate.locator, %instant, "Upload is outside the age window");
                return Err(DropReason::TooOld);
            }
            Some(_) => {}
            None => match self.config.missing_instant {
                MissingInstantPolicy::Keep => {
                    warn!(locator = %candidate.locator, "No upload instant; keeping unfiltered");
                }
                MissingInstantPolicy::Drop => return Err(DropReason::MissingInstant),
            },
        }

        if is_foreign(
            self.classifier.as_ref(),
            &metadata.title,
            &metadata.description,
            self.config.target_language,
        ) {
            return Err(DropReason::ForeignLanguage);
        }

        let (cleaned_title, cleaned_description) = self.clean_text(&metadata).await.map_err(|e| {
            error!(locator = %candidate.locator, error = %e, "Text processing failed");
            DropReason::Processing
        })?;

        Ok(EnrichedRecord {
            key: candidate.key.clone(),
            locator: metadata
                .webpage_url
                .unwrap_or_else(|| candidate.locator.clone()),
            raw_title: metadata.title,
            cleaned_title,
            raw_description: metadata.description,
            cleaned_description,
            upload_instant: metadata.upload_instant,
            thumbnail_locator: metadata.thumbnail,
            view_count: metadata.view_count,
            id: None,
        })
    }

    /// Run the cleaners on the blocking pool. A panic inside surfaces as the
    /// join error.
    async fn clean_text(
        &self,
        metadata: &VideoMetadata,
    ) -> Result<(String, String), tokio::task::JoinError> {
        let title = metadata.title.clone();
        let description = metadata.description.clone();
        let body_mode = self.config.body_mode;
        let segmenters = Arc::clone(&self.segmenters);

        tokio::task::spawn_blocking(move || {
            let cleaned_title = clean_title(&title);
            let cleaned_description = match body_mode {
                BodyMode::Clean => clean_body(&description),
                BodyMode::Tokens => {
                    let mut segmenter = segmenters();
                    tokenize_for_vector(&description, segmenter.as_mut())
                }
            };
            (cleaned_title, cleaned_description)
        })
        .await
    }

    /// Enrich all candidates with bounded concurrency.
    #[instrument(level = "info", skip_all, fields(candidates = candidates.len(), workers = self.config.workers))]
    pub async fn enrich_all<M: MetadataSource>(
        &self,
        source: &M,
        candidates: &[CandidateRef],
    ) -> EnrichmentOutcome {
        let total = candidates.len();
        let mut outcome = EnrichmentOutcome::default();

        let mut completions = pin!(
            stream::iter(candidates)
                .map(|candidate| async move {
                    (candidate, self.enrich(source, candidate).await)
                })
                .buffer_unordered(self.config.workers.max(1))
        );

        while let Some((candidate, result)) = completions.next().await {
            match result {
                Ok(record) => {
                    outcome.results.push(Some(record));
                }
                Err(reason) => {
                    info!(locator = %candidate.locator, %reason, "Dropped candidate");
                    *outcome.drops.entry(reason).or_default() += 1;
                    outcome.results.push(None);
                }
            }
            info!(
                done = outcome.results.len(),
                total,
                kept = outcome.kept(),
                "Enrichment progress"
            );
        }

        outcome
    }
}
