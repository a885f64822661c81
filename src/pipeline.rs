//! Pipeline driver: Discovery, then Enrichment, then Aggregation.
//!
//! The driver owns the resolved [`Config`] and the external collaborators.
//! A fatal Discovery error aborts the whole run; everything after Discovery
//! only ever drops individual items.

use crate::aggregate::aggregate;
use crate::config::Config;
use crate::discovery::{StopReason, discover};
use crate::enrichment::Enrichment;
use crate::error::{DiscoveryError, DropReason};
use crate::lang::{LanguageClassifier, LinguaClassifier};
use crate::models::EnrichedRecord;
use crate::sources::{MetadataSource, PageSource};
use crate::text::{SegmenterFactory, default_segmenter_factory};
use crate::timing::now_canonical;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Counters describing one completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub candidates: usize,
    pub reveals: usize,
    pub stop_reason: StopReason,
    pub records: usize,
    pub drops: BTreeMap<DropReason, usize>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn dropped(&self) -> usize {
        self.drops.values().sum()
    }
}

/// Final records plus the run summary.
#[derive(Debug)]
pub struct RunOutcome {
    pub records: Vec<EnrichedRecord>,
    pub summary: RunSummary,
}

/// A configured harvest run over a page source and a metadata source.
pub struct Pipeline<P, M> {
    config: Arc<Config>,
    page: P,
    metadata: M,
    classifier: Arc<dyn LanguageClassifier>,
    segmenters: SegmenterFactory,
}

impl<P: PageSource, M: MetadataSource> Pipeline<P, M> {
    /// Build a pipeline with the default classifier and segmenter.
    pub fn new(config: Config, page: P, metadata: M) -> Self {
        Self {
            config: Arc::new(config),
            page,
            metadata,
            classifier: Arc::new(LinguaClassifier),
            segmenters: default_segmenter_factory(),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn LanguageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_segmenters(mut self, segmenters: SegmenterFactory) -> Self {
        self.segmenters = segmenters;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run all three stages.
    #[instrument(level = "info", skip_all, fields(target = %self.config.target))]
    pub async fn run(mut self) -> Result<RunOutcome, DiscoveryError> {
        let start = Instant::now();

        let discovery = discover(&mut self.page, &self.config).await?;

        let enrichment = Enrichment {
            config: Arc::clone(&self.config),
            classifier: Arc::clone(&self.classifier),
            segmenters: Arc::clone(&self.segmenters),
            now: now_canonical(),
        };
        let enriched = enrichment
            .enrich_all(&self.metadata, &discovery.candidates)
            .await;

        let records = aggregate(enriched.results);
        let summary = RunSummary {
            candidates: discovery.candidates.len(),
            reveals: discovery.reveals,
            stop_reason: discovery.stop_reason,
            records: records.len(),
            drops: enriched.drops,
            elapsed: start.elapsed(),
        };
        info!(
            candidates = summary.candidates,
            records = summary.records,
            dropped = summary.dropped(),
            stop_reason = %summary.stop_reason,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Pipeline run complete"
        );

        Ok(RunOutcome { records, summary })
    }
}
