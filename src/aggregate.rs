//! Final merge, ordering and id assignment.

use crate::models::EnrichedRecord;
use itertools::Itertools;
use tracing::debug;

/// Merge enrichment results into the final ordered dataset.
///
/// Drops `None` entries, removes repeated keys (first occurrence kept), sorts
/// by upload instant descending with a missing instant ordered as the oldest
/// possible value, and assigns dense ids `1..=N`. The sort is stable, so ties
/// keep their input (completion) order.
pub fn aggregate<I>(results: I) -> Vec<EnrichedRecord>
where
    I: IntoIterator<Item = Option<EnrichedRecord>>,
{
    let records: Vec<EnrichedRecord> = results
        .into_iter()
        .flatten()
        .unique_by(|r| r.key.clone())
        .sorted_by(|a, b| b.upload_instant.cmp(&a.upload_instant))
        .enumerate()
        .map(|(i, mut record)| {
            record.id = Some(i + 1);
            record
        })
        .collect();
    debug!(count = records.len(), "Aggregated records");
    records
}
