//! Data models for discovered candidates and enriched video records.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RenderedItem`]: one item as currently materialized by the page source
//! - [`CandidateRef`]: a lightweight reference that survived Discovery's filters
//! - [`VideoMetadata`]: authoritative per-video metadata from the metadata source
//! - [`EnrichedRecord`]: a fully cleaned record ready for aggregation
//! - [`OutputRecord`]: the persisted form consumed by downstream systems
//!
//! Records are built atomically: Enrichment either produces a complete
//! [`EnrichedRecord`] or nothing at all.

use crate::timing::format_canonical;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use url::Url;

/// A list item as exposed by the page source at one point in time.
///
/// Every field is optional: the page source reports whatever it found, and a
/// missing field simply makes Discovery skip the item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedItem {
    /// Link to the item's detail page, usually relative (`/watch?v=...`).
    pub href: Option<String>,
    /// Short relative upload label such as `3시간 전` or `2 hours ago`.
    pub recency_label: Option<String>,
    /// Length badge such as `1:30`.
    pub duration_label: Option<String>,
}

/// A candidate video that passed Discovery's cheap filters.
///
/// The `key` is derived deterministically from `locator` and is the identity
/// used for deduplication across reveal steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRef {
    /// Stable video identifier (the `v` query parameter or shorts id).
    pub key: String,
    /// Absolute address of the detail page.
    pub locator: String,
    /// The relative recency label seen during Discovery.
    pub recency_hint: String,
}

impl CandidateRef {
    /// Build a candidate from an absolute locator.
    ///
    /// Returns `None` when no video key can be extracted from the locator.
    pub fn new(locator: &Url, recency_hint: impl Into<String>) -> Option<Self> {
        let key = video_key(locator)?;
        Some(Self {
            key,
            locator: locator.to_string(),
            recency_hint: recency_hint.into(),
        })
    }
}

/// Extract the stable video key from a watch or shorts locator.
///
/// ```ignore
/// let url = Url::parse("https://www.youtube.com/watch?v=abc123&t=5s").unwrap();
/// assert_eq!(video_key(&url), Some("abc123".to_string()));
/// ```
pub fn video_key(locator: &Url) -> Option<String> {
    let path = locator.path();
    if path == "/watch" {
        return locator
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .filter(|v| is_valid_key(v));
    }
    let mut segments = locator.path_segments()?;
    match (segments.next(), segments.next()) {
        (Some("shorts"), Some(id)) if is_valid_key(id) => Some(id.to_string()),
        _ => None,
    }
}

fn is_valid_key(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Authoritative metadata for one video, as returned by a metadata source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    /// Upload instant, when the source exposes one.
    pub upload_instant: Option<DateTime<FixedOffset>>,
    /// Canonical page address reported by the source.
    pub webpage_url: Option<String>,
    /// Highest-resolution thumbnail.
    pub thumbnail: Option<String>,
    pub view_count: Option<u64>,
    /// Authoritative length in seconds.
    pub length_seconds: Option<u64>,
}

/// A candidate after enrichment and text cleaning.
///
/// `id` stays `None` until [`crate::aggregate::aggregate`] assigns the dense
/// ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub key: String,
    pub raw_title: String,
    pub cleaned_title: String,
    pub raw_description: String,
    pub cleaned_description: String,
    /// Upload instant in the canonical zone.
    pub upload_instant: Option<DateTime<FixedOffset>>,
    pub locator: String,
    pub thumbnail_locator: Option<String>,
    pub view_count: Option<u64>,
    pub id: Option<usize>,
}

/// Persisted form of an [`EnrichedRecord`].
///
/// The field set and order are a compatibility surface for downstream
/// consumers; optional values serialize as `null` rather than disappearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub id: Option<usize>,
    pub title: String,
    pub cleaned_title: String,
    pub upload_date: Option<String>,
    pub description: String,
    pub cleaned_description: String,
    pub video_link: String,
    pub thumbnail_link: Option<String>,
    pub view_count: Option<u64>,
}

impl From<&EnrichedRecord> for OutputRecord {
    fn from(r: &EnrichedRecord) -> Self {
        Self {
            id: r.id,
            title: r.raw_title.clone(),
            cleaned_title: r.cleaned_title.clone(),
            upload_date: r.upload_instant.as_ref().map(format_canonical),
            description: r.raw_description.clone(),
            cleaned_description: r.cleaned_description.clone(),
            video_link: r.locator.clone(),
            thumbnail_link: r.thumbnail_locator.clone(),
            view_count: r.view_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_video_key_from_watch_url() {
        assert_eq!(
            video_key(&url("https://www.youtube.com/watch?v=abc_12-3&t=10s")),
            Some("abc_12-3".to_string())
        );
    }

    #[test]
    fn test_video_key_from_shorts_url() {
        assert_eq!(
            video_key(&url("https://www.youtube.com/shorts/XyZ987")),
            Some("XyZ987".to_string())
        );
    }

    #[test]
    fn test_video_key_rejects_other_paths() {
        assert_eq!(video_key(&url("https://www.youtube.com/@newskbs/videos")), None);
        assert_eq!(video_key(&url("https://www.youtube.com/watch?list=PL1")), None);
        assert_eq!(video_key(&url("https://www.youtube.com/watch?v=")), None);
    }

    #[test]
    fn test_candidate_ref_new() {
        let c = CandidateRef::new(&url("https://www.youtube.com/watch?v=k1"), "3시간 전").unwrap();
        assert_eq!(c.key, "k1");
        assert_eq!(c.locator, "https://www.youtube.com/watch?v=k1");
        assert_eq!(c.recency_hint, "3시간 전");
    }

    #[test]
    fn test_output_record_field_order_and_nulls() {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let record = EnrichedRecord {
            key: "k1".into(),
            raw_title: "제목".into(),
            cleaned_title: "제목".into(),
            raw_description: "설명".into(),
            cleaned_description: "설명".into(),
            upload_instant: Some(kst.with_ymd_and_hms(2025, 6, 13, 9, 5, 7).unwrap()),
            locator: "https://www.youtube.com/watch?v=k1".into(),
            thumbnail_locator: None,
            view_count: None,
            id: Some(1),
        };
        let json = serde_json::to_string(&OutputRecord::from(&record)).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"title":"제목","cleaned_title":"제목","upload_date":"2025-06-13 09:05:07","description":"설명","cleaned_description":"설명","video_link":"https://www.youtube.com/watch?v=k1","thumbnail_link":null,"view_count":null}"#
        );
    }
}
