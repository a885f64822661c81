//! End-to-end runs over in-memory page and metadata sources.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset};
use news_shorts_harvester::config::{Channel, Config};
use news_shorts_harvester::discovery::StopReason;
use news_shorts_harvester::error::{DiscoveryError, DropReason, MetadataError};
use news_shorts_harvester::lang::{LanguageClassifier, LanguageCode};
use news_shorts_harvester::models::{RenderedItem, VideoMetadata};
use news_shorts_harvester::outputs::json::write_records;
use news_shorts_harvester::pipeline::Pipeline;
use news_shorts_harvester::sources::{MetadataSource, PageSource};
use news_shorts_harvester::timing::now_canonical;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct StaticPage {
    items: Vec<RenderedItem>,
    reachable: bool,
}

impl PageSource for StaticPage {
    async fn open(&mut self, locator: &str) -> Result<(), DiscoveryError> {
        if self.reachable {
            Ok(())
        } else {
            Err(DiscoveryError::ContentMissing(locator.to_string()))
        }
    }

    async fn reveal_more(&mut self) -> Result<(), DiscoveryError> {
        Ok(())
    }

    fn content_height(&self) -> u64 {
        self.items.len() as u64
    }

    fn rendered_items(&self) -> Vec<RenderedItem> {
        self.items.clone()
    }
}

struct MapSource(HashMap<String, VideoMetadata>);

impl MetadataSource for MapSource {
    async fn fetch(&self, locator: &str) -> Result<VideoMetadata, MetadataError> {
        self.0
            .get(locator)
            .cloned()
            .ok_or_else(|| MetadataError::Transient(format!("connection reset for {locator}")))
    }
}

struct Unknown;

impl LanguageClassifier for Unknown {
    fn classify(&self, _text: &str, _min_chars: usize) -> Option<LanguageCode> {
        None
    }
}

fn locator(key: &str) -> String {
    format!("https://www.youtube.com/watch?v={key}")
}

fn item(key: &str, recency: &str) -> RenderedItem {
    RenderedItem {
        href: Some(format!("/watch?v={key}")),
        recency_label: Some(recency.to_string()),
        duration_label: Some("1:30".to_string()),
    }
}

fn meta(key: &str, uploaded: DateTime<FixedOffset>) -> VideoMetadata {
    VideoMetadata {
        title: format!("[단독] {key} 관련 소식 / KBS"),
        description: format!("{key} 관련 내용입니다.\n영상편집: 김영희"),
        upload_instant: Some(uploaded),
        webpage_url: Some(locator(key)),
        thumbnail: Some(format!("https://i.ytimg.com/vi/{key}/maxresdefault.jpg")),
        view_count: Some(100),
        length_seconds: Some(90),
    }
}

fn config() -> Config {
    Config {
        reveal_pause: Duration::ZERO,
        stall_limit: 1,
        // day labels must reach Enrichment for the precise check to decide
        early_stop: false,
        workers: 3,
        ..Config::for_channel(Channel::Kbs).unwrap()
    }
}

fn scenario_page() -> StaticPage {
    StaticPage {
        items: vec![
            item("v1", "1시간 전"),
            item("v2", "2시간 전"),
            item("v3", "3시간 전"),
            item("v4", "4시간 전"),
            item("v5", "1일 전"),
        ],
        reachable: true,
    }
}

fn scenario_source() -> MapSource {
    let now = now_canonical();
    let hours = ChronoDuration::hours;
    MapSource(HashMap::from([
        (locator("v1"), meta("v1", now - hours(1))),
        (locator("v2"), meta("v2", now - hours(2))),
        // v3 is absent: its fetch fails
        (locator("v4"), meta("v4", now - hours(4))),
        (locator("v5"), meta("v5", now - hours(30))),
    ]))
}

#[tokio::test]
async fn test_five_candidates_yield_three_records() {
    let outcome = Pipeline::new(config(), scenario_page(), scenario_source())
        .with_classifier(Arc::new(Unknown))
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.summary.candidates, 5);
    assert_eq!(outcome.summary.stop_reason, StopReason::Stalled);
    assert_eq!(outcome.summary.records, 3);

    let keys: Vec<_> = outcome.records.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["v1", "v2", "v4"]);
    let ids: Vec<_> = outcome.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, [Some(1), Some(2), Some(3)]);
    assert!(
        outcome
            .records
            .windows(2)
            .all(|w| w[0].upload_instant > w[1].upload_instant)
    );

    assert_eq!(outcome.summary.drops.get(&DropReason::Fetch), Some(&1));
    assert_eq!(outcome.summary.drops.get(&DropReason::TooOld), Some(&1));
    assert_eq!(outcome.summary.dropped(), 2);

    let first = &outcome.records[0];
    assert_eq!(first.cleaned_title, "v1 관련 소식");
    assert_eq!(first.cleaned_description, "v1 관련 내용입니다");
}

#[tokio::test]
async fn test_records_are_written_in_order() {
    let outcome = Pipeline::new(config(), scenario_page(), scenario_source())
        .with_classifier(Arc::new(Unknown))
        .run()
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_records(&outcome.records, dir.path().to_str().unwrap(), "KBS_VIDEO_DATA.json")
        .await
        .unwrap();
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[2]["video_link"], locator("v4"));
    let fields: Vec<_> = rows[0].as_object().unwrap().keys().cloned().collect();
    assert_eq!(fields.len(), 9);
}

#[tokio::test]
async fn test_unreachable_page_aborts_run() {
    let page = StaticPage {
        items: Vec::new(),
        reachable: false,
    };
    let result = Pipeline::new(config(), page, scenario_source())
        .with_classifier(Arc::new(Unknown))
        .run()
        .await;

    let err = result.unwrap_err();
    assert!(err.is_fatal());
}
