//! Watch-page metadata source.
//!
//! Every watch page embeds the player response (`ytInitialPlayerResponse`)
//! with the title, full description, view count, thumbnails and the
//! microformat publish/upload timestamps. Pages served without it (consent
//! interstitials, some embeds) still carry a JSON-LD `VideoObject`, which is
//! used as a fallback.
//!
//! # Error mapping
//!
//! | Condition | Error |
//! |---|---|
//! | HTTP 404, playability `ERROR` | [`MetadataError::NotFound`] |
//! | network failure, 5xx, 429 | [`MetadataError::Transient`] |
//! | no parseable metadata block | [`MetadataError::FormatChanged`] |

use super::{ACCEPT_LANGUAGE, MetadataSource, USER_AGENT, embedded_json, str_at};
use crate::error::MetadataError;
use crate::models::VideoMetadata;
use crate::timing::{parse_duration, parse_upload_instant};
use reqwest::{Client, StatusCode, header};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

/// Fetches [`VideoMetadata`] from watch pages over HTTP.
#[derive(Debug, Clone)]
pub struct WatchPageSource {
    client: Client,
}

impl WatchPageSource {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl MetadataSource for WatchPageSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, locator: &str) -> Result<VideoMetadata, MetadataError> {
        let response = self
            .client
            .get(locator)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound(locator.to_string()));
        }
        if !status.is_success() {
            return Err(MetadataError::Transient(format!("HTTP status {status}")));
        }
        let html = response.text().await?;
        debug!(bytes = html.len(), "Fetched watch page");
        parse_watch_page(&html, locator)
    }
}

/// Parse a watch page into [`VideoMetadata`].
pub fn parse_watch_page(html: &str, locator: &str) -> Result<VideoMetadata, MetadataError> {
    if let Some(player) = embedded_json(html, "ytInitialPlayerResponse") {
        return from_player_response(&player, locator);
    }
    if let Some(object) = json_ld_video_object(html) {
        return Ok(from_json_ld(&object, locator));
    }
    Err(MetadataError::FormatChanged(format!(
        "no player response or JSON-LD on {locator}"
    )))
}

fn from_player_response(player: &Value, locator: &str) -> Result<VideoMetadata, MetadataError> {
    if str_at(player, "/playabilityStatus/status") == Some("ERROR") {
        let reason = str_at(player, "/playabilityStatus/reason").unwrap_or("unavailable");
        return Err(MetadataError::NotFound(format!("{locator}: {reason}")));
    }
    let details = player
        .get("videoDetails")
        .ok_or_else(|| MetadataError::FormatChanged(format!("no videoDetails on {locator}")))?;

    let microformat = player.pointer("/microformat/playerMicroformatRenderer");
    let upload_instant = microformat.and_then(|m| {
        ["/publishDate", "/uploadDate"]
            .iter()
            .filter_map(|p| str_at(m, p))
            .find_map(parse_upload_instant)
    });

    let thumbnail = details
        .pointer("/thumbnail/thumbnails")
        .and_then(Value::as_array)
        .and_then(|thumbs| thumbs.last())
        .and_then(|t| str_at(t, "/url"))
        .map(str::to_string);

    Ok(VideoMetadata {
        title: str_at(details, "/title").unwrap_or_default().to_string(),
        description: str_at(details, "/shortDescription")
            .unwrap_or_default()
            .to_string(),
        upload_instant,
        webpage_url: Some(locator.to_string()),
        thumbnail,
        view_count: str_at(details, "/viewCount").and_then(|v| v.parse().ok()),
        length_seconds: str_at(details, "/lengthSeconds").and_then(|v| v.parse().ok()),
    })
}

fn json_ld_video_object(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document
        .select(&selector)
        .filter_map(|script| {
            serde_json::from_str::<Value>(&script.text().collect::<String>()).ok()
        })
        .find(|value| str_at(value, "/@type") == Some("VideoObject"))
}

fn from_json_ld(object: &Value, locator: &str) -> VideoMetadata {
    let thumbnail = match object.get("thumbnailUrl") {
        Some(Value::String(url)) => Some(url.clone()),
        Some(Value::Array(urls)) => urls.last().and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    let view_count = object
        .pointer("/interactionStatistic/userInteractionCount")
        .or_else(|| object.get("interactionCount"))
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });

    VideoMetadata {
        title: str_at(object, "/name").unwrap_or_default().to_string(),
        description: str_at(object, "/description").unwrap_or_default().to_string(),
        upload_instant: str_at(object, "/uploadDate").and_then(parse_upload_instant),
        webpage_url: Some(locator.to_string()),
        thumbnail,
        view_count,
        // ISO-8601 ("PT1M30S"); zero means unparseable
        length_seconds: str_at(object, "/duration")
            .map(parse_duration)
            .filter(|&secs| secs > 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::format_canonical;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn player_page() -> String {
        let player = json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": {
                "videoId": "abc123",
                "title": "[자막뉴스] 폭염 특보 발효 / KBS 2025.06.13.",
                "shortDescription": "폭염이 이어지고 있습니다.\nKBS 뉴스 홍길동입니다.",
                "viewCount": "12345",
                "lengthSeconds": "96",
                "thumbnail": { "thumbnails": [
                    { "url": "https://i.ytimg.com/vi/abc123/default.jpg" },
                    { "url": "https://i.ytimg.com/vi/abc123/maxresdefault.jpg" }
                ] }
            },
            "microformat": { "playerMicroformatRenderer": {
                "publishDate": "2025-06-13T02:00:12-07:00",
                "uploadDate": "2025-06-13T02:00:12-07:00"
            } }
        });
        format!("<html><script>var ytInitialPlayerResponse = {player};var meta = 1;</script></html>")
    }

    #[test]
    fn test_parse_player_response() {
        let meta = parse_watch_page(&player_page(), "https://www.youtube.com/watch?v=abc123").unwrap();
        assert_eq!(meta.title, "[자막뉴스] 폭염 특보 발효 / KBS 2025.06.13.");
        assert!(meta.description.starts_with("폭염이"));
        assert_eq!(meta.view_count, Some(12345));
        assert_eq!(meta.length_seconds, Some(96));
        assert_eq!(
            meta.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/abc123/maxresdefault.jpg")
        );
        let instant = meta.upload_instant.unwrap();
        assert_eq!(format_canonical(&instant), "2025-06-13 18:00:12");
    }

    #[test]
    fn test_parse_json_ld_fallback() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@type":"VideoObject","name":"태풍 북상",
             "description":"태풍이 북상하고 있습니다.","uploadDate":"2025-06-13T09:00:00+09:00","duration":"PT1M30S",
             "thumbnailUrl":["https://i.ytimg.com/a.jpg","https://i.ytimg.com/b.jpg"],
             "interactionCount":"77"}
            </script></head></html>"#;
        let meta = parse_watch_page(html, "https://www.youtube.com/watch?v=x").unwrap();
        assert_eq!(meta.title, "태풍 북상");
        assert_eq!(meta.view_count, Some(77));
        assert_eq!(meta.length_seconds, Some(90));
        assert_eq!(meta.thumbnail.as_deref(), Some("https://i.ytimg.com/b.jpg"));
        assert!(meta.upload_instant.is_some());
    }

    #[test]
    fn test_date_only_upload_is_absent() {
        let html = r#"<script>var ytInitialPlayerResponse = {"videoDetails":{"title":"t"},
            "microformat":{"playerMicroformatRenderer":{"publishDate":"2025-06-13"}}};</script>"#;
        let meta = parse_watch_page(html, "https://www.youtube.com/watch?v=x").unwrap();
        assert_eq!(meta.upload_instant, None);
        assert_eq!(meta.view_count, None);
        assert_eq!(meta.length_seconds, None);
    }

    #[test]
    fn test_playability_error_is_not_found() {
        let html = r#"<script>var ytInitialPlayerResponse = {"playabilityStatus":{"status":"ERROR","reason":"삭제된 동영상"}};</script>"#;
        let err = parse_watch_page(html, "https://www.youtube.com/watch?v=x").unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(_)));
    }

    #[test]
    fn test_unrecognized_page_is_format_changed() {
        let err = parse_watch_page("<html><body>hi</body></html>", "u").unwrap_err();
        assert!(matches!(err, MetadataError::FormatChanged(_)));
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(player_page()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "busy"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let source = WatchPageSource::new().unwrap();
        let ok = source
            .fetch(&format!("{}/watch?v=abc123", server.uri()))
            .await
            .unwrap();
        assert_eq!(ok.view_count, Some(12345));

        let gone = source.fetch(&format!("{}/watch?v=gone", server.uri())).await;
        assert!(matches!(gone, Err(MetadataError::NotFound(_))));

        let busy = source.fetch(&format!("{}/watch?v=busy", server.uri())).await;
        assert!(matches!(busy, Err(MetadataError::Transient(_))));
    }
}
