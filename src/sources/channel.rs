//! Channel `/videos` tab as a revealable list.
//!
//! The tab is server-rendered with its first batch of items embedded as
//! `ytInitialData`. Further batches are fetched by posting the continuation
//! token found at the end of the current batch to the `browse` endpoint,
//! which is the HTTP equivalent of scrolling to the bottom of the page.
//!
//! The height signal is the number of materialized items: once the channel
//! runs out of continuations a reveal step leaves it unchanged, and the
//! discovery loop's stall rule ends the run.

use super::{ACCEPT_LANGUAGE, PageSource, USER_AGENT, embedded_json, str_at};
use crate::error::DiscoveryError;
use crate::models::RenderedItem;
use crate::text::rules::compile;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, header};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Client version sent when the page does not advertise one.
const FALLBACK_CLIENT_VERSION: &str = "2.20240101.00.00";

static CLIENT_VERSION: Lazy<Regex> =
    Lazy::new(|| compile(r#""INNERTUBE_CLIENT_VERSION"\s*:\s*"([^"]+)""#));

/// A channel video list fetched over HTTP.
#[derive(Debug)]
pub struct ChannelPage {
    client: Client,
    origin: Option<Url>,
    client_version: String,
    continuation: Option<String>,
    items: Vec<RenderedItem>,
}

impl ChannelPage {
    /// Build a page source with its own HTTP client.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            origin: None,
            client_version: FALLBACK_CLIENT_VERSION.to_string(),
            continuation: None,
            items: Vec::new(),
        }
    }

    fn absorb(&mut self, value: &Value) -> usize {
        let before = self.items.len();
        let mut token = None;
        collect_items(value, &mut self.items, &mut token);
        self.continuation = token;
        self.items.len() - before
    }
}

impl PageSource for ChannelPage {
    #[instrument(level = "info", skip(self))]
    async fn open(&mut self, locator: &str) -> Result<(), DiscoveryError> {
        let navigation = |message: String| DiscoveryError::Navigation {
            locator: locator.to_string(),
            message,
        };
        let url = Url::parse(locator).map_err(|e| navigation(e.to_string()))?;

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| navigation(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(navigation(format!("HTTP status {status}")));
        }
        let html = response.text().await.map_err(|e| navigation(e.to_string()))?;

        let data = embedded_json(&html, "ytInitialData")
            .ok_or_else(|| DiscoveryError::ContentMissing(locator.to_string()))?;
        if let Some(caps) = CLIENT_VERSION.captures(&html) {
            self.client_version = caps[1].to_string();
        }

        self.origin = Some(url);
        self.items.clear();
        let count = self.absorb(&data);
        info!(
            count,
            has_continuation = self.continuation.is_some(),
            "Loaded channel video list"
        );
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn reveal_more(&mut self) -> Result<(), DiscoveryError> {
        let Some(token) = self.continuation.clone() else {
            debug!("No continuation left; nothing to reveal");
            return Ok(());
        };
        let origin = self
            .origin
            .as_ref()
            .ok_or_else(|| DiscoveryError::Reveal("page was never opened".into()))?;
        let endpoint = origin
            .join("/youtubei/v1/browse?prettyPrint=false")
            .map_err(|e| DiscoveryError::Reveal(e.to_string()))?;

        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB",
                    "clientVersion": self.client_version,
                    "hl": "ko",
                    "gl": "KR",
                }
            },
            "continuation": token,
        });

        let response = self
            .client
            .post(endpoint)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .json(&body)
            .send()
            .await
            .map_err(|e| DiscoveryError::Reveal(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Continuation request rejected");
            return Err(DiscoveryError::Reveal(format!("HTTP status {status}")));
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Reveal(e.to_string()))?;

        let added = self.absorb(&value);
        debug!(added, total = self.items.len(), "Appended continuation batch");
        Ok(())
    }

    fn content_height(&self) -> u64 {
        self.items.len() as u64
    }

    fn rendered_items(&self) -> Vec<RenderedItem> {
        self.items.clone()
    }
}

/// Walk a browse payload collecting video items and the last continuation.
fn collect_items(value: &Value, items: &mut Vec<RenderedItem>, token: &mut Option<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match key.as_str() {
                    "videoRenderer" => items.push(rendered_item(child)),
                    "continuationItemRenderer" => {
                        if let Some(t) =
                            str_at(child, "/continuationEndpoint/continuationCommand/token")
                        {
                            *token = Some(t.to_string());
                        }
                    }
                    _ => collect_items(child, items, token),
                }
            }
        }
        Value::Array(values) => {
            for child in values {
                collect_items(child, items, token);
            }
        }
        _ => {}
    }
}

fn rendered_item(renderer: &Value) -> RenderedItem {
    let href = str_at(
        renderer,
        "/navigationEndpoint/commandMetadata/webCommandMetadata/url",
    )
    .map(str::to_string)
    .or_else(|| str_at(renderer, "/videoId").map(|id| format!("/watch?v={id}")));

    RenderedItem {
        href,
        recency_label: str_at(renderer, "/publishedTimeText/simpleText").map(str::to_string),
        duration_label: str_at(renderer, "/lengthText/simpleText").map(str::to_string),
    }
}
