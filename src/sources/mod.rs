//! External collaborators the pipeline pulls data from.
//!
//! # Submodules
//!
//! - [`channel`]: the channel `/videos` tab as a revealable list ([`PageSource`])
//! - [`watch`]: per-video watch pages as a [`MetadataSource`]
//!
//! Both traits use native `async fn`; the pipeline is generic over them so
//! tests can substitute in-memory fakes.

use crate::error::{DiscoveryError, MetadataError};
use crate::models::{RenderedItem, VideoMetadata};
use serde_json::Value;

pub mod channel;
pub mod watch;

pub use channel::ChannelPage;
pub use watch::WatchPageSource;

/// Browser-like user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// Preferred response language, so relative labels use the Korean vocabulary.
pub const ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en;q=0.5";

/// A dynamically loading list view.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Navigate to `locator` and wait until the list container is present.
    async fn open(&mut self, locator: &str) -> Result<(), DiscoveryError>;

    /// Trigger loading of the next batch of items.
    async fn reveal_more(&mut self) -> Result<(), DiscoveryError>;

    /// Size signal of the materialized list; unchanged means no growth.
    fn content_height(&self) -> u64;

    /// Items currently materialized, in display order.
    fn rendered_items(&self) -> Vec<RenderedItem>;
}

/// Authoritative per-video metadata lookup.
#[allow(async_fn_in_trait)]
pub trait MetadataSource {
    async fn fetch(&self, locator: &str) -> Result<VideoMetadata, MetadataError>;
}

/// Extract the JSON object assigned to `marker` inside an HTML page.
///
/// Matches `marker = {...}` (as in `var ytInitialData = {...};`) and parses
/// exactly one JSON value after the `=`, ignoring whatever follows it.
pub(crate) fn embedded_json(html: &str, marker: &str) -> Option<Value> {
    html.match_indices(marker).find_map(|(idx, _)| {
        let rest = html[idx + marker.len()..].trim_start();
        let rest = rest.strip_prefix('=')?.trim_start();
        if !rest.starts_with('{') {
            return None;
        }
        serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()?
            .ok()
    })
}

/// Read a string at a JSON pointer.
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}
