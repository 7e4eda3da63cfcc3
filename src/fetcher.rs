use crate::config::FetchConfig;
use crate::types::{CourierError, RawFeedItem, Result};
use async_trait::async_trait;
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Seam between the aggregator and feed transport. Production uses
/// [`HttpFetcher`]; tests substitute canned items or failures.
#[async_trait]
pub trait FetchFeed: Send + Sync {
    /// Fetches and parses one feed, returning its items in document order.
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawFeedItem>>;
}

/// reqwest-backed fetcher. One client is built up front; the per-feed
/// timeout lives in the client, so a hung host surfaces as a fetch error
/// like any other.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FetchFeed for HttpFetcher {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawFeedItem>> {
        debug!(feed = feed_url, "fetching feed");

        let response = self.client.get(feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::General(format!(
                "HTTP {} fetching {}",
                status, feed_url
            )));
        }

        let body = response.bytes().await?;
        let feed = parser::parse(body.as_ref())
            .map_err(|e| CourierError::Parse(format!("{}: {}", feed_url, e)))?;

        let items = feed.entries.into_iter().map(raw_item_from_entry).collect();
        Ok(items)
    }
}

fn raw_item_from_entry(entry: feed_rs::model::Entry) -> RawFeedItem {
    let title = entry.title.map(|t| t.content);
    let link = entry.links.first().map(|l| l.href.clone());
    let guid = if entry.id.is_empty() {
        None
    } else {
        Some(entry.id)
    };
    let published_at = entry.published.map(|dt| dt.with_timezone(&Utc));
    let content_snippet = entry.summary.map(|s| s.content);
    let content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| content_snippet.clone());

    RawFeedItem {
        title,
        link,
        guid,
        published_at,
        content,
        content_snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <item>
      <title>First post</title>
      <link>https://example.com/first</link>
      <guid>https://example.com/first</guid>
      <pubDate>Sat, 01 Jun 2024 10:00:00 GMT</pubDate>
      <description>Hello &amp; welcome</description>
    </item>
    <item>
      <title>Undated post</title>
      <link>https://example.com/undated</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn maps_rss_entries_to_raw_items() {
        let feed = parser::parse(FEED.as_bytes()).unwrap();
        let items: Vec<RawFeedItem> = feed.entries.into_iter().map(raw_item_from_entry).collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("First post"));
        assert_eq!(items[0].link.as_deref(), Some("https://example.com/first"));
        assert_eq!(items[0].guid.as_deref(), Some("https://example.com/first"));
        assert!(items[0].published_at.is_some());
        assert_eq!(items[0].content.as_deref(), Some("Hello & welcome"));

        assert_eq!(items[1].title.as_deref(), Some("Undated post"));
        assert!(items[1].published_at.is_none());
    }
}
