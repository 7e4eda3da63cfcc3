use crate::types::{CourierError, FeedSource, NormalizedItem, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use tracing::{debug, error, info, warn};
use url::Url;

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion caps a rich_text fragment at 2000 characters.
const PARAGRAPH_CHUNK_CHARS: usize = 2000;

/// Unread reader entries older than this get archived after delivery.
const STALE_AFTER_DAYS: i64 = 30;

const REQUIRED_ENV_VARS: [&str; 3] = [
    "NOTION_API_TOKEN",
    "NOTION_READER_DATABASE_ID",
    "NOTION_FEEDS_DATABASE_ID",
];

/// Source of the feed list. Production reads a Notion database; tests hand
/// back a fixed list.
#[async_trait]
pub trait FeedDirectory: Send + Sync {
    /// Returns the feeds to poll, in directory order. Failure to reach the
    /// directory degrades to an empty list; it never aborts the run.
    async fn list_feeds(&self) -> Vec<FeedSource>;
}

/// Destination for delivered items, plus housekeeping on old entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Creates one reader entry. A failure here only affects this item.
    async fn deliver(&self, item: &NormalizedItem) -> Result<()>;

    /// Archives unread entries past the staleness cutoff. All failures are
    /// logged and swallowed; archiving is best-effort cleanup.
    async fn archive_stale(&self);
}

/// Thin client for the two Notion databases the courier touches: the feeds
/// directory it reads and the reader database it writes.
pub struct NotionClient {
    client: Client,
    reader_database_id: String,
    feeds_database_id: String,
}

impl NotionClient {
    /// Builds a client from NOTION_API_TOKEN, NOTION_READER_DATABASE_ID and
    /// NOTION_FEEDS_DATABASE_ID. A missing variable is the one fatal
    /// configuration error in the system; the message names every absent
    /// variable at once.
    pub fn from_env() -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_ENV_VARS
            .iter()
            .filter(|key| env::var(key).map(|v| v.is_empty()).unwrap_or(true))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(CourierError::MissingEnv(missing.join(", ")));
        }

        let token = env::var("NOTION_API_TOKEN").unwrap_or_default();
        let reader_database_id = env::var("NOTION_READER_DATABASE_ID").unwrap_or_default();
        let feeds_database_id = env::var("NOTION_FEEDS_DATABASE_ID").unwrap_or_default();

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| CourierError::General("NOTION_API_TOKEN is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            reader_database_id,
            feeds_database_id,
        })
    }

    /// Runs a database query, following `has_more`/`next_cursor` pagination
    /// until every page of results is in hand.
    async fn query_database(&self, database_id: &str, filter: Value) -> Result<Vec<Value>> {
        let url = format!("{NOTION_API_BASE}/databases/{database_id}/query");
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "filter": filter });
            if let Some(ref c) = cursor {
                body["start_cursor"] = json!(c);
            }

            let response = self.client.post(&url).json(&body).send().await?;
            let page = Self::into_json(response).await?;

            if let Some(batch) = page["results"].as_array() {
                results.extend(batch.iter().cloned());
            }

            cursor = if page["has_more"].as_bool().unwrap_or(false) {
                page["next_cursor"].as_str().map(|s| s.to_string())
            } else {
                None
            };
            if cursor.is_none() {
                break;
            }
        }

        Ok(results)
    }

    async fn into_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl FeedDirectory for NotionClient {
    async fn list_feeds(&self) -> Vec<FeedSource> {
        let filter = json!({
            "or": [
                { "property": "Enabled", "checkbox": { "equals": true } }
            ]
        });

        let pages = match self.query_database(&self.feeds_database_id, filter).await {
            Ok(pages) => pages,
            Err(e) => {
                error!(error = %e, "failed to fetch feed list from Notion");
                return Vec::new();
            }
        };

        let mut feeds = Vec::new();
        for page in &pages {
            match feed_source_from_page(page) {
                Some(feed) => feeds.push(feed),
                None => {
                    let id = page["id"].as_str().unwrap_or("<unknown>");
                    warn!(page = id, "skipping feed with missing data");
                }
            }
        }

        info!("feed directory returned {} enabled feeds", feeds.len());
        feeds
    }
}

#[async_trait]
impl EntryStore for NotionClient {
    async fn deliver(&self, item: &NormalizedItem) -> Result<()> {
        let body = json!({
            "parent": { "database_id": self.reader_database_id },
            "properties": {
                "Title": {
                    "title": [
                        { "text": { "content": item.title } }
                    ]
                },
                "Link": { "url": item.link }
            },
            "children": content_blocks(item.content.as_deref()),
        });

        let url = format!("{NOTION_API_BASE}/pages");
        let response = self.client.post(&url).json(&body).send().await?;
        Self::into_json(response).await?;

        debug!(title = %item.title, "created reader entry");
        Ok(())
    }

    async fn archive_stale(&self) {
        let cutoff = Utc::now() - Duration::days(STALE_AFTER_DAYS);
        let filter = json!({
            "and": [
                {
                    "property": "Created At",
                    "date": { "on_or_before": cutoff.to_rfc3339() }
                },
                {
                    "property": "Read",
                    "checkbox": { "equals": false }
                }
            ]
        });

        let pages = match self.query_database(&self.reader_database_id, filter).await {
            Ok(pages) => pages,
            Err(e) => {
                error!(error = %e, "failed to query stale reader entries");
                return;
            }
        };

        let mut archived = 0usize;
        for page in &pages {
            let Some(page_id) = page["id"].as_str() else {
                continue;
            };
            let url = format!("{NOTION_API_BASE}/pages/{page_id}");
            let result = self
                .client
                .patch(&url)
                .json(&json!({ "archived": true }))
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => archived += 1,
                Ok(response) => {
                    error!(page = page_id, status = %response.status(), "failed to archive page");
                }
                Err(e) => {
                    error!(page = page_id, error = %e, "failed to archive page");
                }
            }
        }

        if !pages.is_empty() {
            info!("archived {}/{} stale unread entries", archived, pages.len());
        }
    }
}

/// Pulls `{title, feedUrl}` out of one feeds-database page. Rows with a
/// missing title, a missing link, or a link that is not an http(s) URL are
/// unusable and yield `None`.
fn feed_source_from_page(page: &Value) -> Option<FeedSource> {
    let title = page["properties"]["Title"]["title"][0]["plain_text"]
        .as_str()
        .filter(|s| !s.is_empty())?;
    let link = page["properties"]["Link"]["url"].as_str()?;

    let parsed = Url::parse(link).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }

    Some(FeedSource {
        title: title.to_string(),
        feed_url: link.to_string(),
    })
}

/// Converts raw item content into paragraph block children, chunked to stay
/// under Notion's rich_text length cap. Block-level structure of the source
/// HTML is out of scope here; the text ships as-is.
fn content_blocks(content: Option<&str>) -> Vec<Value> {
    let Some(text) = content.filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    chunk_text(text, PARAGRAPH_CHUNK_CHARS)
        .into_iter()
        .map(|chunk| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [
                        { "type": "text", "text": { "content": chunk } }
                    ]
                }
            })
        })
        .collect()
}

fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
