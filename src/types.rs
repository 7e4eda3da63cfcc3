use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row from the feed directory: a feed worth polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub title: String,
    pub feed_url: String,
}

/// An item exactly as the feed parser produced it. Every field is optional
/// because real-world feeds omit any of them; validation happens downstream.
#[derive(Debug, Clone, Default)]
pub struct RawFeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub content_snippet: Option<String>,
}

/// An item that survived validation and the recency window, with its title
/// canonicalized. `content` is the raw HTML from the feed, passed through
/// untouched for the downstream block converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub title: String,
    pub link: String,
    pub guid: Option<String>,
    pub published_at: DateTime<Utc>,
    pub content: Option<String>,
}

/// Summary of one complete run, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub feeds: usize,
    pub items: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Missing required environment variables: {0}")]
    MissingEnv(String),

    #[error("Notion API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, CourierError>;
