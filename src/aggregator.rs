use crate::config::RunConfig;
use crate::dedup::dedup_items;
use crate::fetcher::FetchFeed;
use crate::processing::select_recent;
use crate::types::{FeedSource, NormalizedItem};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info};

/// Upper bound on in-flight feed fetches, so a long source list does not
/// hammer feed hosts all at once.
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Polls every source and produces the run's clean item sequence:
/// per-feed fetch + recency filter + normalization, merged in feed-list
/// order, deduplicated across feeds, sorted ascending by publish time.
///
/// Fetches run concurrently but `buffered` yields results in source order,
/// so the merge (and therefore which duplicate survives) is deterministic
/// regardless of completion order. A feed that fails to fetch or parse
/// contributes nothing and is logged; it never aborts the run.
pub async fn collect_new_items<F>(
    fetcher: &F,
    sources: &[FeedSource],
    config: RunConfig,
    now: DateTime<Utc>,
) -> Vec<NormalizedItem>
where
    F: FetchFeed + ?Sized,
{
    let per_feed: Vec<Vec<NormalizedItem>> = stream::iter(sources)
        .map(|source| async move {
            match fetcher.fetch(&source.feed_url).await {
                Ok(raw_items) => {
                    select_recent(&source.feed_url, raw_items, now, config.run_frequency_secs)
                }
                Err(e) => {
                    error!(feed = %source.feed_url, error = %e, "failed to fetch feed");
                    Vec::new()
                }
            }
        })
        .buffered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    let merged: Vec<NormalizedItem> = per_feed.into_iter().flatten().collect();
    info!("collected {} in-window items from {} feeds", merged.len(), sources.len());

    let mut unique = dedup_items(merged);
    // Stable sort keeps dedup order on publish-time ties.
    unique.sort_by_key(|item| item.published_at);
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourierError, RawFeedItem, Result};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    struct CannedFetcher {
        feeds: HashMap<String, Vec<RawFeedItem>>,
    }

    #[async_trait]
    impl FetchFeed for CannedFetcher {
        async fn fetch(&self, feed_url: &str) -> Result<Vec<RawFeedItem>> {
            self.feeds
                .get(feed_url)
                .cloned()
                .ok_or_else(|| CourierError::General(format!("connection refused: {feed_url}")))
        }
    }

    fn source(url: &str) -> FeedSource {
        FeedSource {
            title: url.to_string(),
            feed_url: url.to_string(),
        }
    }

    fn raw(title: &str, link: &str, published_at: DateTime<Utc>) -> RawFeedItem {
        RawFeedItem {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            published_at: Some(published_at),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn merges_and_sorts_across_feeds() {
        let fetcher = CannedFetcher {
            feeds: HashMap::from([
                (
                    "https://a".to_string(),
                    vec![raw("newest", "https://x/3", now() - Duration::seconds(10))],
                ),
                (
                    "https://b".to_string(),
                    vec![raw("oldest", "https://x/1", now() - Duration::seconds(300))],
                ),
            ]),
        };

        let items = collect_new_items(
            &fetcher,
            &[source("https://a"), source("https://b")],
            RunConfig::default(),
            now(),
        )
        .await;

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["oldest", "newest"]);
    }

    #[tokio::test]
    async fn cross_feed_duplicates_keep_first_in_feed_list_order() {
        let published = now() - Duration::seconds(60);
        let fetcher = CannedFetcher {
            feeds: HashMap::from([
                (
                    "https://a".to_string(),
                    vec![raw("from A", "https://x/1", published)],
                ),
                (
                    "https://b".to_string(),
                    vec![raw("from B", "https://x/1", published)],
                ),
            ]),
        };

        let items = collect_new_items(
            &fetcher,
            &[source("https://a"), source("https://b")],
            RunConfig::default(),
            now(),
        )
        .await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "from A");
    }

    #[tokio::test]
    async fn publish_time_ties_preserve_merge_order() {
        let published = now() - Duration::seconds(60);
        let fetcher = CannedFetcher {
            feeds: HashMap::from([(
                "https://a".to_string(),
                vec![
                    raw("first", "https://x/1", published),
                    raw("second", "https://x/2", published),
                    raw("third", "https://x/3", published),
                ],
            )]),
        };

        let items =
            collect_new_items(&fetcher, &[source("https://a")], RunConfig::default(), now()).await;

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn a_broken_feed_does_not_abort_the_run() {
        let fetcher = CannedFetcher {
            feeds: HashMap::from([(
                "https://healthy".to_string(),
                vec![raw("survivor", "https://x/1", now() - Duration::seconds(5))],
            )]),
        };

        let items = collect_new_items(
            &fetcher,
            &[source("https://broken"), source("https://healthy")],
            RunConfig::default(),
            now(),
        )
        .await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "survivor");
    }
}
