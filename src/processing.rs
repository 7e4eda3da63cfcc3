use crate::normalize::normalize_title;
use crate::types::{NormalizedItem, RawFeedItem};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Validates and windows one feed's raw items, producing normalized items.
///
/// An item must carry a title, a link, and a publish time to be usable at
/// all; anything else is dropped with a warning. Of the usable items, only
/// those published inside the trailing recency window survive:
/// `0 <= now - published_at < run_frequency_secs`. Future-dated items fall
/// outside the window on the low side, which shields the run from clock skew
/// and feeds that emit bogus dates.
pub fn select_recent(
    feed_url: &str,
    raw_items: Vec<RawFeedItem>,
    now: DateTime<Utc>,
    run_frequency_secs: i64,
) -> Vec<NormalizedItem> {
    raw_items
        .into_iter()
        .filter_map(|raw| {
            let (title, link, published_at) = match required_fields(&raw) {
                Some(fields) => fields,
                None => {
                    warn!(feed = feed_url, "skipping item with missing data");
                    return None;
                }
            };

            let age_secs = now.signed_duration_since(published_at).num_seconds();
            if age_secs < 0 || age_secs >= run_frequency_secs {
                return None;
            }

            Some(NormalizedItem {
                title: normalize_title(title),
                link: link.to_string(),
                guid: raw.guid.clone(),
                published_at,
                content: raw.content.clone().or_else(|| raw.content_snippet.clone()),
            })
        })
        .collect()
}

/// Title, link, and publish time are required; absent or empty-string fields
/// count as missing. Whitespace-only strings are present but will never win
/// a dedup key.
fn required_fields(raw: &RawFeedItem) -> Option<(&str, &str, DateTime<Utc>)> {
    let title = raw.title.as_deref().filter(|s| !s.is_empty())?;
    let link = raw.link.as_deref().filter(|s| !s.is_empty())?;
    let published_at = raw.published_at?;
    Some((title, link, published_at))
}
