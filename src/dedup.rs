use crate::types::NormalizedItem;
use std::collections::HashSet;
use tracing::{debug, info};

/// Identity of an item for within-run duplicate suppression. The candidates
/// form an explicit priority chain: link, then guid, then title plus publish
/// time. An item yielding no candidate has no identity and is never treated
/// as a duplicate of anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Link(String),
    Guid(String),
    TitleDate(String, String),
}

impl DedupKey {
    pub fn of(item: &NormalizedItem) -> Option<Self> {
        let link = item.link.trim();
        if !link.is_empty() {
            return Some(Self::Link(link.to_string()));
        }
        if let Some(guid) = item.guid.as_deref() {
            let guid = guid.trim();
            if !guid.is_empty() {
                return Some(Self::Guid(guid.to_string()));
            }
        }
        let title = item.title.trim();
        if !title.is_empty() {
            return Some(Self::TitleDate(
                title.to_string(),
                item.published_at.to_rfc3339(),
            ));
        }
        None
    }
}

/// Removes duplicates from the merged item sequence, keeping the first
/// occurrence and its position. The same article syndicated by several feeds
/// collapses here because the sequence spans all feeds of the run.
pub fn dedup_items(items: Vec<NormalizedItem>) -> Vec<NormalizedItem> {
    let before = items.len();
    let mut seen: HashSet<DedupKey> = HashSet::new();

    let unique: Vec<NormalizedItem> = items
        .into_iter()
        .filter(|item| match DedupKey::of(item) {
            Some(key) => {
                let fresh = seen.insert(key);
                if !fresh {
                    debug!(link = %item.link, title = %item.title, "dropping duplicate item");
                }
                fresh
            }
            None => true,
        })
        .collect();

    let removed = before - unique.len();
    if removed > 0 {
        info!("removed {} duplicate items", removed);
    }
    unique
}
