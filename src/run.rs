use crate::aggregator::collect_new_items;
use crate::config::RunConfig;
use crate::fetcher::FetchFeed;
use crate::notion::{EntryStore, FeedDirectory};
use crate::types::RunReport;
use chrono::Utc;
use tracing::{error, info};

/// One complete poll-filter-dedup-deliver cycle.
///
/// Failures shrink the output instead of propagating: a feed that cannot be
/// fetched contributes nothing, an item that cannot be delivered is counted
/// and skipped, an unreachable directory collapses to zero feeds. When the
/// window produces no items the run stops before delivery and before the
/// archive pass.
pub async fn execute_run<D, F, S>(
    directory: &D,
    fetcher: &F,
    store: &S,
    config: RunConfig,
) -> RunReport
where
    D: FeedDirectory + ?Sized,
    F: FetchFeed + ?Sized,
    S: EntryStore + ?Sized,
{
    let now = Utc::now();
    let sources = directory.list_feeds().await;
    let items = collect_new_items(fetcher, &sources, config, now).await;

    let mut report = RunReport {
        feeds: sources.len(),
        items: items.len(),
        ..Default::default()
    };

    if items.is_empty() {
        info!("no new feed items to deliver");
        return report;
    }

    for item in &items {
        match store.deliver(item).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.delivery_failures += 1;
                error!(title = %item.title, link = %item.link, error = %e, "failed to deliver item");
            }
        }
    }

    store.archive_stale().await;

    info!(
        feeds = report.feeds,
        items = report.items,
        delivered = report.delivered,
        failures = report.delivery_failures,
        "run complete"
    );
    report
}
