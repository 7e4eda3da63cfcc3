pub mod aggregator;
pub mod config;
pub mod dedup;
pub mod fetcher;
pub mod normalize;
pub mod notion;
pub mod processing;
pub mod run;
pub mod types;

pub use aggregator::collect_new_items;
pub use config::{FetchConfig, RunConfig, DEFAULT_RUN_FREQUENCY_SECS};
pub use dedup::{dedup_items, DedupKey};
pub use fetcher::{FetchFeed, HttpFetcher};
pub use normalize::normalize_title;
pub use notion::{EntryStore, FeedDirectory, NotionClient};
pub use run::execute_run;
pub use types::*;
