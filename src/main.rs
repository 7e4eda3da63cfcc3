use anyhow::Context;
use feed_courier::{execute_run, FetchConfig, HttpFetcher, NotionClient, RunConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("starting feed courier run");

    let config = RunConfig::from_env();
    let notion = NotionClient::from_env().context("Notion client configuration")?;
    let fetcher = HttpFetcher::new(FetchConfig::default()).context("HTTP client construction")?;

    let report = execute_run(&notion, &fetcher, &notion, config).await;

    info!(
        "delivered {}/{} new items from {} feeds",
        report.delivered, report.items, report.feeds
    );
    Ok(())
}
