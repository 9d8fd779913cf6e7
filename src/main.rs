use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bullion_rates::Storefront;
use bullion_rates::config::{Config, FeedSource};
use bullion_rates::market_data::adapters::{FeedTransport, FileFeedTransport, HttpFeedTransport};
use bullion_rates::metrics::prometheus;

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_transport(config: &Config) -> Result<Arc<dyn FeedTransport>> {
    let transport: Arc<dyn FeedTransport> = match &config.feed {
        FeedSource::Http(url) => Arc::new(HttpFeedTransport::new(url.clone(), config.poll.timeout)?),
        FeedSource::File(path) => Arc::new(FileFeedTransport::new(path.clone())),
    };
    Ok(transport)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    if let Some(addr) = config.metrics_addr {
        prometheus::init_metrics_server(addr)?;
        info!(%addr, "metrics exporter listening");
    }

    info!(feed = ?config.feed, "bullion-rates starting");

    let storefront = Storefront::from_config(&config);
    let transport = build_transport(&config)?;
    let scheduler = Arc::new(storefront.poll_scheduler(transport, config.poll));
    let poller = scheduler.spawn();

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down");
    poller.stop().await;

    match storefront.current_snapshot() {
        Some(snapshot) => info!(
            generation = storefront.repository().generation(),
            spot = snapshot.spot.len(),
            products = snapshot.rtgs.len(),
            "last snapshot at shutdown"
        ),
        None => warn!("shut down before any successful poll"),
    }

    Ok(())
}
