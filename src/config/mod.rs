use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::market_data::adapters::http_feed::DEFAULT_FEED_URL;
use crate::market_data::poller::PollSettings;

/// Where the raw payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Http(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub feed: FeedSource,
    pub poll: PollSettings,
    pub auto_update: bool,
    pub ticker_message: Option<String>,
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let log_level = get("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let feed = match get("RATES_FEED_FILE") {
            Some(path) => FeedSource::File(PathBuf::from(path)),
            None => FeedSource::Http(
                get("RATES_FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            ),
        };

        let defaults = PollSettings::default();
        let poll = PollSettings {
            interval: millis(&get, "RATES_POLL_INTERVAL_MS")?.unwrap_or(defaults.interval),
            timeout: millis(&get, "RATES_REQUEST_TIMEOUT_MS")?.unwrap_or(defaults.timeout),
        };

        let auto_update = match get("RATES_AUTO_UPDATE") {
            Some(raw) => parse_bool(&raw).with_context(|| format!("RATES_AUTO_UPDATE={raw}"))?,
            None => true,
        };

        let ticker_message = get("RATES_TICKER_MESSAGE").map(|message| message.trim().to_string());

        let metrics_addr = get("RATES_METRICS_ADDR")
            .map(|raw| {
                raw.parse::<SocketAddr>()
                    .with_context(|| format!("RATES_METRICS_ADDR={raw} is not a socket address"))
            })
            .transpose()?;

        Ok(Self {
            log_level,
            feed,
            poll,
            auto_update,
            ticker_message,
            metrics_addr,
        })
    }
}

fn millis(get: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<Duration>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key}={raw} is not a whole number of milliseconds"))?;
    if ms == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Some(Duration::from_millis(ms)))
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
