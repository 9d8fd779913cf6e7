use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::FeedTransport;
use crate::error::FeedError;

/// Live-rate endpoint the storefront polls by default.
pub const DEFAULT_FEED_URL: &str =
    "https://bcast.rbgoldspot.com:7768/VOTSBroadcastStreaming/Services/xml/GetLiveRateByTemplateID/rbgold";

/// Plain HTTP GET against the live-rate endpoint.
pub struct HttpFeedTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpFeedTransport {
    /// The client carries the timeout so a stuck connection cannot hold a
    /// poll open past `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bullion-rates/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl FeedTransport for HttpFeedTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_raw_feed(&self) -> Result<String, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(url = %self.url, bytes = body.len(), "fetched live feed");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        // Port 9 on loopback is discard; nothing listens there in CI.
        let transport =
            HttpFeedTransport::new("http://127.0.0.1:9/feed", Duration::from_millis(500)).unwrap();
        let err = transport.fetch_raw_feed().await.unwrap_err();
        assert_eq!(err.kind(), "request");
    }
}
