use std::path::PathBuf;

use async_trait::async_trait;

use super::FeedTransport;
use crate::error::FeedError;

/// Demo feed: re-reads a payload file on every poll, so editing the file
/// simulates a moving market.
pub struct FileFeedTransport {
    path: PathBuf,
}

impl FileFeedTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedTransport for FileFeedTransport {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch_raw_feed(&self) -> Result<String, FeedError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_payload_from_disk() {
        let path = std::env::temp_dir().join(format!("bullion-feed-{}.tsv", std::process::id()));
        tokio::fs::write(&path, "945\tGold 999\t-\t100\t-\t-\tInStock\n")
            .await
            .unwrap();

        let body = FileFeedTransport::new(&path).fetch_raw_feed().await.unwrap();
        assert!(body.starts_with("945\t"));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let transport = FileFeedTransport::new("/nonexistent/bullion/feed.tsv");
        let err = transport.fetch_raw_feed().await.unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
