pub mod file_feed;
pub mod http_feed;

use async_trait::async_trait;

use crate::error::FeedError;

pub use file_feed::FileFeedTransport;
pub use http_feed::HttpFeedTransport;

/// Source of the raw delimited rate payload.
///
/// Failures are returned, never panicked; the poller treats any error as
/// a failed poll and keeps the last good snapshot.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_raw_feed(&self) -> Result<String, FeedError>;
}
