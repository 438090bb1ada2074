//! Reddit collaborator: turns a thread URL into [`ThreadContent`].

mod client;
mod listing;
mod locator;

use async_trait::async_trait;
use redsum_types::{FetchError, ThreadContent};

pub use client::{RedditClient, RedditConfig, REDDIT_BASE_URL};
pub use listing::parse_thread;
pub use locator::ThreadLocator;

/// Source of thread content.
///
/// A thread that cannot be produced is always an error, never an empty
/// [`ThreadContent`].
#[async_trait]
pub trait ThreadFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ThreadContent, FetchError>;
}
