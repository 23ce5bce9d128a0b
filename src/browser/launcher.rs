use async_trait::async_trait;

use crate::error::ScrapeError;

/// Starts an isolated browser and hands back a single page in it
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserPage>, ScrapeError>;
}

/// A live browser page.
///
/// `close` must be called on every exit path; implementations also release
/// the browser when dropped, as a fallback for cancelled futures.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and wait until network activity settles
    async fn load(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// URL after redirects and client-side navigation
    async fn current_url(&self) -> Result<String, ScrapeError>;

    /// Fully rendered markup
    async fn content(&self) -> Result<String, ScrapeError>;

    async fn close(&mut self);
}
