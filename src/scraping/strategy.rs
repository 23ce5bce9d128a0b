use async_trait::async_trait;

use crate::scraping::result::ScrapeResult;

/// One way of turning a URL into text.
///
/// Implementations report failure through the returned result instead of
/// an `Err`, so the orchestrator can compare outcomes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScrapeStrategy: Send + Sync {
    async fn scrape(&self, url: &str, max_related_pages: usize) -> ScrapeResult;
}
