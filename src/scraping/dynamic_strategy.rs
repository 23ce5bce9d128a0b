use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::browser::{BrowserLauncher, BrowserPage, WebDriverLauncher};
use crate::error::ScrapeError;
use crate::page::Document;
use crate::scraping::result::{ScrapeResult, StrategyKind};
use crate::scraping::strategy::ScrapeStrategy;

/// Headless-browser scraping for JavaScript-rendered pages
pub struct DynamicStrategy<L = WebDriverLauncher> {
    launcher: L,
    navigation_timeout: Duration,
}

impl<L: BrowserLauncher> DynamicStrategy<L> {
    pub fn new(launcher: L, navigation_timeout: Duration) -> Self {
        Self {
            launcher,
            navigation_timeout,
        }
    }

    /// Run one browser step under the navigation deadline
    async fn bounded<T, F>(&self, step: F) -> Result<T, ScrapeError>
    where
        F: Future<Output = Result<T, ScrapeError>> + Send,
    {
        match tokio::time::timeout(self.navigation_timeout, step).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ScrapeError::RenderTimeout(self.navigation_timeout)),
        }
    }

    /// Load, capture and flatten the page; the caller owns teardown
    async fn render(&self, page: &mut dyn BrowserPage, url: &str) -> Result<ScrapeResult, ScrapeError> {
        self.bounded(page.load(url)).await?;

        let (final_url, markup) = self
            .bounded(async {
                let final_url = page.current_url().await?;
                let markup = page.content().await?;
                Ok((final_url, markup))
            })
            .await?;

        // Rendered output carries little static navigation cruft, so no sectioning
        let text = Document::parse(&markup).visible_text(" ");
        let content = format!("=== DYNAMIC PAGE ({}) ===\n{}", final_url, text);

        Ok(ScrapeResult::succeeded(url, final_url, content, StrategyKind::Dynamic))
    }

    /// Close the page; a stuck quit is left to the page's drop fallback
    async fn teardown(&self, mut page: Box<dyn BrowserPage>) {
        if tokio::time::timeout(self.navigation_timeout, page.close()).await.is_err() {
            warn!(
                "Browser did not close within {}s, releasing it in the background",
                self.navigation_timeout.as_secs_f64()
            );
        }
    }
}

#[async_trait]
impl<L: BrowserLauncher> ScrapeStrategy for DynamicStrategy<L> {
    async fn scrape(&self, url: &str, _max_related_pages: usize) -> ScrapeResult {
        info!("Starting dynamic scraping for {}", url);

        let mut page = match self.bounded(self.launcher.launch()).await {
            Ok(page) => page,
            Err(e) => {
                error!("Dynamic scraping failed to start a browser for {}: {}", url, e);
                return ScrapeResult::failed(url, StrategyKind::Dynamic, &e);
            }
        };

        let outcome = self.render(page.as_mut(), url).await;
        self.teardown(page).await;

        match outcome {
            Ok(result) => {
                info!(
                    "Dynamic scraping complete: {} characters from {}",
                    result.char_count(),
                    result.resolved_url()
                );
                result
            }
            Err(e @ ScrapeError::RenderTimeout(_)) => {
                error!(
                    "Dynamic scraping timeout after {}s for {}",
                    self.navigation_timeout.as_secs_f64(),
                    url
                );
                ScrapeResult::failed(url, StrategyKind::Dynamic, &e)
            }
            Err(e) => {
                error!("Dynamic scraping failed for {}: {}", url, e);
                ScrapeResult::failed(url, StrategyKind::Dynamic, &e)
            }
        }
    }
}
