use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

use crate::error::ScrapeError;
use crate::page::{Document, FinePrintExtractor, LinkDiscoverer, PageFetcher};
use crate::scraping::result::{ScrapeResult, StrategyKind};
use crate::scraping::strategy::ScrapeStrategy;

/// Plain HTTP scraping of the main page plus its linked policy pages
pub struct StaticStrategy {
    user_agent: String,
    timeout: Duration,
    extractor: FinePrintExtractor,
    discoverer: LinkDiscoverer,
}

/// What the main page contributes before related pages are fetched
struct MainPage {
    sections: Vec<String>,
    related: Vec<Url>,
}

impl StaticStrategy {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
            extractor: FinePrintExtractor::new(),
            discoverer: LinkDiscoverer::new(),
        }
    }

    /// Sections and candidate links of the main page
    fn read_main_page(&self, markup: &str, final_url: &Url) -> MainPage {
        let document = Document::parse(markup);
        let mut sections = Vec::new();

        let fine_print = self.extractor.extract(&document);
        if !fine_print.is_empty() {
            sections.push(format!("=== MAIN PAGE ({}) ===\n{}", final_url, fine_print));
        }

        sections.push(format!("=== FULL PAGE CONTENT ===\n{}", document.visible_text(" ")));

        let related = self.discoverer.discover(&document, final_url);

        MainPage { sections, related }
    }

    async fn run(&self, url: &str, max_related_pages: usize) -> Result<ScrapeResult, ScrapeError> {
        let fetcher = PageFetcher::new(&self.user_agent, self.timeout)?;
        let main = fetcher.fetch(url).await?;

        let MainPage { mut sections, related } = self.read_main_page(&main.body, &main.final_url);

        let total = related.len();
        for (i, terms_url) in related.into_iter().take(max_related_pages).enumerate() {
            info!("Scraping related page {}/{}: {}", i + 1, total, terms_url);
            match fetcher.fetch(terms_url.as_str()).await {
                Ok(page) => {
                    let text = Document::parse(&page.body).visible_text(" ");
                    sections.push(format!("=== TERMS PAGE ({}) ===\n{}", terms_url, text));
                }
                Err(e) => {
                    warn!("Failed to scrape {}: {}", terms_url, e);
                    continue;
                }
            }
        }

        let combined = sections.join("\n\n");
        let result = ScrapeResult::succeeded(url, main.final_url.as_str(), combined, StrategyKind::Static);

        info!(
            "Static scraping complete: {} characters from {}",
            result.char_count(),
            main.final_url
        );

        Ok(result)
    }
}

#[async_trait]
impl ScrapeStrategy for StaticStrategy {
    async fn scrape(&self, url: &str, max_related_pages: usize) -> ScrapeResult {
        match self.run(url, max_related_pages).await {
            Ok(result) => result,
            Err(e) => {
                error!("Static scraping failed for {}: {}", url, e);
                ScrapeResult::failed(url, StrategyKind::Static, &e)
            }
        }
    }
}
