//! Mode selection between the static and dynamic strategies.
//!
//! AUTO tries the cheap static path first and only pays for a browser when
//! the static result succeeded but came back thinner than the configured
//! threshold. A rendered result replaces the static one only when it is
//! itself not thin; in every other case the static result is kept.

use tracing::{info, warn};

use crate::browser::WebDriverLauncher;
use crate::cli::config::AppConfig;
use crate::scraping::dynamic_strategy::DynamicStrategy;
use crate::scraping::result::{ScrapeMode, ScrapeRequest, ScrapeResult};
use crate::scraping::static_strategy::StaticStrategy;
use crate::scraping::strategy::ScrapeStrategy;

pub struct ScrapeOrchestrator {
    static_strategy: Box<dyn ScrapeStrategy>,
    dynamic_strategy: Box<dyn ScrapeStrategy>,
    dynamic_enabled: bool,
    /// Minimum characters for a successful result to count as complete
    content_threshold: usize,
}

impl ScrapeOrchestrator {
    pub fn new(
        static_strategy: Box<dyn ScrapeStrategy>,
        dynamic_strategy: Box<dyn ScrapeStrategy>,
        dynamic_enabled: bool,
        content_threshold: usize,
    ) -> Self {
        Self {
            static_strategy,
            dynamic_strategy,
            dynamic_enabled,
            content_threshold,
        }
    }

    /// Orchestrator backed by the HTTP fetcher and a WebDriver browser
    pub fn from_config(config: &AppConfig) -> Self {
        let user_agent = config.scraper.user_agent.clone();
        let static_strategy = StaticStrategy::new(user_agent.clone(), config.scraper.fetch_timeout());
        let dynamic_strategy = DynamicStrategy::new(
            WebDriverLauncher::new(config.dynamic.clone(), user_agent),
            config.dynamic.navigation_timeout(),
        );

        Self::new(
            Box::new(static_strategy),
            Box::new(dynamic_strategy),
            config.dynamic.enabled,
            config.scraper.static_content_threshold,
        )
    }

    pub fn content_threshold(&self) -> usize {
        self.content_threshold
    }

    pub async fn scrape(&self, request: &ScrapeRequest) -> ScrapeResult {
        info!("Starting scrape for {} with mode={}", request.url, request.mode);

        match request.mode {
            ScrapeMode::Static => self.run_static(request).await,
            ScrapeMode::Dynamic => {
                if !self.dynamic_enabled {
                    warn!("Dynamic scraping is disabled, falling back to static");
                    return self.run_static(request).await;
                }
                self.dynamic_strategy.scrape(&request.url, request.max_related_pages).await
            }
            ScrapeMode::Auto => self.run_auto(request).await,
        }
    }

    async fn run_static(&self, request: &ScrapeRequest) -> ScrapeResult {
        self.static_strategy.scrape(&request.url, request.max_related_pages).await
    }

    async fn run_auto(&self, request: &ScrapeRequest) -> ScrapeResult {
        let static_result = self.run_static(request).await;

        // A fetch failure would hit the browser too; no escalation
        if !static_result.is_likely_incomplete(self.content_threshold) {
            return static_result;
        }

        warn!(
            "Static scrape returned only {} chars (threshold: {})",
            static_result.char_count(),
            self.content_threshold
        );

        if !self.dynamic_enabled {
            warn!("Dynamic scraping is disabled, keeping static result");
            return static_result;
        }

        info!("Falling back to dynamic scraping for {}", request.url);
        let dynamic_result = self
            .dynamic_strategy
            .scrape(&request.url, request.max_related_pages)
            .await;

        if dynamic_result.success() && !dynamic_result.is_likely_incomplete(self.content_threshold) {
            info!("Dynamic scraping successful with {} chars", dynamic_result.char_count());
            dynamic_result
        } else {
            warn!("Dynamic scraping also failed or returned insufficient content, using static result");
            static_result
        }
    }
}
