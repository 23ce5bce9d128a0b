//! The analyze pipeline: scan gate, AUTO scrape, normalize, analyze, record.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{AnalysisClient, FinePrintAnalysis, OpenAiClient};
use crate::cli::config::AppConfig;
use crate::error::ServiceError;
use crate::limits::{create_limiter, ScanLimiter};
use crate::scraping::{ScrapeMode, ScrapeOrchestrator, ScrapeRequest, StrategyKind};
use crate::text::normalize;

/// Outcome of one successful analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub url: String,
    pub resolved_url: String,
    pub mode_used: StrategyKind,
    pub scraped_chars: usize,
    pub cleaned_chars: usize,
    pub analysis: FinePrintAnalysis,
    pub analyzed_at: DateTime<Utc>,
}

pub struct FinePrintService {
    orchestrator: ScrapeOrchestrator,
    analysis_client: Arc<dyn AnalysisClient>,
    limiter: Arc<dyn ScanLimiter>,
    max_related_pages: usize,
    max_content_length: usize,
}

impl FinePrintService {
    pub fn new(
        orchestrator: ScrapeOrchestrator,
        analysis_client: Arc<dyn AnalysisClient>,
        limiter: Arc<dyn ScanLimiter>,
        max_related_pages: usize,
        max_content_length: usize,
    ) -> Self {
        Self {
            orchestrator,
            analysis_client,
            limiter,
            max_related_pages,
            max_content_length,
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let orchestrator = ScrapeOrchestrator::from_config(config);
        let analysis_client = OpenAiClient::new(config.analysis.clone())?;
        let limiter = create_limiter(&config.scan_limits).await?;

        Ok(Self::new(
            orchestrator,
            Arc::new(analysis_client),
            limiter,
            config.scraper.max_related_pages,
            config.scraper.max_content_length,
        ))
    }

    pub fn with_max_related_pages(mut self, max_related_pages: usize) -> Self {
        self.max_related_pages = max_related_pages;
        self
    }

    pub async fn analyze_url(&self, user_id: &str, url: &str) -> Result<AnalysisReport, ServiceError> {
        info!("Analysis request from user {} for {}", user_id, url);

        let decision = self.limiter.can_scan(user_id).await.map_err(ServiceError::Limiter)?;
        if !decision.allowed {
            warn!("User {} blocked: {}", user_id, decision.reason);
            return Err(ServiceError::ScanLimitReached(decision.reason));
        }

        let request = ScrapeRequest::new(url, ScrapeMode::Auto).with_max_related_pages(self.max_related_pages);
        let scraped = self.orchestrator.scrape(&request).await;

        if !scraped.success() {
            let reason = scraped.error().unwrap_or("unknown error").to_string();
            return Err(ServiceError::ScrapeFailed(reason));
        }

        info!(
            "Scraped {} characters using {} mode",
            scraped.char_count(),
            scraped.mode_used()
        );

        let cleaned = normalize(scraped.content(), self.max_content_length);
        let cleaned_chars = cleaned.chars().count();
        let threshold = self.orchestrator.content_threshold();

        if cleaned_chars < threshold {
            warn!("Only {} characters left after cleaning (threshold: {})", cleaned_chars, threshold);
            return Err(ServiceError::InsufficientContent {
                chars: cleaned_chars,
                threshold,
            });
        }

        let analysis = self.analysis_client.analyze(&cleaned).await?;

        self.limiter.record_scan(user_id).await.map_err(ServiceError::Limiter)?;

        Ok(AnalysisReport {
            request_id: Uuid::new_v4(),
            url: request.url.clone(),
            resolved_url: scraped.resolved_url().to_string(),
            mode_used: scraped.mode_used(),
            scraped_chars: scraped.char_count(),
            cleaned_chars,
            analysis,
            analyzed_at: Utc::now(),
        })
    }
}
