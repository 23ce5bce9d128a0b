use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use crate::analysis::summarize;
use crate::cli::config::AppConfig;
use crate::limits::create_limiter;
use crate::scraping::{ScrapeMode, ScrapeOrchestrator, ScrapeRequest, ScrapeResult};
use crate::service::FinePrintService;
use crate::text::normalize;

/// JSON printed by `scrape`
#[derive(Serialize)]
struct ScrapeOutput<'a> {
    #[serde(flatten)]
    result: &'a ScrapeResult,
    is_likely_incomplete: bool,
}

/// Scrape a page and print the result
pub async fn scrape(config: &AppConfig, url: &str, mode: ScrapeMode, max_related: Option<usize>) -> Result<()> {
    let orchestrator = ScrapeOrchestrator::from_config(config);
    let request = ScrapeRequest::new(url, mode)
        .with_max_related_pages(max_related.unwrap_or(config.scraper.max_related_pages));

    let result = orchestrator.scrape(&request).await;
    if let Some(message) = result.error() {
        warn!("Scrape failed: {}", message);
    }

    let output = ScrapeOutput {
        is_likely_incomplete: result.is_likely_incomplete(orchestrator.content_threshold()),
        result: &result,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Run the full pipeline for one page
pub async fn analyze(config: &AppConfig, url: &str, user: &str, max_related: Option<usize>) -> Result<()> {
    let mut service = FinePrintService::from_config(config)
        .await
        .context("Failed to set up the analysis service")?;

    if let Some(max) = max_related {
        service = service.with_max_related_pages(max);
    }

    match service.analyze_url(user, url).await {
        Ok(report) => {
            info!(
                "Report {} ready: {} scraped chars, {} after cleaning",
                report.request_id, report.scraped_chars, report.cleaned_chars
            );
            eprintln!("{}", summarize(&report.analysis));
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("[{}] {}", e.code(), e);
            anyhow::bail!("{}: {}", e.code(), e)
        }
    }
}

/// Forget today's scans for a user
pub async fn reset_scans(config: &AppConfig, user: &str) -> Result<()> {
    if config.scan_limits.backend == "memory" {
        warn!("The memory backend keeps counts per process; nothing persists to reset");
    }

    let limiter = create_limiter(&config.scan_limits).await?;
    limiter
        .reset_scans(user)
        .await
        .context(format!("Failed to reset scans for {}", user))?;

    println!("Reset scan count for user {}", user);

    Ok(())
}

/// Clean text from a file or stdin
pub async fn normalize_text(config: &AppConfig, file: Option<PathBuf>) -> Result<()> {
    let raw = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .context(format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let cleaned = normalize(&raw, config.scraper.max_content_length);
    info!("Cleaned {} chars down to {}", raw.chars().count(), cleaned.chars().count());
    println!("{}", cleaned);

    Ok(())
}

/// Write the default configuration
pub async fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(AppConfig::default_path);

    if path.exists() {
        warn!("Overwriting existing configuration at {}", path.display());
    }

    AppConfig::default().save_to_file(&path)?;
    println!("Wrote default configuration to {}", path.display());

    Ok(())
}

/// Show the active configuration
pub fn show_config(config: &AppConfig) -> Result<()> {
    println!("Current configuration:");
    println!("{}", serde_yaml::to_string(config)?);

    Ok(())
}
