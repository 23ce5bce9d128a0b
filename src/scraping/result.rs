use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScrapeError;
use crate::page::normalize_url;

/// Requested scraping policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    /// Plain HTTP fetch, no JavaScript
    Static,
    /// Headless browser render
    Dynamic,
    /// Static first, escalate to dynamic when the result looks too thin
    #[default]
    Auto,
}

/// The strategy that actually produced a result; never `Auto`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Static,
    Dynamic,
}

impl fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Dynamic => write!(f, "dynamic"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Parameters of one orchestrated scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    /// Target URL, always carrying a scheme
    pub url: String,
    pub mode: ScrapeMode,
    pub max_related_pages: usize,
}

impl ScrapeRequest {
    pub const DEFAULT_MAX_RELATED_PAGES: usize = 5;

    pub fn new(url: &str, mode: ScrapeMode) -> Self {
        Self {
            url: normalize_url(url),
            mode,
            max_related_pages: Self::DEFAULT_MAX_RELATED_PAGES,
        }
    }

    pub fn with_max_related_pages(mut self, max_related_pages: usize) -> Self {
        self.max_related_pages = max_related_pages;
        self
    }
}

/// Category of a failed scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    RenderTimeout,
    Render,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one strategy invocation.
///
/// Built once through [`ScrapeResult::succeeded`] or [`ScrapeResult::failed`]
/// and never mutated. A failed result always has empty content, and
/// `char_count` always equals the character length of `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    requested_url: String,
    resolved_url: String,
    content: String,
    char_count: usize,
    mode_used: StrategyKind,
    success: bool,
    error: Option<ScrapeFailure>,
}

impl ScrapeResult {
    pub fn succeeded(
        requested_url: impl Into<String>,
        resolved_url: impl Into<String>,
        content: String,
        mode_used: StrategyKind,
    ) -> Self {
        let char_count = content.chars().count();
        Self {
            requested_url: requested_url.into(),
            resolved_url: resolved_url.into(),
            content,
            char_count,
            mode_used,
            success: true,
            error: None,
        }
    }

    pub fn failed(requested_url: impl Into<String>, mode_used: StrategyKind, error: &ScrapeError) -> Self {
        let requested_url = requested_url.into();
        Self {
            resolved_url: requested_url.clone(),
            requested_url,
            content: String::new(),
            char_count: 0,
            mode_used,
            success: false,
            error: Some(ScrapeFailure {
                kind: error.failure_kind(),
                message: error.to_string(),
            }),
        }
    }

    pub fn requested_url(&self) -> &str {
        &self.requested_url
    }

    pub fn resolved_url(&self) -> &str {
        &self.resolved_url
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn mode_used(&self) -> StrategyKind {
        self.mode_used
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn failure(&self) -> Option<&ScrapeFailure> {
        self.error.as_ref()
    }

    /// Human-readable failure reason
    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|failure| failure.message.as_str())
    }

    /// A successful result shorter than `threshold` characters.
    /// Failed results are never "incomplete", only failed.
    pub fn is_likely_incomplete(&self, threshold: usize) -> bool {
        self.success && self.char_count < threshold
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::time::Duration;

    #[test]
    fn test_success_counts_characters() {
        let result = ScrapeResult::succeeded(
            "https://a.example",
            "https://b.example",
            "Prix réduit†".to_string(),
            StrategyKind::Static,
        );
        assert!(result.success());
        assert!(result.error().is_none());
        assert_eq!(result.char_count(), result.content().chars().count());
        assert_eq!(result.char_count(), 12);
        assert_eq!(result.resolved_url(), "https://b.example");
    }

    #[test]
    fn test_failure_has_no_content() {
        let error = ScrapeError::Fetch(FetchError::Status {
            url: "https://a.example".into(),
            status: 404,
        });
        let result = ScrapeResult::failed("https://a.example", StrategyKind::Static, &error);

        assert!(!result.success());
        assert_eq!(result.content(), "");
        assert_eq!(result.char_count(), 0);
        assert_eq!(result.resolved_url(), "https://a.example");
        assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::Fetch));
        assert!(result.error().unwrap().contains("404"));
    }

    #[test]
    fn test_failed_result_is_never_incomplete() {
        let error = ScrapeError::RenderTimeout(Duration::from_secs(10));
        let result = ScrapeResult::failed("https://a.example", StrategyKind::Dynamic, &error);
        assert!(!result.is_likely_incomplete(200));
    }

    #[test]
    fn test_incomplete_threshold_is_strict() {
        let content = "x".repeat(200);
        let result = ScrapeResult::succeeded("u", "u", content, StrategyKind::Static);
        assert!(!result.is_likely_incomplete(200));
        assert!(result.is_likely_incomplete(201));
    }

    #[test]
    fn test_request_normalizes_url() {
        let request = ScrapeRequest::new("example.com", ScrapeMode::Auto);
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.max_related_pages, 5);
    }
}
