use std::time::Duration;
use thiserror::Error;

use crate::scraping::result::FailureKind;

/// Errors raised by a single page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch webpage: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch webpage: {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Errors that end a single strategy attempt.
///
/// These never escape a strategy as `Err`; they are folded into a failed
/// [`ScrapeResult`](crate::scraping::ScrapeResult) so callers can decide on
/// structured data.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Timeout after {} seconds", .0.as_secs_f64())]
    RenderTimeout(Duration),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl ScrapeError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Fetch(_) => FailureKind::Fetch,
            Self::RenderTimeout(_) => FailureKind::RenderTimeout,
            Self::Render(_) => FailureKind::Render,
        }
    }
}

impl From<thirtyfour::error::WebDriverError> for ScrapeError {
    fn from(err: thirtyfour::error::WebDriverError) -> Self {
        ScrapeError::Render(err.to_string())
    }
}

/// Errors from the analysis client
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No API key configured; set analysis.api_key or OPENAI_API_KEY")]
    MissingApiKey,

    #[error("Analysis request failed: {0}")]
    Request(String),

    #[error("Analysis API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model returned invalid JSON response: {0}")]
    Parse(String),

    #[error("Model response missing required field: {0}")]
    FieldMissing(&'static str),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::Request(err.to_string())
    }
}

/// Failures of the end-to-end analyze pipeline
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    ScanLimitReached(String),

    #[error("Failed to scrape website: {0}")]
    ScrapeFailed(String),

    #[error(
        "Could not extract enough content from this page ({chars} of {threshold} characters), \
         even with JavaScript rendering. The page may be protected against scraping or may not \
         contain promotional terms."
    )]
    InsufficientContent { chars: usize, threshold: usize },

    #[error("Failed to analyze fine print: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Scan limit check failed: {0}")]
    Limiter(#[source] anyhow::Error),
}

impl ServiceError {
    /// Stable machine-readable code for the failure
    pub fn code(&self) -> &'static str {
        match self {
            Self::ScanLimitReached(_) => "FREE_LIMIT_REACHED",
            Self::ScrapeFailed(_) => "SCRAPING_FAILED",
            Self::InsufficientContent { .. } => "INSUFFICIENT_CONTENT",
            Self::Analysis(_) | Self::Limiter(_) => "ANALYSIS_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_timeout_message_names_timeout() {
        let err = ScrapeError::RenderTimeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Timeout after 10 seconds");
        assert_eq!(err.failure_kind(), FailureKind::RenderTimeout);
    }

    #[test]
    fn test_sub_second_timeout_is_not_reported_as_zero() {
        let err = ScrapeError::RenderTimeout(Duration::from_millis(50));
        assert_eq!(err.to_string(), "Timeout after 0.05 seconds");
    }

    #[test]
    fn test_service_error_codes() {
        assert_eq!(ServiceError::ScanLimitReached("no".into()).code(), "FREE_LIMIT_REACHED");
        assert_eq!(
            ServiceError::InsufficientContent { chars: 3, threshold: 200 }.code(),
            "INSUFFICIENT_CONTENT"
        );
        assert_eq!(
            ServiceError::Analysis(AnalysisError::FieldMissing("riskScore")).code(),
            "ANALYSIS_FAILED"
        );
    }
}
