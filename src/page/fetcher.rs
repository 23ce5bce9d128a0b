use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

use crate::error::FetchError;

/// Raw markup of a fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: Url,
    pub body: String,
}

/// Add `https://` when the URL has no scheme
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Single-shot HTTP GET with redirects, a timeout and a browser user agent.
///
/// No retries happen here; a failed fetch is terminal for that attempt.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let url = normalize_url(url);
        let parsed = Url::parse(&url).map_err(|e| FetchError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        info!("Fetching URL: {}", url);

        let response = self.client.get(parsed).send().await.map_err(|e| {
            error!("Failed to fetch {}: {}", url, e);
            FetchError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Failed to fetch {}: HTTP {}", url, status);
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await?;

        info!("Successfully fetched {} characters from {}", body.chars().count(), final_url);

        Ok(FetchedPage { final_url, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com/promo"), "https://example.com/promo");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("  https://example.com "), "https://example.com");
    }
}
