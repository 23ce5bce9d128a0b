use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::launcher::{BrowserLauncher, BrowserPage};
use crate::cli::config::DynamicSettings;
use crate::error::ScrapeError;

/// Extra page-load allowance so the caller's navigation deadline fires first
const PAGE_LOAD_GRACE: Duration = Duration::from_secs(5);

/// Counts fetch/XHR requests still in flight and lifts the resource timing
/// buffer cap. Installed before any page script runs, and again after
/// navigation in case the early install was unavailable.
const NETWORK_TRACKER: &str = r#"(function () {
  if (window.__fineprintNet) { return; }
  var net = window.__fineprintNet = { inflight: 0 };
  var done = function () { net.inflight = Math.max(0, net.inflight - 1); };
  if (window.performance && performance.setResourceTimingBufferSize) {
    performance.setResourceTimingBufferSize(100000);
  }
  if (window.fetch) {
    var fetch = window.fetch;
    window.fetch = function () {
      net.inflight++;
      return fetch.apply(this, arguments).then(
        function (response) { done(); return response; },
        function (error) { done(); throw error; });
    };
  }
  if (window.XMLHttpRequest) {
    var send = XMLHttpRequest.prototype.send;
    XMLHttpRequest.prototype.send = function () {
      net.inflight++;
      this.addEventListener('loadend', done);
      return send.apply(this, arguments);
    };
  }
})();"#;

const NETWORK_PROBE: &str = "return [document.readyState, \
performance.getEntriesByType('resource').length, \
window.__fineprintNet ? window.__fineprintNet.inflight : 0];";

/// One sample of the page's network activity
#[derive(Debug, Clone, PartialEq, Eq)]
struct NetworkSample {
    ready_state: String,
    /// Completed resource timing entries
    resources: u64,
    /// fetch/XHR requests not yet settled
    inflight: u64,
}

impl NetworkSample {
    fn settled(&self) -> bool {
        self.ready_state == "complete" && self.inflight == 0
    }
}

/// Launches one fresh WebDriver session per render
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    settings: DynamicSettings,
    user_agent: String,
}

impl WebDriverLauncher {
    pub fn new(settings: DynamicSettings, user_agent: impl Into<String>) -> Self {
        Self {
            settings,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserPage>, ScrapeError> {
        let session = RenderSession::open(&self.settings, &self.user_agent).await?;
        Ok(Box::new(session))
    }
}

/// Headless browser session used for a single page render
pub struct RenderSession {
    /// WebDriver instance; `None` once closed
    driver: Option<WebDriver>,

    idle_window: Duration,

    poll_interval: Duration,
}

impl RenderSession {
    /// Start a new isolated browser session
    pub async fn open(settings: &DynamicSettings, user_agent: &str) -> Result<Self, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();

        // Same identification as the static fetcher
        caps.add_chrome_arg(&format!("--user-agent={}", user_agent))?;
        caps.add_chrome_arg("--incognito")?;
        caps.add_chrome_arg("--disable-dev-shm-usage")?;
        caps.add_chrome_arg("--disable-blink-features=AutomationControlled")?;

        if settings.headless {
            caps.set_headless()?;
        }

        let driver = WebDriver::new(&settings.webdriver_url, caps)
            .await
            .map_err(|e| ScrapeError::Render(format!("Failed to start browser session: {}", e)))?;

        let session = Self {
            driver: Some(driver),
            idle_window: Duration::from_millis(settings.idle_window_ms),
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(10)),
        };

        session
            .driver()?
            .set_page_load_timeout(settings.navigation_timeout() + PAGE_LOAD_GRACE)
            .await?;

        session.install_network_tracker().await;

        debug!("Browser session started at {}", settings.webdriver_url);

        Ok(session)
    }

    fn driver(&self) -> Result<&WebDriver, ScrapeError> {
        self.driver
            .as_ref()
            .ok_or_else(|| ScrapeError::Render("Browser session already closed".to_string()))
    }

    /// Register the request tracker for every document this session opens
    async fn install_network_tracker(&self) {
        let Ok(driver) = self.driver() else { return };
        let dev_tools = ChromeDevTools::new(driver.handle.clone());
        let params = json!({ "source": NETWORK_TRACKER });

        if let Err(e) = dev_tools
            .execute_cdp_with_params("Page.addScriptToEvaluateOnNewDocument", params)
            .await
        {
            warn!("Could not pre-install network tracker: {}", e);
        }
    }

    /// Poll until the document is complete, no fetch/XHR is in flight and
    /// no new resources have finished for `idle_window`.
    ///
    /// Has no deadline of its own; callers bound it.
    async fn wait_for_network_idle(&self) -> Result<(), ScrapeError> {
        let driver = self.driver()?;
        driver.execute(NETWORK_TRACKER, Vec::new()).await?;

        let mut last: Option<NetworkSample> = None;
        let mut stable = Duration::ZERO;

        loop {
            let probe = driver.execute(NETWORK_PROBE, Vec::new()).await?;
            let sample = parse_probe(probe.json());

            if sample.settled() && last.as_ref() == Some(&sample) {
                stable += self.poll_interval;
                if stable >= self.idle_window {
                    debug!("Network idle after {} resources", sample.resources);
                    return Ok(());
                }
            } else {
                stable = Duration::ZERO;
            }

            last = Some(sample);
            sleep(self.poll_interval).await;
        }
    }
}

fn parse_probe(value: &Value) -> NetworkSample {
    NetworkSample {
        ready_state: value
            .get(0)
            .and_then(Value::as_str)
            .unwrap_or("loading")
            .to_string(),
        resources: value.get(1).and_then(Value::as_u64).unwrap_or(0),
        inflight: value.get(2).and_then(Value::as_u64).unwrap_or(0),
    }
}

#[async_trait]
impl BrowserPage for RenderSession {
    async fn load(&mut self, url: &str) -> Result<(), ScrapeError> {
        info!("Navigating to: {}", url);
        self.driver()?.goto(url).await?;
        self.wait_for_network_idle().await
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        let url = self.driver()?.current_url().await?;
        Ok(url.to_string())
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        Ok(self.driver()?.source().await?)
    }

    async fn close(&mut self) {
        // Keep the handle until quit finishes so an abandoned close still
        // reaches the drop fallback
        if let Some(driver) = self.driver.clone() {
            if let Err(e) = driver.quit().await {
                error!("Error closing browser session: {}", e);
            }
            self.driver = None;
            debug!("Browser session closed");
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = driver.quit().await {
                            error!("Error closing browser session during drop: {}", e);
                        }
                    });
                }
                Err(_) => error!("Browser session dropped outside a runtime; session left open"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(ready_state: &str, resources: u64, inflight: u64) -> NetworkSample {
        NetworkSample {
            ready_state: ready_state.to_string(),
            resources,
            inflight,
        }
    }

    #[test]
    fn test_parse_probe() {
        assert_eq!(parse_probe(&json!(["complete", 12, 0])), sample("complete", 12, 0));
        assert_eq!(parse_probe(&json!(["interactive", 3, 2])), sample("interactive", 3, 2));
        assert_eq!(parse_probe(&json!(null)), sample("loading", 0, 0));
    }

    #[test]
    fn test_pending_request_keeps_page_busy() {
        // Document done, API call still running
        assert!(!parse_probe(&json!(["complete", 40, 1])).settled());
        assert!(parse_probe(&json!(["complete", 40, 0])).settled());
        assert!(!parse_probe(&json!(["interactive", 40, 0])).settled());
    }

    #[test]
    fn test_probe_without_tracker_reads_as_no_inflight() {
        assert_eq!(parse_probe(&json!(["complete", 7])).inflight, 0);
    }

    #[test]
    fn test_tracker_lifts_resource_buffer_cap() {
        assert!(NETWORK_TRACKER.contains("setResourceTimingBufferSize"));
        assert!(NETWORK_PROBE.contains("__fineprintNet"));
    }
}
