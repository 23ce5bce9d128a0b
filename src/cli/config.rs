use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

/// Desktop browser identification shared by the static fetcher and the headless browser
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperSettings,
    pub dynamic: DynamicSettings,
    pub analysis: AnalysisSettings,
    pub scan_limits: ScanLimitSettings,
}

/// Static scraping settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ScraperSettings {
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub max_related_pages: usize,
    /// Minimum characters for a scrape to count as complete
    pub static_content_threshold: usize,
    pub max_content_length: usize,
}

/// Headless browser settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DynamicSettings {
    pub enabled: bool,
    pub webdriver_url: String,
    pub navigation_timeout_secs: u64,
    pub headless: bool,
    /// Quiet period with no new network resources before the page counts as idle
    pub idle_window_ms: u64,
    pub poll_interval_ms: u64,
}

/// LLM analysis settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisSettings {
    pub api_base: String,
    pub model: String,
    /// Falls back to the OPENAI_API_KEY environment variable when unset
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_input_chars: usize,
    pub request_timeout_secs: u64,
}

/// Daily scan-limit settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ScanLimitSettings {
    pub disabled: bool,
    pub backend: String, // "memory", "redis"
    pub redis_url: String,
    pub free_daily_scans: u32,
    pub unlimited_prefixes: Vec<String>,
    pub paid_users: Vec<String>,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: 10,
            max_related_pages: 5,
            static_content_threshold: 200,
            max_content_length: 100_000,
        }
    }
}

impl Default for DynamicSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            webdriver_url: "http://localhost:4444".to_string(),
            navigation_timeout_secs: 10,
            headless: true,
            idle_window_ms: 1000,
            poll_interval_ms: 250,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            temperature: 0.3,
            max_input_chars: 60_000,
            request_timeout_secs: 120,
        }
    }
}

impl Default for ScanLimitSettings {
    fn default() -> Self {
        Self {
            disabled: true,
            backend: "memory".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            free_daily_scans: 1,
            unlimited_prefixes: vec!["admin_".to_string(), "dev_".to_string()],
            paid_users: vec![],
        }
    }
}

impl ScraperSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl DynamicSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl AnalysisSettings {
    /// Resolve the API key from the config file or the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|key| !key.is_empty()))
    }
}

impl AppConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        let path = if let Some(proj_dirs) = directories::ProjectDirs::from("com", "fineprint", "fineprint") {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        };

        if !path.exists() {
            if let Err(e) = fs::create_dir_all(&path) {
                error!("Failed to create config directory: {}", e);
            }
        }

        path
    }

    /// Path of the default configuration file
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("default.yaml")
    }

    /// Load the default configuration, writing it out on first use
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            info!("Default configuration not found. Creating...");
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))
    }

    /// Parse configuration from YAML; missing sections take their defaults
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let contents = serde_yaml::to_string(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, contents)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }
}
