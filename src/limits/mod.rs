pub mod memory;
pub mod redis_store;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cli::config::ScanLimitSettings;

pub use memory::MemoryScanLimiter;
pub use redis_store::RedisScanLimiter;

/// Whether a user may run another scan, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanDecision {
    pub allowed: bool,
    pub reason: String,
}

impl ScanDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Per-user daily scan gate
#[async_trait]
pub trait ScanLimiter: Send + Sync {
    /// Consulted before scraping
    async fn can_scan(&self, user_id: &str) -> Result<ScanDecision>;

    /// Called after a successful analysis
    async fn record_scan(&self, user_id: &str) -> Result<()>;

    /// Forget today's scans for a user
    async fn reset_scans(&self, user_id: &str) -> Result<()>;
}

/// Rules shared by every limiter backend
#[derive(Debug, Clone)]
pub struct ScanPolicy {
    disabled: bool,
    free_daily_scans: u32,
    unlimited_prefixes: Vec<String>,
    paid_users: HashSet<String>,
}

impl ScanPolicy {
    pub fn from_settings(settings: &ScanLimitSettings) -> Self {
        Self {
            disabled: settings.disabled,
            free_daily_scans: settings.free_daily_scans,
            unlimited_prefixes: settings.unlimited_prefixes.clone(),
            paid_users: settings.paid_users.iter().cloned().collect(),
        }
    }

    /// Decision for users the daily quota does not apply to
    pub fn exemption(&self, user_id: &str) -> Option<ScanDecision> {
        if self.disabled {
            return Some(ScanDecision::allow("Scan limits disabled"));
        }

        if self.unlimited_prefixes.iter().any(|prefix| user_id.starts_with(prefix.as_str())) {
            return Some(ScanDecision::allow("Developer unlimited scans"));
        }

        if self.paid_users.contains(user_id) {
            return Some(ScanDecision::allow("Unlimited scans available"));
        }

        None
    }

    /// Decision for a free user who has used `used_today` scans
    pub fn decide(&self, used_today: u32) -> ScanDecision {
        if used_today >= self.free_daily_scans {
            ScanDecision::deny(format!(
                "You have used your {} free scan(s) for today. Upgrade to get unlimited scans.",
                self.free_daily_scans
            ))
        } else {
            ScanDecision::allow(format!(
                "Free scan available ({} remaining today)",
                self.free_daily_scans - used_today
            ))
        }
    }
}

/// Build the limiter backend named in the settings
pub async fn create_limiter(settings: &ScanLimitSettings) -> Result<Arc<dyn ScanLimiter>> {
    let policy = ScanPolicy::from_settings(settings);

    match settings.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryScanLimiter::new(policy))),
        "redis" => {
            let limiter = RedisScanLimiter::new(&settings.redis_url, policy).await?;
            Ok(Arc::new(limiter))
        }
        other => anyhow::bail!("Unsupported scan limit backend: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ScanPolicy {
        ScanPolicy::from_settings(&ScanLimitSettings {
            disabled: false,
            paid_users: vec!["paying-customer".to_string()],
            ..ScanLimitSettings::default()
        })
    }

    #[test]
    fn test_exemptions() {
        let policy = policy();
        assert!(policy.exemption("admin_alice").unwrap().allowed);
        assert!(policy.exemption("dev_bob").unwrap().allowed);
        assert!(policy.exemption("paying-customer").unwrap().allowed);
        assert!(policy.exemption("user123").is_none());
    }

    #[test]
    fn test_disabled_exempts_everyone() {
        let policy = ScanPolicy::from_settings(&ScanLimitSettings::default());
        assert_eq!(policy.exemption("user123").unwrap().reason, "Scan limits disabled");
    }

    #[test]
    fn test_daily_quota() {
        let policy = policy();
        assert!(policy.decide(0).allowed);
        let denied = policy.decide(1);
        assert!(!denied.allowed);
        assert!(denied.reason.contains("free scan"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let settings = ScanLimitSettings {
            backend: "carrier-pigeon".to_string(),
            ..ScanLimitSettings::default()
        };
        let result = tokio_test::block_on(create_limiter(&settings));
        assert!(result.is_err());
    }
}
