use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::limits::{ScanDecision, ScanLimiter, ScanPolicy};

#[derive(Debug, Clone, Copy)]
struct DailyUsage {
    date: NaiveDate,
    count: u32,
}

/// Process-local scan counters; reset when the process restarts
pub struct MemoryScanLimiter {
    policy: ScanPolicy,
    usage: Mutex<HashMap<String, DailyUsage>>,
}

impl MemoryScanLimiter {
    pub fn new(policy: ScanPolicy) -> Self {
        Self {
            policy,
            usage: Mutex::new(HashMap::new()),
        }
    }

    async fn used_on(&self, user_id: &str, date: NaiveDate) -> u32 {
        let usage = self.usage.lock().await;
        usage
            .get(user_id)
            .filter(|record| record.date == date)
            .map_or(0, |record| record.count)
    }

    async fn can_scan_on(&self, user_id: &str, date: NaiveDate) -> ScanDecision {
        if let Some(decision) = self.policy.exemption(user_id) {
            return decision;
        }
        self.policy.decide(self.used_on(user_id, date).await)
    }

    async fn record_scan_on(&self, user_id: &str, date: NaiveDate) {
        let mut usage = self.usage.lock().await;
        let record = usage
            .entry(user_id.to_string())
            .or_insert(DailyUsage { date, count: 0 });

        if record.date != date {
            *record = DailyUsage { date, count: 0 };
        }
        record.count += 1;

        debug!("User {} has {} scan(s) on {}", user_id, record.count, date);
    }
}

#[async_trait]
impl ScanLimiter for MemoryScanLimiter {
    async fn can_scan(&self, user_id: &str) -> Result<ScanDecision> {
        Ok(self.can_scan_on(user_id, Utc::now().date_naive()).await)
    }

    async fn record_scan(&self, user_id: &str) -> Result<()> {
        self.record_scan_on(user_id, Utc::now().date_naive()).await;
        Ok(())
    }

    async fn reset_scans(&self, user_id: &str) -> Result<()> {
        if self.usage.lock().await.remove(user_id).is_some() {
            debug!("Reset scan count for user {}", user_id);
        }
        Ok(())
    }
}
