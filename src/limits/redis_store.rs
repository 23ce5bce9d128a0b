use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use redis::{aio::MultiplexedConnection, Client};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::limits::{ScanDecision, ScanLimiter, ScanPolicy};

/// Counters outlive their day by this long, then expire
const COUNTER_TTL_SECS: u64 = 2 * 24 * 60 * 60;

/// Daily scan counters shared across processes through Redis
pub struct RedisScanLimiter {
    policy: ScanPolicy,

    /// Connection pool
    conn_pool: Arc<Mutex<MultiplexedConnection>>,
}

impl RedisScanLimiter {
    pub async fn new(redis_url: &str, policy: ScanPolicy) -> Result<Self> {
        let client = Client::open(redis_url)
            .context(format!("Failed to connect to Redis at {}", redis_url))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to get Redis connection")?;

        Ok(Self {
            policy,
            conn_pool: Arc::new(Mutex::new(conn)),
        })
    }
}

fn counter_key(user_id: &str, date: NaiveDate) -> String {
    format!("fineprint:scans:{}:{}", user_id, date.format("%Y-%m-%d"))
}

fn reset_command(user_id: &str, date: NaiveDate) -> redis::Cmd {
    let mut cmd = redis::cmd("DEL");
    cmd.arg(counter_key(user_id, date));
    cmd
}

#[async_trait]
impl ScanLimiter for RedisScanLimiter {
    async fn can_scan(&self, user_id: &str) -> Result<ScanDecision> {
        if let Some(decision) = self.policy.exemption(user_id) {
            return Ok(decision);
        }

        let key = counter_key(user_id, Utc::now().date_naive());
        let mut conn = self.conn_pool.lock().await;

        let used: Option<u32> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut *conn)
            .await
            .context("Failed to read scan counter from Redis")?;

        Ok(self.policy.decide(used.unwrap_or(0)))
    }

    async fn record_scan(&self, user_id: &str) -> Result<()> {
        let key = counter_key(user_id, Utc::now().date_naive());
        let mut conn = self.conn_pool.lock().await;

        let count: u32 = redis::cmd("INCR")
            .arg(&key)
            .query_async(&mut *conn)
            .await
            .context("Failed to increment scan counter in Redis")?;

        redis::cmd("EXPIRE")
            .arg(&key)
            .arg(COUNTER_TTL_SECS)
            .query_async::<_, ()>(&mut *conn)
            .await
            .context("Failed to set TTL on scan counter")?;

        debug!("User {} has {} scan(s) today", user_id, count);

        Ok(())
    }

    async fn reset_scans(&self, user_id: &str) -> Result<()> {
        let mut conn = self.conn_pool.lock().await;

        let removed: u32 = reset_command(user_id, Utc::now().date_naive())
            .query_async(&mut *conn)
            .await
            .context("Failed to reset scan counter in Redis")?;

        debug!("Reset scan count for user {} ({} key removed)", user_id, removed);

        Ok(())
    }
}
