//! Database connection pool management.
//!
//! A single report holds up to `2 × FETCH_CONCURRENCY` roster queries
//! (members and managers per team) plus the snapshot reads at once, so the
//! pool is sized against that width rather than against request count.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use endlist_core::defaults::{DB_MAX_CONNECTIONS, REQUEST_TIMEOUT_SECS};
use endlist_core::{Error, Result, SnapshotTable};

/// Pool size and how long a query may wait for a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// Bounded by the request timeout; waiting longer cannot produce a report.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Connections one report can hold at the same time.
pub fn report_fan_out(fetch_concurrency: usize) -> u32 {
    let roster = fetch_concurrency.max(1).saturating_mul(2);
    let snapshot = SnapshotTable::ALL.len();
    u32::try_from(roster.saturating_add(snapshot)).unwrap_or(u32::MAX)
}

/// Create a pool with the default size and acquire timeout.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "create",
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Warn when the pool cannot serve one report's fan-out without queueing.
///
/// Returns `true` when `max_connections` covers the fan-out.
pub fn check_capacity(config: &PoolConfig, fetch_concurrency: usize) -> bool {
    let needed = report_fan_out(fetch_concurrency);
    let fits = config.max_connections >= needed;
    if !fits {
        warn!(
            subsystem = "database",
            component = "pool",
            max_connections = config.max_connections,
            fetch_concurrency,
            needed,
            "Pool is smaller than one report's fan-out; queries will queue for connections"
        );
    }
    fits
}

/// Log idle connections against one report's fan-out.
pub fn log_pool_metrics(pool: &PgPool, fetch_concurrency: usize) {
    let size = pool.size();
    let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX);
    let needed = report_fan_out(fetch_concurrency);

    debug!(
        subsystem = "database",
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        needed,
        "Pool health check"
    );

    if size > 0 && idle < needed {
        warn!(
            subsystem = "database",
            component = "pool",
            pool_size = size,
            pool_idle = idle,
            needed,
            "Fewer idle connections than one report's fan-out"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_config_follows_request_timeout() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, DB_MAX_CONNECTIONS);
        assert_eq!(
            config.acquire_timeout,
            Duration::from_secs(REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_report_fan_out() {
        assert_eq!(report_fan_out(8), 20);
        assert_eq!(report_fan_out(1), 6);
        assert_eq!(report_fan_out(0), 6);
    }

    #[test]
    fn test_check_capacity() {
        let config = PoolConfig::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5));
        assert!(check_capacity(&config, 3));
        assert!(!check_capacity(&config, 4));
        assert!(check_capacity(&config.max_connections(20), 8));
    }
}
