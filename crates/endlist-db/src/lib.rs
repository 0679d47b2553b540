//! # endlist-db
//!
//! PostgreSQL database layer for endlist.
//!
//! This crate provides:
//! - Connection pool management
//! - The registration repository (candidate teams, members, managers)
//! - The attendance snapshot repository
//!
//! ## Example
//!
//! ```rust,ignore
//! use endlist_db::{Database, EventId, RosterRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/endlist").await?;
//!     let exists = db.roster.event_exists(EventId::new(42)?).await?;
//!     println!("event 42 exists: {}", exists);
//!     Ok(())
//! }
//! ```
pub mod attendance;
pub mod pool;
pub mod roster;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use endlist_core::*;

pub use attendance::PgAttendanceRepository;
pub use pool::{
    check_capacity, create_pool, create_pool_with_config, log_pool_metrics, report_fan_out,
    PoolConfig,
};
pub use roster::PgRosterRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Registration data (teams, members, managers).
    pub roster: PgRosterRepository,
    /// Attendance snapshot tables.
    pub attendance: PgAttendanceRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            roster: PgRosterRepository::new(pool.clone()),
            attendance: PgAttendanceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
