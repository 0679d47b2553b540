//! Attendance snapshot repository implementation.
//!
//! Table names come from [`SnapshotTable::table_name`], a fixed set, so they
//! are safe to interpolate into SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use endlist_core::{AttendanceRepository, Error, EventId, Result, SnapshotTable, TableReading};

/// PostgreSQL implementation of AttendanceRepository.
#[derive(Clone)]
pub struct PgAttendanceRepository {
    pool: Pool<Postgres>,
}

impl PgAttendanceRepository {
    /// Create a new PgAttendanceRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Single statement reading count and latest update of every snapshot table.
///
/// Fails as a whole if any table is missing.
pub(crate) fn coordinated_sql() -> String {
    let columns: Vec<String> = SnapshotTable::ALL
        .iter()
        .map(|table| {
            let name = table.table_name();
            format!(
                "(SELECT COUNT(*) FROM {name} WHERE event_id = $1) AS {name}_count, \
                 (SELECT MAX(updated_at) FROM {name} WHERE event_id = $1) AS {name}_updated"
            )
        })
        .collect();
    format!("SELECT {}", columns.join(", "))
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn read_table(&self, event_id: EventId, table: SnapshotTable) -> Result<TableReading> {
        let sql = format!(
            "SELECT COUNT(*) AS count, MAX(updated_at) AS last_updated FROM {} WHERE event_id = $1",
            table.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(event_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(TableReading {
            table,
            count: row.try_get("count")?,
            last_updated: row.try_get("last_updated")?,
        })
    }

    async fn read_all(&self, event_id: EventId) -> Result<Vec<TableReading>> {
        let row = sqlx::query(&coordinated_sql())
            .bind(event_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let readings = SnapshotTable::ALL
            .iter()
            .map(|&table| {
                let name = table.table_name();
                let count: i64 = row.try_get(format!("{}_count", name).as_str())?;
                let last_updated: Option<DateTime<Utc>> =
                    row.try_get(format!("{}_updated", name).as_str())?;
                Ok(TableReading {
                    table,
                    count,
                    last_updated,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "database",
            component = "attendance",
            op = "read_all",
            event_id = event_id.get(),
            "Coordinated snapshot read complete"
        );
        Ok(readings)
    }
}
