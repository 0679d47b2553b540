//! Attendance snapshot reader.
//!
//! Reads the four attendance tables in two phases:
//!
//! 1. One coordinated read of all four tables
//! 2. If that fails, each table is read on its own; a table that still fails
//!    counts as 0 and is left out of the last-sync computation
//!
//! Reading never fails as a whole.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::models::{AttendanceSnapshot, DimensionCounts, EventId, SnapshotTable, TableReading};
use crate::traits::AttendanceRepository;

/// Reads [`AttendanceSnapshot`]s from an [`AttendanceRepository`].
#[derive(Clone)]
pub struct SnapshotReader {
    attendance: Arc<dyn AttendanceRepository>,
}

impl SnapshotReader {
    pub fn new(attendance: Arc<dyn AttendanceRepository>) -> Self {
        Self { attendance }
    }

    /// Read actual attendance counts for an event.
    pub async fn read(&self, event_id: EventId) -> AttendanceSnapshot {
        let start = Instant::now();

        let snapshot = match self.attendance.read_all(event_id).await {
            Ok(readings) => summarize(readings, Vec::new()),
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    component = "snapshot",
                    op = "read_all",
                    event_id = event_id.get(),
                    error = %e,
                    "Coordinated snapshot read failed, reading tables individually"
                );
                self.read_isolated(event_id).await
            }
        };

        debug!(
            subsystem = "engine",
            component = "snapshot",
            op = "read",
            event_id = event_id.get(),
            degraded = snapshot.is_degraded(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Attendance snapshot read"
        );
        snapshot
    }

    async fn read_isolated(&self, event_id: EventId) -> AttendanceSnapshot {
        let results = futures::future::join_all(SnapshotTable::ALL.into_iter().map(|table| {
            let attendance = Arc::clone(&self.attendance);
            async move { (table, attendance.read_table(event_id, table).await) }
        }))
        .await;

        let mut readings = Vec::with_capacity(results.len());
        let mut unavailable = Vec::new();
        for (table, result) in results {
            match result {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    warn!(
                        subsystem = "engine",
                        component = "snapshot",
                        op = "read_table",
                        event_id = event_id.get(),
                        snapshot_table = %table,
                        error = %e,
                        "Snapshot table unavailable, reporting 0"
                    );
                    unavailable.push(table);
                }
            }
        }
        summarize(readings, unavailable)
    }
}

/// Fold table readings into counts and the latest update time.
pub fn summarize(readings: Vec<TableReading>, unavailable: Vec<SnapshotTable>) -> AttendanceSnapshot {
    let mut counts = DimensionCounts::default();
    for reading in &readings {
        counts.set(reading.table, reading.count.max(0));
    }
    let last_sync_date = readings.iter().filter_map(|r| r.last_updated).max();

    AttendanceSnapshot {
        counts,
        last_sync_date,
        unavailable,
    }
}
