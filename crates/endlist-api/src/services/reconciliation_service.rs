//! Service answering "does attendance match the eligible roster?".
//!
//! This service handles:
//! - Checking that the event exists before any roster or snapshot work
//! - Building the projection and reading the snapshot concurrently
//! - Bounding the whole operation by the configured timeout

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use endlist_core::defaults::{FETCH_CONCURRENCY, REQUEST_TIMEOUT_SECS};
use endlist_core::{
    reconcile, AttendanceRepository, Error, EventId, Projection, ProjectionBuilder,
    ReconciliationReport, Result, RosterRepository, SnapshotReader,
};

/// Reconciliation and roster projection for a single event per call.
///
/// Holds no per-request state; concurrent calls are independent.
#[derive(Clone)]
pub struct ReconciliationService {
    roster: Arc<dyn RosterRepository>,
    projection: ProjectionBuilder,
    snapshot: SnapshotReader,
    timeout: Duration,
}

impl ReconciliationService {
    pub fn new(
        roster: Arc<dyn RosterRepository>,
        attendance: Arc<dyn AttendanceRepository>,
    ) -> Self {
        Self {
            projection: ProjectionBuilder::new(Arc::clone(&roster)),
            snapshot: SnapshotReader::new(attendance),
            roster,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Bound each call to `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Concurrent per-team fetches during projection. Defaults to
    /// [`FETCH_CONCURRENCY`].
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.projection = self.projection.with_concurrency(concurrency);
        self
    }

    /// Compare the expected roster against recorded attendance.
    pub async fn report(&self, event_id: EventId) -> Result<ReconciliationReport> {
        self.bounded(event_id, "report", async {
            self.ensure_exists(event_id).await?;

            let (projection, snapshot) = tokio::join!(
                self.projection.build(event_id),
                self.snapshot.read(event_id)
            );
            let projection = projection?;

            if snapshot.is_degraded() {
                warn!(
                    subsystem = "api",
                    component = "reconciliation",
                    event_id = event_id.get(),
                    unavailable = ?snapshot.unavailable,
                    "Reconciling against a partial attendance snapshot"
                );
            }

            let report = reconcile(
                projection.expected_counts,
                snapshot.counts,
                snapshot.last_sync_date,
            );
            debug!(
                subsystem = "api",
                component = "reconciliation",
                event_id = event_id.get(),
                is_synced = report.is_synced,
                teams_diff = report.differences.teams,
                contestants_diff = report.differences.contestants,
                "Reconciled"
            );
            Ok(report)
        })
        .await
    }

    /// The projected roster with its expected counts.
    pub async fn endlist(&self, event_id: EventId) -> Result<Projection> {
        self.bounded(event_id, "endlist", async {
            self.ensure_exists(event_id).await?;
            self.projection.build(event_id).await
        })
        .await
    }

    async fn ensure_exists(&self, event_id: EventId) -> Result<()> {
        if self.roster.event_exists(event_id).await? {
            Ok(())
        } else {
            Err(Error::EventNotFound(event_id.get()))
        }
    }

    async fn bounded<T, F>(&self, event_id: EventId, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout.as_secs())),
        };

        match &result {
            Ok(_) => info!(
                subsystem = "api",
                component = "reconciliation",
                op,
                event_id = event_id.get(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Request complete"
            ),
            Err(e) => warn!(
                subsystem = "api",
                component = "reconciliation",
                op,
                event_id = event_id.get(),
                duration_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Request failed"
            ),
        }
        result
    }
}
