//! Expected-vs-actual comparison.

use chrono::{DateTime, Utc};

use crate::models::{DimensionCounts, ReconciliationReport};

/// Build the report from projected and snapshot counts.
///
/// Differences are signed `expected - actual`; the event is in sync only when
/// every difference is zero.
pub fn reconcile(
    expected: DimensionCounts,
    actual: DimensionCounts,
    last_sync_date: Option<DateTime<Utc>>,
) -> ReconciliationReport {
    let differences = expected.minus(&actual);
    ReconciliationReport {
        is_synced: differences.is_zero(),
        last_sync_date,
        expected_counts: expected,
        actual_counts: actual,
        differences,
    }
}
