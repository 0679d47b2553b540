//! Core traits for endlist's data sources.
//!
//! The engine only reads through these traits, so the PostgreSQL
//! implementations and the in-memory mocks are interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REGISTRATION DATA
// =============================================================================

/// Read access to event registrations.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Check whether the event exists.
    async fn event_exists(&self, event_id: EventId) -> Result<bool>;

    /// Teams registered under the event's contests whose status is one of
    /// [`TeamStatus::PROJECTED`], with contingent and first target group.
    async fn list_candidate_teams(&self, event_id: EventId) -> Result<Vec<CandidateTeam>>;

    /// Members of a team, ordered by name.
    async fn list_team_members(&self, team_id: i64) -> Result<Vec<MemberRecord>>;

    /// Managers linked to a team. May contain duplicates when a manager is
    /// linked more than once.
    async fn list_team_managers(&self, team_id: i64) -> Result<Vec<Manager>>;
}

// =============================================================================
// ATTENDANCE SNAPSHOT
// =============================================================================

/// Read access to the attendance snapshot tables.
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Count and latest `updated_at` of one table for the event.
    async fn read_table(&self, event_id: EventId, table: SnapshotTable) -> Result<TableReading>;

    /// Read all four tables as one unit. Fails if any table fails.
    ///
    /// The default issues the four reads concurrently; implementations may
    /// override it with a single round trip.
    async fn read_all(&self, event_id: EventId) -> Result<Vec<TableReading>> {
        let (contingents, teams, contestants, managers) = tokio::try_join!(
            self.read_table(event_id, SnapshotTable::Contingents),
            self.read_table(event_id, SnapshotTable::Teams),
            self.read_table(event_id, SnapshotTable::Contestants),
            self.read_table(event_id, SnapshotTable::Managers),
        )?;
        Ok(vec![contingents, teams, contestants, managers])
    }
}
