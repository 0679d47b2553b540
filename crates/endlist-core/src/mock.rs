//! In-memory repositories for deterministic testing.
//!
//! ## Usage
//!
//! ```rust
//! use endlist_core::mock::{self, MockRosterRepository};
//! use endlist_core::TeamStatus;
//!
//! let tg = mock::target_group(1, "Primary", Some(10), Some(12));
//! let repo = MockRosterRepository::new().with_event(42).with_team(
//!     mock::candidate(1, "Team A", TeamStatus::Approved, mock::school(10, "SK Alpha", "JOHOR"), Some(tg)),
//!     vec![mock::member(1, "Ali", "11")],
//!     vec![mock::manager(100, "Cikgu M")],
//! );
//! assert_eq!(repo.store_calls(), 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::{AttendanceRepository, RosterRepository};

fn store_error(msg: impl Into<String>) -> Error {
    Error::Database(sqlx::Error::Protocol(msg.into()))
}

// =============================================================================
// FIXTURE BUILDERS
// =============================================================================

pub fn target_group(id: i64, school_level: &str, min_age: Option<i32>, max_age: Option<i32>) -> TargetGroup {
    TargetGroup {
        id,
        school_level: school_level.to_string(),
        min_age,
        max_age,
    }
}

/// School contingent with a PPD derived from the name.
pub fn school(id: i64, name: &str, state: &str) -> ContingentRecord {
    ContingentRecord {
        id,
        institution: Institution::School(Some(SchoolRecord {
            name: name.to_string(),
            state: Some(state.to_string()),
            ppd: Some(format!("PPD {}", name)),
        })),
    }
}

pub fn independent(id: i64, name: &str, state: &str) -> ContingentRecord {
    ContingentRecord {
        id,
        institution: Institution::Independent(Some(InstitutionRecord {
            name: name.to_string(),
            state: Some(state.to_string()),
        })),
    }
}

pub fn candidate(
    id: i64,
    name: &str,
    status: TeamStatus,
    contingent: ContingentRecord,
    target_group: Option<TargetGroup>,
) -> CandidateTeam {
    CandidateTeam {
        id,
        name: name.to_string(),
        contest_name: "Robotics Challenge".to_string(),
        status,
        registered_at: Utc
            .with_ymd_and_hms(2026, 1, 15, 9, 0, 0)
            .single()
            .unwrap_or_default(),
        contingent,
        target_group,
    }
}

pub fn member(id: i64, name: &str, age: &str) -> MemberRecord {
    MemberRecord {
        id,
        name: name.to_string(),
        email: None,
        national_id: format!("000000-00-{:04}", id),
        education_level: None,
        class_grade: None,
        age: Some(age.to_string()),
    }
}

pub fn manager(id: i64, name: &str) -> Manager {
    Manager {
        id,
        name: name.to_string(),
        email: None,
    }
}

// =============================================================================
// ROSTER
// =============================================================================

#[derive(Debug, Clone)]
struct MockTeam {
    candidate: CandidateTeam,
    members: Vec<MemberRecord>,
    managers: Vec<Manager>,
}

/// Mock registration store.
#[derive(Clone, Default)]
pub struct MockRosterRepository {
    events: HashSet<i64>,
    teams: Vec<MockTeam>,
    fail_candidates: bool,
    fail_members: HashSet<i64>,
    fail_managers: HashSet<i64>,
    calls: Arc<AtomicUsize>,
}

impl MockRosterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event_id: i64) -> Self {
        self.events.insert(event_id);
        self
    }

    /// Register a team under every known event.
    pub fn with_team(
        mut self,
        candidate: CandidateTeam,
        members: Vec<MemberRecord>,
        managers: Vec<Manager>,
    ) -> Self {
        self.teams.push(MockTeam {
            candidate,
            members,
            managers,
        });
        self
    }

    /// Make the candidate query fail.
    pub fn failing_candidates(mut self) -> Self {
        self.fail_candidates = true;
        self
    }

    pub fn failing_members_for(mut self, team_id: i64) -> Self {
        self.fail_members.insert(team_id);
        self
    }

    pub fn failing_managers_for(mut self, team_id: i64) -> Self {
        self.fail_managers.insert(team_id);
        self
    }

    /// Number of repository calls made so far.
    pub fn store_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RosterRepository for MockRosterRepository {
    async fn event_exists(&self, event_id: EventId) -> Result<bool> {
        self.record_call();
        Ok(self.events.contains(&event_id.get()))
    }

    async fn list_candidate_teams(&self, event_id: EventId) -> Result<Vec<CandidateTeam>> {
        self.record_call();
        if self.fail_candidates {
            return Err(store_error("candidate query failed"));
        }
        if !self.events.contains(&event_id.get()) {
            return Ok(Vec::new());
        }
        Ok(self
            .teams
            .iter()
            .filter(|t| t.candidate.status.is_projected())
            .map(|t| t.candidate.clone())
            .collect())
    }

    async fn list_team_members(&self, team_id: i64) -> Result<Vec<MemberRecord>> {
        self.record_call();
        if self.fail_members.contains(&team_id) {
            return Err(store_error(format!("member query failed for team {}", team_id)));
        }
        let mut members: Vec<MemberRecord> = self
            .teams
            .iter()
            .filter(|t| t.candidate.id == team_id)
            .flat_map(|t| t.members.clone())
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn list_team_managers(&self, team_id: i64) -> Result<Vec<Manager>> {
        self.record_call();
        if self.fail_managers.contains(&team_id) {
            return Err(Error::Serialization(format!(
                "expected manager array for team {}",
                team_id
            )));
        }
        Ok(self
            .teams
            .iter()
            .filter(|t| t.candidate.id == team_id)
            .flat_map(|t| t.managers.clone())
            .collect())
    }
}

// =============================================================================
// ATTENDANCE
// =============================================================================

/// Mock attendance snapshot tables.
///
/// Tables neither configured nor marked missing read as empty.
#[derive(Clone, Default)]
pub struct MockAttendanceRepository {
    tables: HashMap<SnapshotTable, TableReading>,
    missing: HashSet<SnapshotTable>,
    coordinated: Arc<AtomicUsize>,
    isolated: Arc<AtomicUsize>,
}

impl MockAttendanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(
        mut self,
        table: SnapshotTable,
        count: i64,
        last_updated: Option<chrono::DateTime<Utc>>,
    ) -> Self {
        self.tables.insert(
            table,
            TableReading {
                table,
                count,
                last_updated,
            },
        );
        self
    }

    /// Make a table behave as if it does not exist.
    pub fn missing_table(mut self, table: SnapshotTable) -> Self {
        self.missing.insert(table);
        self
    }

    /// Number of coordinated (all-table) reads.
    pub fn coordinated_reads(&self) -> usize {
        self.coordinated.load(Ordering::SeqCst)
    }

    /// Number of single-table reads.
    pub fn isolated_reads(&self) -> usize {
        self.isolated.load(Ordering::SeqCst)
    }

    fn reading(&self, table: SnapshotTable) -> Result<TableReading> {
        if self.missing.contains(&table) {
            return Err(store_error(format!(
                "relation \"{}\" does not exist",
                table.table_name()
            )));
        }
        Ok(self.tables.get(&table).copied().unwrap_or(TableReading {
            table,
            count: 0,
            last_updated: None,
        }))
    }
}

#[async_trait]
impl AttendanceRepository for MockAttendanceRepository {
    async fn read_table(&self, _event_id: EventId, table: SnapshotTable) -> Result<TableReading> {
        self.isolated.fetch_add(1, Ordering::SeqCst);
        self.reading(table)
    }

    async fn read_all(&self, _event_id: EventId) -> Result<Vec<TableReading>> {
        self.coordinated.fetch_add(1, Ordering::SeqCst);
        SnapshotTable::ALL
            .into_iter()
            .map(|table| self.reading(table))
            .collect()
    }
}
