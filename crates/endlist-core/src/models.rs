//! Core data models for endlist.
//!
//! Registration rows as the store returns them, the projected roster derived
//! from them, and the attendance/reconciliation summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Validated event identifier (always a positive integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wrap an already-numeric id, rejecting zero and negatives.
    pub fn new(id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidInput(format!(
                "event id must be a positive integer, got {}",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for EventId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: i64 = s.trim().parse().map_err(|_| {
            Error::InvalidInput(format!("event id must be a positive integer, got '{}'", s))
        })?;
        Self::new(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// REFERENCE DATA
// =============================================================================

/// Age/level band a contest's teams must fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub id: i64,
    pub school_level: String,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

impl TargetGroup {
    /// Display label for the school level ("Kids", "Teens", "Youth"), or the
    /// raw level when it has no short form.
    pub fn display_label(&self) -> String {
        match self.school_level.trim().to_lowercase().as_str() {
            "primary" => "Kids".to_string(),
            "secondary" => "Teens".to_string(),
            "higher education" => "Youth".to_string(),
            _ => self.school_level.clone(),
        }
    }
}

/// Registration status of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamStatus {
    Approved,
    Accepted,
    ApprovedSpecial,
    /// Any status that never makes it into a projection.
    Other,
}

impl TeamStatus {
    /// Statuses the candidate query admits.
    pub const PROJECTED: [TeamStatus; 3] = [
        TeamStatus::Approved,
        TeamStatus::Accepted,
        TeamStatus::ApprovedSpecial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TeamStatus::Approved => "APPROVED",
            TeamStatus::Accepted => "ACCEPTED",
            TeamStatus::ApprovedSpecial => "APPROVED_SPECIAL",
            TeamStatus::Other => "OTHER",
        }
    }

    pub fn is_projected(self) -> bool {
        Self::PROJECTED.contains(&self)
    }
}

impl From<&str> for TeamStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "APPROVED" => TeamStatus::Approved,
            "ACCEPTED" => TeamStatus::Accepted,
            "APPROVED_SPECIAL" => TeamStatus::ApprovedSpecial,
            _ => TeamStatus::Other,
        }
    }
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONTINGENTS
// =============================================================================

/// Institutional category of a contingent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContingentKind {
    School,
    HigherInstitution,
    Independent,
}

impl ContingentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContingentKind::School => "SCHOOL",
            ContingentKind::HigherInstitution => "HIGHER_INSTITUTION",
            ContingentKind::Independent => "INDEPENDENT",
        }
    }
}

impl FromStr for ContingentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "SCHOOL" => Ok(ContingentKind::School),
            "HIGHER_INSTITUTION" => Ok(ContingentKind::HigherInstitution),
            "INDEPENDENT" => Ok(ContingentKind::Independent),
            other => Err(Error::InvalidInput(format!(
                "unknown contingent type '{}'",
                other
            ))),
        }
    }
}

/// School linked to a school contingent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolRecord {
    pub name: String,
    pub state: Option<String>,
    pub ppd: Option<String>,
}

/// Higher institution or independent group linked to a contingent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionRecord {
    pub name: String,
    pub state: Option<String>,
}

/// The one institutional branch a contingent belongs to.
///
/// The inner record is `None` when the contingent's type names a branch whose
/// linked row is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Institution {
    School(Option<SchoolRecord>),
    HigherInstitution(Option<InstitutionRecord>),
    Independent(Option<InstitutionRecord>),
    /// Contingent type not recognized.
    Unresolved { kind: String },
}

impl Institution {
    /// Select the branch named by `kind`, ignoring links to the other two.
    pub fn from_parts(
        kind: &str,
        school: Option<SchoolRecord>,
        higher_institution: Option<InstitutionRecord>,
        independent: Option<InstitutionRecord>,
    ) -> Self {
        match kind.parse::<ContingentKind>() {
            Ok(ContingentKind::School) => Institution::School(school),
            Ok(ContingentKind::HigherInstitution) => {
                Institution::HigherInstitution(higher_institution)
            }
            Ok(ContingentKind::Independent) => Institution::Independent(independent),
            Err(_) => Institution::Unresolved {
                kind: kind.to_string(),
            },
        }
    }

    pub fn kind(&self) -> Option<ContingentKind> {
        match self {
            Institution::School(_) => Some(ContingentKind::School),
            Institution::HigherInstitution(_) => Some(ContingentKind::HigherInstitution),
            Institution::Independent(_) => Some(ContingentKind::Independent),
            Institution::Unresolved { .. } => None,
        }
    }
}

/// Contingent as stored: id plus its institutional link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContingentRecord {
    pub id: i64,
    pub institution: Institution,
}

/// Contingent with display name, state and district resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContingent {
    pub id: i64,
    pub kind: Option<ContingentKind>,
    pub name: String,
    pub state: String,
    pub ppd: String,
}

// =============================================================================
// TEAMS AND MEMBERS
// =============================================================================

/// Team row returned by the candidate query, before members are attached.
#[derive(Debug, Clone)]
pub struct CandidateTeam {
    pub id: i64,
    pub name: String,
    pub contest_name: String,
    pub status: TeamStatus,
    pub registered_at: DateTime<Utc>,
    pub contingent: ContingentRecord,
    /// First target group of the team's contest, if any.
    pub target_group: Option<TargetGroup>,
}

/// Contestant row as stored.
#[derive(Debug, Clone, Default)]
pub struct MemberRecord {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub national_id: String,
    pub education_level: Option<String>,
    pub class_grade: Option<String>,
    /// Raw stored age; may be missing or non-numeric.
    pub age: Option<String>,
}

/// Team member in a projected roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub national_id: String,
    pub education_level: Option<String>,
    pub class_grade: Option<String>,
    pub formatted_class_grade: String,
    /// Parsed age; `None` when missing or not an integer.
    pub age: Option<i32>,
}

/// Team manager. Deserialized from the aggregated manager payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Eligible team in the projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedTeam {
    pub id: i64,
    pub name: String,
    pub contest_name: String,
    pub status: TeamStatus,
    pub registered_at: DateTime<Utc>,
    pub contingent: ResolvedContingent,
    pub target_group: Option<TargetGroup>,
    pub target_group_label: String,
    pub members: Vec<TeamMember>,
    pub managers: Vec<Manager>,
}

// =============================================================================
// COUNTS
// =============================================================================

/// One value per reconciled dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DimensionCounts {
    pub contingents: i64,
    pub teams: i64,
    pub contestants: i64,
    pub managers: i64,
}

impl DimensionCounts {
    /// Signed per-dimension `self - other`.
    pub fn minus(&self, other: &DimensionCounts) -> DimensionCounts {
        DimensionCounts {
            contingents: self.contingents - other.contingents,
            teams: self.teams - other.teams,
            contestants: self.contestants - other.contestants,
            managers: self.managers - other.managers,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == DimensionCounts::default()
    }

    pub fn get(&self, table: SnapshotTable) -> i64 {
        match table {
            SnapshotTable::Contingents => self.contingents,
            SnapshotTable::Teams => self.teams,
            SnapshotTable::Contestants => self.contestants,
            SnapshotTable::Managers => self.managers,
        }
    }

    pub fn set(&mut self, table: SnapshotTable, value: i64) {
        match table {
            SnapshotTable::Contingents => self.contingents = value,
            SnapshotTable::Teams => self.teams = value,
            SnapshotTable::Contestants => self.contestants = value,
            SnapshotTable::Managers => self.managers = value,
        }
    }
}

/// Canonical eligible roster for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub event_id: EventId,
    pub teams: Vec<ProjectedTeam>,
    pub expected_counts: DimensionCounts,
}

// =============================================================================
// ATTENDANCE SNAPSHOT
// =============================================================================

/// The four attendance tables maintained by the check-in subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotTable {
    Contingents,
    Teams,
    Contestants,
    Managers,
}

impl SnapshotTable {
    pub const ALL: [SnapshotTable; 4] = [
        SnapshotTable::Contingents,
        SnapshotTable::Teams,
        SnapshotTable::Contestants,
        SnapshotTable::Managers,
    ];

    /// Physical table name.
    pub fn table_name(self) -> &'static str {
        match self {
            SnapshotTable::Contingents => "attendance_contingent",
            SnapshotTable::Teams => "attendance_team",
            SnapshotTable::Contestants => "attendance_contestant",
            SnapshotTable::Managers => "attendance_manager",
        }
    }
}

impl fmt::Display for SnapshotTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Count and latest update of one snapshot table for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableReading {
    pub table: SnapshotTable,
    pub count: i64,
    /// `None` when the table has no rows for the event.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Actual attendance counts for an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttendanceSnapshot {
    pub counts: DimensionCounts,
    pub last_sync_date: Option<DateTime<Utc>>,
    /// Tables that could not be read and were reported as 0.
    pub unavailable: Vec<SnapshotTable>,
}

impl AttendanceSnapshot {
    pub fn is_degraded(&self) -> bool {
        !self.unavailable.is_empty()
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// Expected vs actual comparison for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub is_synced: bool,
    pub last_sync_date: Option<DateTime<Utc>>,
    pub expected_counts: DimensionCounts,
    pub actual_counts: DimensionCounts,
    pub differences: DimensionCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_parses_positive() {
        let id: EventId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn test_event_id_rejects_zero_negative_and_garbage() {
        for raw in ["0", "-3", "abc", "", "4.5", "9999999999999999999999"] {
            let err = raw.parse::<EventId>().unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "input {:?}", raw);
        }
    }

    #[test]
    fn test_target_group_display_label() {
        let mut tg = TargetGroup {
            id: 1,
            school_level: "Primary".to_string(),
            min_age: Some(7),
            max_age: Some(12),
        };
        assert_eq!(tg.display_label(), "Kids");
        tg.school_level = "secondary".to_string();
        assert_eq!(tg.display_label(), "Teens");
        tg.school_level = "Higher Education".to_string();
        assert_eq!(tg.display_label(), "Youth");
        tg.school_level = "Open".to_string();
        assert_eq!(tg.display_label(), "Open");
    }

    #[test]
    fn test_team_status_from_str() {
        assert_eq!(TeamStatus::from("APPROVED"), TeamStatus::Approved);
        assert_eq!(TeamStatus::from("accepted"), TeamStatus::Accepted);
        assert_eq!(
            TeamStatus::from("APPROVED_SPECIAL"),
            TeamStatus::ApprovedSpecial
        );
        assert_eq!(TeamStatus::from("PENDING"), TeamStatus::Other);
        assert!(!TeamStatus::Other.is_projected());
    }

    #[test]
    fn test_institution_from_parts_picks_declared_branch() {
        let school = SchoolRecord {
            name: "SK Taman Desa".to_string(),
            state: Some("SELANGOR".to_string()),
            ppd: Some("PPD Petaling".to_string()),
        };
        let stray = InstitutionRecord {
            name: "Stray".to_string(),
            state: None,
        };

        let inst = Institution::from_parts("SCHOOL", Some(school.clone()), Some(stray), None);
        assert_eq!(inst, Institution::School(Some(school)));

        let inst = Institution::from_parts("INDEPENDENT", None, None, None);
        assert_eq!(inst, Institution::Independent(None));

        let inst = Institution::from_parts("CLUB", None, None, None);
        assert_eq!(inst.kind(), None);
    }

    #[test]
    fn test_dimension_counts_minus_is_signed() {
        let expected = DimensionCounts {
            contingents: 3,
            teams: 2,
            contestants: 5,
            managers: 1,
        };
        let actual = DimensionCounts {
            contingents: 2,
            teams: 4,
            contestants: 5,
            managers: 1,
        };
        let diff = expected.minus(&actual);
        assert_eq!(diff.contingents, 1);
        assert_eq!(diff.teams, -2);
        assert!(!diff.is_zero());
        assert!(expected.minus(&expected).is_zero());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ReconciliationReport {
            is_synced: true,
            last_sync_date: None,
            expected_counts: DimensionCounts::default(),
            actual_counts: DimensionCounts::default(),
            differences: DimensionCounts::default(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["isSynced"], true);
        assert!(json["lastSyncDate"].is_null());
        assert_eq!(json["differences"]["managers"], 0);
        assert!(json.get("expectedCounts").is_some());
        assert!(json.get("actualCounts").is_some());
    }
}
