//! Projection builder: the canonical eligible roster for an event.
//!
//! ## Pipeline
//!
//! 1. Load candidate teams (status already filtered by the store)
//! 2. Resolve each contingent and sort by school level, state, contingent
//!    name, team name, team id
//! 3. Fetch members and managers per team as a bounded, order-preserving
//!    fan-out
//! 4. Drop ineligible teams
//! 5. Count teams, contestants, distinct contingents and distinct managers
//!
//! ## Error Handling
//!
//! - Candidate query fails: `Error::Computation`, nothing is returned
//! - Member fetch fails: `Error::Computation`
//! - Manager fetch fails or payload is malformed: that team gets no managers

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::{StreamExt, TryStreamExt};
use serde_json::Value as JsonValue;
use tracing::{debug, info, trace, warn};

use crate::defaults::FETCH_CONCURRENCY;
use crate::eligibility::{is_eligible, parse_age};
use crate::error::{Error, Result};
use crate::geography::{format_class_grade, resolve};
use crate::models::*;
use crate::traits::RosterRepository;

/// Builds [`Projection`]s from a [`RosterRepository`].
#[derive(Clone)]
pub struct ProjectionBuilder {
    roster: Arc<dyn RosterRepository>,
    concurrency: usize,
}

impl ProjectionBuilder {
    pub fn new(roster: Arc<dyn RosterRepository>) -> Self {
        Self {
            roster,
            concurrency: FETCH_CONCURRENCY,
        }
    }

    /// Set how many teams have their members/managers fetched at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Compute the projection for an event.
    pub async fn build(&self, event_id: EventId) -> Result<Projection> {
        let start = Instant::now();

        let candidates = self
            .roster
            .list_candidate_teams(event_id)
            .await
            .map_err(|e| {
                Error::Computation(format!(
                    "failed to load registrations for event {}: {}",
                    event_id, e
                ))
            })?;
        let candidate_count = candidates.len();

        let mut ordered: Vec<(CandidateTeam, ResolvedContingent)> = candidates
            .into_iter()
            .filter(|c| c.status.is_projected())
            .map(|c| {
                let contingent = resolve(&c.contingent);
                (c, contingent)
            })
            .collect();
        ordered.sort_by(|a, b| roster_order(a, b));

        let teams: Vec<ProjectedTeam> = futures::stream::iter(ordered)
            .map(|(candidate, contingent)| self.assemble(candidate, contingent))
            .buffered(self.concurrency)
            .try_collect::<Vec<Option<ProjectedTeam>>>()
            .await?
            .into_iter()
            .flatten()
            .collect();

        let expected_counts = expected_counts(&teams);

        info!(
            subsystem = "engine",
            component = "projection",
            op = "build",
            event_id = event_id.get(),
            candidate_count,
            eligible_count = teams.len(),
            contingents = expected_counts.contingents,
            contestants = expected_counts.contestants,
            managers = expected_counts.managers,
            duration_ms = start.elapsed().as_millis() as u64,
            "Projection built"
        );

        Ok(Projection {
            event_id,
            teams,
            expected_counts,
        })
    }

    /// Attach members and managers; `None` if the team is ineligible.
    async fn assemble(
        &self,
        candidate: CandidateTeam,
        contingent: ResolvedContingent,
    ) -> Result<Option<ProjectedTeam>> {
        let team_id = candidate.id;
        let (members, managers) = tokio::join!(
            self.roster.list_team_members(team_id),
            self.roster.list_team_managers(team_id)
        );

        let records = members.map_err(|e| {
            Error::Computation(format!(
                "failed to load members for team {}: {}",
                team_id, e
            ))
        })?;
        let mut members: Vec<TeamMember> = records.into_iter().map(member_from_record).collect();
        members.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        if !is_eligible(
            candidate.status,
            candidate.target_group.as_ref(),
            &members,
        ) {
            trace!(
                subsystem = "engine",
                component = "projection",
                team_id,
                status = %candidate.status,
                "Team excluded by eligibility rules"
            );
            return Ok(None);
        }

        let managers = match managers {
            Ok(managers) => dedupe_managers(managers),
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    component = "projection",
                    team_id,
                    error = %e,
                    "Manager list unavailable, treating as empty"
                );
                Vec::new()
            }
        };

        let target_group_label = candidate
            .target_group
            .as_ref()
            .map(TargetGroup::display_label)
            .unwrap_or_default();

        Ok(Some(ProjectedTeam {
            id: team_id,
            name: candidate.name,
            contest_name: candidate.contest_name,
            status: candidate.status,
            registered_at: candidate.registered_at,
            contingent,
            target_group: candidate.target_group,
            target_group_label,
            members,
            managers,
        }))
    }
}

fn roster_order(
    (a, ca): &(CandidateTeam, ResolvedContingent),
    (b, cb): &(CandidateTeam, ResolvedContingent),
) -> Ordering {
    let level = |t: &CandidateTeam| {
        t.target_group
            .as_ref()
            .map(|tg| tg.school_level.clone())
            .unwrap_or_default()
    };
    level(a)
        .cmp(&level(b))
        .then_with(|| ca.state.cmp(&cb.state))
        .then_with(|| ca.name.cmp(&cb.name))
        .then_with(|| a.name.cmp(&b.name))
        .then(a.id.cmp(&b.id))
}

/// Convert a stored contestant into a roster member.
pub fn member_from_record(record: MemberRecord) -> TeamMember {
    let formatted_class_grade = format_class_grade(
        record.education_level.as_deref(),
        record.class_grade.as_deref(),
    );
    TeamMember {
        age: parse_age(record.age.as_deref()),
        id: record.id,
        name: record.name,
        email: record.email,
        national_id: record.national_id,
        education_level: record.education_level,
        class_grade: record.class_grade,
        formatted_class_grade,
    }
}

/// Drop repeated manager ids, keeping the first occurrence, ordered by name.
pub fn dedupe_managers(managers: Vec<Manager>) -> Vec<Manager> {
    let mut by_id: BTreeMap<i64, Manager> = BTreeMap::new();
    for manager in managers {
        by_id.entry(manager.id).or_insert(manager);
    }
    let mut unique: Vec<Manager> = by_id.into_values().collect();
    unique.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    unique
}

/// Decode an aggregated manager payload (a JSON array of `{id, name, email}`).
///
/// `null` means no managers. Any other non-array shape is an error.
pub fn decode_managers(payload: JsonValue) -> Result<Vec<Manager>> {
    match payload {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Array(items) => {
            let managers = items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(serde_json::from_value::<Manager>)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(managers)
        }
        other => Err(Error::Serialization(format!(
            "expected manager array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Expected counts for a projected roster.
pub fn expected_counts(teams: &[ProjectedTeam]) -> DimensionCounts {
    let contingents: HashSet<i64> = teams.iter().map(|t| t.contingent.id).collect();
    let managers: HashSet<i64> = teams
        .iter()
        .flat_map(|t| t.managers.iter().map(|m| m.id))
        .collect();
    let contestants: usize = teams.iter().map(|t| t.members.len()).sum();

    let counts = DimensionCounts {
        contingents: contingents.len() as i64,
        teams: teams.len() as i64,
        contestants: contestants as i64,
        managers: managers.len() as i64,
    };
    debug!(
        subsystem = "engine",
        component = "projection",
        op = "count",
        ?counts,
        "Expected counts computed"
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockRosterRepository};
    use serde_json::json;

    fn builder(repo: MockRosterRepository) -> ProjectionBuilder {
        ProjectionBuilder::new(Arc::new(repo))
    }

    fn event() -> EventId {
        EventId::new(42).unwrap()
    }

    /// Event 42, band 10..=12: A fits, B has a 13-year-old, C is special.
    fn scenario() -> MockRosterRepository {
        let tg = mock::target_group(1, "Primary", Some(10), Some(12));
        MockRosterRepository::new()
            .with_event(42)
            .with_team(
                mock::candidate(1, "Team A", TeamStatus::Approved, mock::school(10, "SK Alpha", "JOHOR"), Some(tg.clone())),
                vec![mock::member(1, "Ali", "10"), mock::member(2, "Bala", "11")],
                vec![mock::manager(100, "Cikgu M")],
            )
            .with_team(
                mock::candidate(2, "Team B", TeamStatus::Approved, mock::school(11, "SK Beta", "JOHOR"), Some(tg.clone())),
                vec![mock::member(3, "Chong", "10"), mock::member(4, "Devi", "13")],
                vec![mock::manager(101, "Cikgu N")],
            )
            .with_team(
                mock::candidate(3, "Team C", TeamStatus::ApprovedSpecial, mock::school(12, "SK Gamma", "JOHOR"), Some(tg)),
                vec![mock::member(5, "Elan", "30")],
                vec![mock::manager(100, "Cikgu M")],
            )
    }

    #[tokio::test]
    async fn test_age_gating_and_special_override() {
        let projection = builder(scenario()).build(event()).await.unwrap();

        let names: Vec<&str> = projection.teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Team A", "Team C"]);
        assert_eq!(projection.expected_counts.teams, 2);
        assert_eq!(projection.expected_counts.contestants, 3);
    }

    #[tokio::test]
    async fn test_manager_shared_across_teams_counts_once() {
        let projection = builder(scenario()).build(event()).await.unwrap();
        assert_eq!(projection.expected_counts.managers, 1);
    }

    #[tokio::test]
    async fn test_contingents_are_deduplicated() {
        let tg = mock::target_group(1, "Primary", Some(10), Some(12));
        let shared = mock::school(10, "SK Alpha", "JOHOR");
        let mut repo = MockRosterRepository::new().with_event(42);
        for (id, contingent) in [
            (1, shared.clone()),
            (2, shared),
            (3, mock::school(11, "SK Beta", "JOHOR")),
            (4, mock::school(12, "SK Gamma", "PERAK")),
        ] {
            repo = repo.with_team(
                mock::candidate(id, &format!("Team {}", id), TeamStatus::Accepted, contingent, Some(tg.clone())),
                vec![mock::member(id, "Member", "11")],
                vec![],
            );
        }

        let projection = builder(repo).build(event()).await.unwrap();
        assert_eq!(projection.expected_counts.teams, 4);
        assert_eq!(projection.expected_counts.contingents, 3);
    }

    #[tokio::test]
    async fn test_duplicate_manager_links_within_team_are_collapsed() {
        let tg = mock::target_group(1, "Primary", Some(10), Some(12));
        let repo = MockRosterRepository::new().with_event(42).with_team(
            mock::candidate(1, "Team A", TeamStatus::Approved, mock::school(10, "SK Alpha", "JOHOR"), Some(tg)),
            vec![mock::member(1, "Ali", "11")],
            vec![
                mock::manager(7, "Zul"),
                mock::manager(7, "Zul"),
                mock::manager(8, "Amir"),
            ],
        );

        let projection = builder(repo).build(event()).await.unwrap();
        let managers: Vec<i64> = projection.teams[0].managers.iter().map(|m| m.id).collect();
        assert_eq!(managers, vec![8, 7]);
        assert_eq!(projection.expected_counts.managers, 2);
    }

    #[tokio::test]
    async fn test_invalid_age_excludes_team() {
        let tg = mock::target_group(1, "Primary", Some(10), Some(12));
        let repo = MockRosterRepository::new().with_event(42).with_team(
            mock::candidate(1, "Team A", TeamStatus::Approved, mock::school(10, "SK Alpha", "JOHOR"), Some(tg)),
            vec![mock::member(1, "Ali", "11"), mock::member(2, "Bala", "n/a")],
            vec![],
        );

        let projection = builder(repo).build(event()).await.unwrap();
        assert!(projection.teams.is_empty());
        assert!(projection.expected_counts.is_zero());
    }

    #[tokio::test]
    async fn test_candidate_query_failure_is_computation_error() {
        let repo = MockRosterRepository::new()
            .with_event(42)
            .failing_candidates();

        let err = builder(repo).build(event()).await.unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[tokio::test]
    async fn test_member_fetch_failure_is_fatal() {
        let repo = scenario().failing_members_for(1);
        let err = builder(repo).build(event()).await.unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[tokio::test]
    async fn test_manager_fetch_failure_degrades_to_empty() {
        let repo = scenario().failing_managers_for(1);
        let projection = builder(repo).build(event()).await.unwrap();

        let team_a = projection.teams.iter().find(|t| t.id == 1).unwrap();
        assert!(team_a.managers.is_empty());
        // Team C still contributes the shared manager.
        assert_eq!(projection.expected_counts.managers, 1);
        assert_eq!(projection.expected_counts.teams, 2);
    }

    #[tokio::test]
    async fn test_roster_ordering_is_deterministic() {
        let kids = mock::target_group(1, "Primary", Some(7), Some(12));
        let teens = mock::target_group(2, "Secondary", Some(13), Some(17));
        let repo = MockRosterRepository::new()
            .with_event(42)
            .with_team(
                mock::candidate(5, "Zeta", TeamStatus::Approved, mock::school(1, "SMK Utama", "KEDAH"), Some(teens.clone())),
                vec![mock::member(1, "A", "15")],
                vec![],
            )
            .with_team(
                mock::candidate(4, "Beta", TeamStatus::Approved, mock::school(2, "SK Dua", "PERAK"), Some(kids.clone())),
                vec![mock::member(2, "B", "9")],
                vec![],
            )
            .with_team(
                mock::candidate(3, "Alpha", TeamStatus::Approved, mock::school(2, "SK Dua", "PERAK"), Some(kids.clone())),
                vec![mock::member(3, "C", "9")],
                vec![],
            )
            .with_team(
                mock::candidate(2, "Gamma", TeamStatus::Approved, mock::school(3, "SK Satu", "JOHOR"), Some(kids)),
                vec![mock::member(4, "D", "10")],
                vec![],
            );

        let b = builder(repo).with_concurrency(2);
        let first = b.build(event()).await.unwrap();
        let second = b.build(event()).await.unwrap();

        let ids: Vec<i64> = first.teams.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 5]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_members_sorted_by_name_with_formatted_grade() {
        let tg = mock::target_group(1, "Primary", Some(10), Some(12));
        let mut zara = mock::member(1, "Zara", "11");
        zara.education_level = Some("Sekolah Rendah".to_string());
        zara.class_grade = Some("5".to_string());
        let repo = MockRosterRepository::new().with_event(42).with_team(
            mock::candidate(1, "Team A", TeamStatus::Approved, mock::school(10, "SK Alpha", "JOHOR"), Some(tg)),
            vec![zara, mock::member(2, "Adam", "12")],
            vec![],
        );

        let projection = builder(repo).build(event()).await.unwrap();
        let team = &projection.teams[0];
        assert_eq!(team.members[0].name, "Adam");
        assert_eq!(team.members[1].formatted_class_grade, "Darjah 5");
        assert_eq!(team.target_group_label, "Kids");
    }

    #[test]
    fn test_decode_managers_shapes() {
        let managers = decode_managers(json!([
            {"id": 1, "name": "Aminah", "email": "aminah@example.com"},
            {"id": 2, "name": "Farid"},
            null
        ]))
        .unwrap();
        assert_eq!(managers.len(), 2);
        assert_eq!(managers[1].email, None);

        assert!(decode_managers(JsonValue::Null).unwrap().is_empty());
        assert!(matches!(
            decode_managers(json!("1,2,3")),
            Err(Error::Serialization(_))
        ));
        assert!(decode_managers(json!([{"name": "no id"}])).is_err());
    }
}
