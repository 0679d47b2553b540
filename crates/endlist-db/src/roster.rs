//! Registration repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use endlist_core::{
    decode_managers, CandidateTeam, ContingentRecord, Error, EventId, Institution,
    InstitutionRecord, Manager, MemberRecord, Result, RosterRepository, SchoolRecord, TargetGroup,
    TeamStatus,
};

/// Candidate teams for an event, one row per team.
///
/// `DISTINCT ON (t.id) ... ORDER BY t.id, tg.id` keeps the lowest target
/// group id when a contest maps to several.
const CANDIDATE_TEAMS_SQL: &str = r#"
    SELECT DISTINCT ON (t.id)
        t.id, t.name, t.status, t.created_at,
        c.name AS contest_name,
        cg.id AS contingent_id, cg.contingent_type,
        s.name AS school_name, ss.name AS school_state, s.ppd AS school_ppd,
        hi.name AS hi_name, his.name AS hi_state,
        ind.name AS ind_name, inds.name AS ind_state,
        tg.id AS tg_id, tg.school_level, tg.min_age, tg.max_age
    FROM team t
    JOIN event_contest ec ON ec.id = t.event_contest_id
    JOIN contest c ON c.id = ec.contest_id
    JOIN contingent cg ON cg.id = t.contingent_id
    LEFT JOIN school s ON s.id = cg.school_id
    LEFT JOIN state ss ON ss.id = s.state_id
    LEFT JOIN higher_institution hi ON hi.id = cg.higher_institution_id
    LEFT JOIN state his ON his.id = hi.state_id
    LEFT JOIN independent ind ON ind.id = cg.independent_id
    LEFT JOIN state inds ON inds.id = ind.state_id
    LEFT JOIN contest_target_group ctg ON ctg.contest_id = c.id
    LEFT JOIN target_group tg ON tg.id = ctg.target_group_id
    WHERE ec.event_id = $1
      AND t.status = ANY($2)
    ORDER BY t.id, tg.id
"#;

/// PostgreSQL implementation of RosterRepository.
#[derive(Clone)]
pub struct PgRosterRepository {
    pool: Pool<Postgres>,
}

impl PgRosterRepository {
    /// Create a new PgRosterRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn candidate_from_row(row: &PgRow) -> Result<CandidateTeam> {
    let status: String = row.try_get("status")?;
    let contingent_type: String = row.try_get("contingent_type")?;

    let school = row
        .try_get::<Option<String>, _>("school_name")?
        .map(|name| -> Result<SchoolRecord> {
            Ok(SchoolRecord {
                name,
                state: row.try_get("school_state")?,
                ppd: row.try_get("school_ppd")?,
            })
        })
        .transpose()?;
    let higher_institution = row
        .try_get::<Option<String>, _>("hi_name")?
        .map(|name| -> Result<InstitutionRecord> {
            Ok(InstitutionRecord {
                name,
                state: row.try_get("hi_state")?,
            })
        })
        .transpose()?;
    let independent = row
        .try_get::<Option<String>, _>("ind_name")?
        .map(|name| -> Result<InstitutionRecord> {
            Ok(InstitutionRecord {
                name,
                state: row.try_get("ind_state")?,
            })
        })
        .transpose()?;

    let target_group = row
        .try_get::<Option<i64>, _>("tg_id")?
        .map(|id| -> Result<TargetGroup> {
            Ok(TargetGroup {
                id,
                school_level: row.try_get("school_level")?,
                min_age: row.try_get("min_age")?,
                max_age: row.try_get("max_age")?,
            })
        })
        .transpose()?;

    let registered_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(CandidateTeam {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        contest_name: row.try_get("contest_name")?,
        status: TeamStatus::from(status.as_str()),
        registered_at,
        contingent: ContingentRecord {
            id: row.try_get("contingent_id")?,
            institution: Institution::from_parts(
                &contingent_type,
                school,
                higher_institution,
                independent,
            ),
        },
        target_group,
    })
}

#[async_trait]
impl RosterRepository for PgRosterRepository {
    async fn event_exists(&self, event_id: EventId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM event WHERE id = $1)")
            .bind(event_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn list_candidate_teams(&self, event_id: EventId) -> Result<Vec<CandidateTeam>> {
        let statuses: Vec<String> = TeamStatus::PROJECTED
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let rows = sqlx::query(CANDIDATE_TEAMS_SQL)
            .bind(event_id.get())
            .bind(statuses)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(candidate_from_row).collect()
    }

    async fn list_team_members(&self, team_id: i64) -> Result<Vec<MemberRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT ct.id, ct.name, ct.email, ct.ic, ct.edu_level, ct.class_grade, ct.age
            FROM team_member tm
            JOIN contestant ct ON ct.id = tm.contestant_id
            WHERE tm.team_id = $1
            ORDER BY ct.name, ct.id
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter()
            .map(|r| {
                Ok(MemberRecord {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    email: r.try_get("email")?,
                    national_id: r.try_get("ic")?,
                    education_level: r.try_get("edu_level")?,
                    class_grade: r.try_get("class_grade")?,
                    age: r.try_get("age")?,
                })
            })
            .collect()
    }

    async fn list_team_managers(&self, team_id: i64) -> Result<Vec<Manager>> {
        let payload = sqlx::query_scalar::<_, JsonValue>(
            r#"
            SELECT COALESCE(
                json_agg(
                    json_build_object('id', m.id, 'name', m.name, 'email', m.email)
                    ORDER BY m.name, m.id
                ),
                '[]'::json
            )
            FROM manager_team mt
            JOIN manager m ON m.id = mt.manager_id
            WHERE mt.team_id = $1
            "#,
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        decode_managers(payload)
    }
}
