//! Contingent identity resolution and display labels.

use crate::defaults::{
    FEDERAL_TERRITORY_LONG, FEDERAL_TERRITORY_SHORT, INDEPENDENT_PPD, SPECIAL_NEEDS_GRADE,
    UNKNOWN_NAME, UNKNOWN_PPD, UNKNOWN_STATE,
};
use crate::models::{ContingentRecord, Institution, ResolvedContingent};

/// Rewrite the verbose federal-territory prefix to its short form.
///
/// "WILAYAH PERSEKUTUAN KUALA LUMPUR" becomes "WP KUALA LUMPUR". Other state
/// names are returned trimmed but otherwise unchanged.
pub fn normalize_state(state: &str) -> String {
    let trimmed = state.trim();
    let prefix_len = FEDERAL_TERRITORY_LONG.len();
    match (trimmed.get(..prefix_len), trimmed.get(prefix_len..)) {
        (Some(head), Some(rest))
            if head.eq_ignore_ascii_case(FEDERAL_TERRITORY_LONG)
                && (rest.is_empty() || rest.starts_with(char::is_whitespace)) =>
        {
            format!("{}{}", FEDERAL_TERRITORY_SHORT, rest)
        }
        _ => trimmed.to_string(),
    }
}

fn state_or_unknown(state: Option<&str>) -> String {
    match state.map(str::trim) {
        Some(s) if !s.is_empty() => normalize_state(s),
        _ => UNKNOWN_STATE.to_string(),
    }
}

/// Resolve a contingent's display name, state and district.
pub fn resolve(contingent: &ContingentRecord) -> ResolvedContingent {
    let (name, state, ppd) = match &contingent.institution {
        Institution::School(Some(school)) => (
            school.name.clone(),
            state_or_unknown(school.state.as_deref()),
            match school.ppd.as_deref().map(str::trim) {
                Some(ppd) if !ppd.is_empty() => ppd.to_string(),
                _ => UNKNOWN_PPD.to_string(),
            },
        ),
        Institution::HigherInstitution(Some(hi)) => (
            hi.name.clone(),
            state_or_unknown(hi.state.as_deref()),
            UNKNOWN_PPD.to_string(),
        ),
        Institution::Independent(Some(ind)) => (
            ind.name.clone(),
            state_or_unknown(ind.state.as_deref()),
            INDEPENDENT_PPD.to_string(),
        ),
        Institution::School(None)
        | Institution::HigherInstitution(None)
        | Institution::Independent(None)
        | Institution::Unresolved { .. } => (
            UNKNOWN_NAME.to_string(),
            UNKNOWN_STATE.to_string(),
            UNKNOWN_PPD.to_string(),
        ),
    };

    ResolvedContingent {
        id: contingent.id,
        kind: contingent.institution.kind(),
        name,
        state,
        ppd,
    }
}

/// Human-readable class label from education level and raw class grade.
pub fn format_class_grade(education_level: Option<&str>, class_grade: Option<&str>) -> String {
    let level = education_level.map(str::trim).unwrap_or_default();
    let grade = class_grade.map(str::trim).unwrap_or_default();

    if grade.eq_ignore_ascii_case(SPECIAL_NEEDS_GRADE) {
        return grade.to_string();
    }
    if grade.is_empty() {
        return level.to_string();
    }

    match level.to_lowercase().as_str() {
        "sekolah rendah" | "primary" => format!("Darjah {}", grade),
        "sekolah menengah" | "secondary" => format!("Tingkatan {}", grade),
        "" => grade.to_string(),
        _ => format!("{} {}", grade, level),
    }
}
