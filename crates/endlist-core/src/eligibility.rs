//! Team eligibility rules.
//!
//! A team is eligible when its status is special-approved, or when every
//! member's age falls inside its target group's inclusive age band. Missing
//! or unparseable ages and missing bounds make a team ineligible.

use crate::models::{TargetGroup, TeamMember, TeamStatus};

/// Parse a stored age. Anything other than a base-10 integer is `None`.
pub fn parse_age(raw: Option<&str>) -> Option<i32> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i32>().ok())
}

/// Whether `age` lies within the target group's `[min_age, max_age]`.
///
/// Returns `false` if either bound is missing.
pub fn age_in_band(age: i32, target_group: &TargetGroup) -> bool {
    match (target_group.min_age, target_group.max_age) {
        (Some(min), Some(max)) => min <= age && age <= max,
        _ => false,
    }
}

/// Decide whether a team belongs in the projection.
pub fn is_eligible(
    status: TeamStatus,
    target_group: Option<&TargetGroup>,
    members: &[TeamMember],
) -> bool {
    match status {
        TeamStatus::ApprovedSpecial => true,
        TeamStatus::Approved | TeamStatus::Accepted => {
            let Some(tg) = target_group else {
                return false;
            };
            if tg.min_age.is_none() || tg.max_age.is_none() {
                return false;
            }
            members
                .iter()
                .all(|m| m.age.is_some_and(|age| age_in_band(age, tg)))
        }
        TeamStatus::Other => false,
    }
}
