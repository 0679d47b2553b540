//! Event roster HTTP handlers.
//!
//! - Reconciliation report (expected vs. recorded attendance)
//! - Projected endlist (eligible teams with members and managers)
//!
//! The event id is taken as a raw path segment and validated here so a
//! malformed id is rejected with 400 before any store access.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{ApiError, AppState};
use endlist_core::{EventId, Projection, ReconciliationReport};

/// Reconcile an event's eligible roster against its attendance snapshot.
///
/// GET /api/v1/events/{event_id}/reconciliation
#[utoipa::path(get, path = "/api/v1/events/{event_id}/reconciliation", tag = "Reconciliation",
    params(("event_id" = String, Path, description = "Event id, a positive integer")),
    responses(
        (status = 200, description = "Reconciliation report", body = ReconciliationReport),
        (status = 400, description = "Event id is not a positive integer"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Roster could not be computed"),
        (status = 504, description = "Request timed out")
    ))]
pub async fn get_reconciliation(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<ReconciliationReport>, ApiError> {
    let event_id: EventId = event_id.parse()?;
    let report = state.reconciliation.report(event_id).await?;
    Ok(Json(report))
}

/// The projected roster of eligible teams for an event.
///
/// GET /api/v1/events/{event_id}/endlist
#[utoipa::path(get, path = "/api/v1/events/{event_id}/endlist", tag = "Reconciliation",
    params(("event_id" = String, Path, description = "Event id, a positive integer")),
    responses(
        (status = 200, description = "Projected roster", body = Projection),
        (status = 400, description = "Event id is not a positive integer"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Roster could not be computed"),
        (status = 504, description = "Request timed out")
    ))]
pub async fn get_endlist(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Projection>, ApiError> {
    let event_id: EventId = event_id.parse()?;
    let projection = state.reconciliation.endlist(event_id).await?;
    Ok(Json(projection))
}
