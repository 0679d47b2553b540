//! # endlist-api
//!
//! HTTP surface for roster projection and attendance reconciliation.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /health` | [`handlers::health::health_check`] |
//! | `GET /api/v1/events/:event_id/reconciliation` | [`handlers::events::get_reconciliation`] |
//! | `GET /api/v1/events/:event_id/endlist` | [`handlers::events::get_endlist`] |
//! | `GET /openapi.json`, `/docs` | OpenAPI document and Swagger UI |

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub use config::ServerConfig;
pub use error::ApiError;
pub use services::ReconciliationService;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE & OPENAPI
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub reconciliation: Arc<ReconciliationService>,
}

impl AppState {
    pub fn new(reconciliation: ReconciliationService) -> Self {
        Self {
            reconciliation: Arc::new(reconciliation),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Endlist API",
        description = "Eligible roster projection and attendance reconciliation for events"
    ),
    paths(
        handlers::health::health_check,
        handlers::events::get_reconciliation,
        handlers::events::get_endlist,
    ),
    components(schemas(
        endlist_core::ReconciliationReport,
        endlist_core::DimensionCounts,
        endlist_core::Projection,
        endlist_core::ProjectedTeam,
        endlist_core::ResolvedContingent,
        endlist_core::ContingentKind,
        endlist_core::TeamMember,
        endlist_core::Manager,
        endlist_core::TargetGroup,
        endlist_core::TeamStatus,
        endlist_core::EventId,
    )),
    tags(
        (name = "Reconciliation", description = "Roster projection and attendance reconciliation"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;

// =============================================================================
// ROUTER
// =============================================================================

/// Parse configured CORS origins, skipping invalid entries.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

/// Build the application router with middleware.
pub fn router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .route(
            "/api/v1/events/:event_id/reconciliation",
            get(handlers::events::get_reconciliation),
        )
        .route(
            "/api/v1/events/:event_id/endlist",
            get(handlers::events::get_endlist),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(Duration::from_secs(3600)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_origins_skips_invalid() {
        let origins = vec![
            "https://ops.example".to_string(),
            "bad\norigin".to_string(),
        ];
        let parsed = parse_allowed_origins(&origins);
        assert_eq!(parsed, vec![HeaderValue::from_static("https://ops.example")]);
    }

    #[test]
    fn test_openapi_lists_event_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc
            .paths
            .paths
            .contains_key("/api/v1/events/{event_id}/reconciliation"));
        assert!(doc.paths.paths.contains_key("/api/v1/events/{event_id}/endlist"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
