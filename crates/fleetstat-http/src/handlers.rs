use crate::response::{domain_error, success};
use axum::extract::{Extension, Path};
use axum::response::Response;
use fleetstat_domain::{GroupReportService, StatusQueryService};
use std::sync::Arc;

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub query: Arc<StatusQueryService>,
    pub report: Arc<GroupReportService>,
}

pub async fn root() -> &'static str {
    "Welcome to FleetStat"
}

/// `GET /v1/status` — all persisted statuses
pub async fn all_statuses(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.query.all_statuses().await {
        Ok(statuses) => success(statuses),
        Err(e) => domain_error(&e),
    }
}

/// `GET /v1/status/{device_id}` — latest status for one device
pub async fn latest_status(
    Extension(state): Extension<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Response {
    match state.query.latest_status(&device_id).await {
        Ok(status) => success(status),
        Err(e) => domain_error(&e),
    }
}

/// `GET /v1/status/{device_id}/history` — full history, most recent first
pub async fn status_history(
    Extension(state): Extension<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Response {
    match state.query.status_history(&device_id).await {
        Ok(history) => success(history),
        Err(e) => domain_error(&e),
    }
}

/// `GET /v1/status/group/report` — the aggregated group report
pub async fn group_report(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.report.group_report().await {
        Ok(report) => success(report),
        Err(e) => domain_error(&e),
    }
}
