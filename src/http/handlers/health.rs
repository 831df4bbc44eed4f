use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::health::checker::{HealthReport, check_health};
use crate::monitor::coordinator::ReloadCoordinator;

/// Handles GET /health requests against the current configuration.
pub async fn health_handler(
    State(coordinator): State<Arc<ReloadCoordinator>>,
) -> (StatusCode, Json<HealthReport>) {
    let config = coordinator.current();
    let report = check_health(&config);
    (StatusCode::OK, Json(report))
}
