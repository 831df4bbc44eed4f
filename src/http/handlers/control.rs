use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::config::validation::{ValidationResult, validate_config};
use crate::monitor::coordinator::{ReloadCoordinator, ReloadOutcome};

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    success: bool,
    outcome: &'static str,
}

/// Handles POST /api/v1/reload requests by triggering a coordinator reload.
pub async fn reload_handler(
    State(coordinator): State<Arc<ReloadCoordinator>>,
) -> (StatusCode, Json<ReloadResponse>) {
    let outcome = coordinator.reload();
    let (status, success, outcome) = match outcome {
        ReloadOutcome::Reloaded => (StatusCode::OK, true, "reloaded"),
        ReloadOutcome::Unsupported => (StatusCode::CONFLICT, false, "unsupported"),
        ReloadOutcome::Failed => (StatusCode::UNPROCESSABLE_ENTITY, false, "failed"),
    };
    (status, Json(ReloadResponse { success, outcome }))
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    valid: bool,
    #[serde(flatten)]
    result: ValidationResult,
}

/// Handles GET /api/v1/validate requests against the current configuration.
pub async fn validate_handler(
    State(coordinator): State<Arc<ReloadCoordinator>>,
) -> (StatusCode, Json<ValidateResponse>) {
    let config = coordinator.current();
    let result = validate_config(&config);
    let response = ValidateResponse {
        valid: result.is_valid(),
        result,
    };
    (StatusCode::OK, Json(response))
}
