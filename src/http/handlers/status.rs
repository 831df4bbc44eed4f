use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::monitor::coordinator::{MonitorStatus, ReloadCoordinator};

#[derive(Debug, Serialize)]
pub struct StatusEnvelope {
    success: bool,
    data: MonitorStatus,
}

/// Handles GET /api/v1/status requests with a monitor status snapshot.
pub async fn status_handler(
    State(coordinator): State<Arc<ReloadCoordinator>>,
) -> (StatusCode, Json<StatusEnvelope>) {
    let envelope = StatusEnvelope {
        success: true,
        data: coordinator.status(),
    };
    (StatusCode::OK, Json(envelope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::to_bytes;
    use axum::routing::get;
    use tower::ServiceExt;

    use crate::config::loader::ConfigSource;
    use crate::config::schema::AppConfig;

    #[tokio::test]
    async fn test_status_response_structure() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("app.yaml"), "debug: true\n").unwrap();

        let source = ConfigSource::Files {
            config_dir: temp.path().to_path_buf(),
            dotenv: None,
        };
        let initial = source.load().unwrap();
        let coordinator = Arc::new(ReloadCoordinator::new(source, initial));
        coordinator.add_reload_callback(Box::new(|_| Ok(())));

        let router = Router::new()
            .route("/api/v1/status", get(status_handler))
            .with_state(Arc::clone(&coordinator));
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/status")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(payload["success"], true);
        assert_eq!(payload["data"]["monitoring"], false);
        assert_eq!(payload["data"]["callback_count"], 1);
        let files = payload["data"]["config_files"].as_array().expect("files");
        assert_eq!(files.len(), 1);
        assert!(files[0]["size_bytes"].as_u64().is_some());
        assert!(files[0]["modified"].as_str().is_some());
    }
}
