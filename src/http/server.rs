use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::schema::MonitorConfig;
use crate::http::handlers;
use crate::monitor::coordinator::ReloadCoordinator;

/// HTTP API server exposing status, validation, and health reports.
pub struct HttpServer {
    bind_addr: SocketAddr,
    router: Router,
    shutdown: CancellationToken,
}

impl HttpServer {
    /// Create a new HTTP server from monitor configuration; None when the
    /// API is disabled.
    pub fn from_config(
        config: &MonitorConfig,
        shutdown: CancellationToken,
        coordinator: Arc<ReloadCoordinator>,
    ) -> Result<Option<Self>> {
        if !config.http_enabled {
            return Ok(None);
        }

        Ok(Some(Self::new(
            &config.http_bind,
            config.http_port,
            shutdown,
            coordinator,
        )?))
    }

    pub fn new(
        bind: &str,
        port: u16,
        shutdown: CancellationToken,
        coordinator: Arc<ReloadCoordinator>,
    ) -> Result<Self> {
        let bind_addr: SocketAddr = format!("{bind}:{port}")
            .parse()
            .with_context(|| format!("Invalid HTTP bind address: {bind}:{port}"))?;

        if bind == "0.0.0.0" {
            warn!(
                port,
                "Status API binding to all interfaces (0.0.0.0). This exposes the API to the network."
            );
        }

        let router = Self::create_router(coordinator);

        Ok(Self {
            bind_addr,
            router,
            shutdown,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Start the HTTP server and wait for shutdown.
    pub async fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind status API to {}", self.bind_addr))?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read bound HTTP address")?;
        info!(address = %local_addr, "Status API listening");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("Status API shutting down");
            })
            .await
            .context("Status API server failed")?;

        info!("Status API stopped");
        Ok(())
    }

    fn create_router(coordinator: Arc<ReloadCoordinator>) -> Router {
        Router::new()
            .route("/health", axum::routing::get(handlers::health::health_handler))
            .route(
                "/api/v1/status",
                axum::routing::get(handlers::status::status_handler),
            )
            .route(
                "/api/v1/validate",
                axum::routing::get(handlers::control::validate_handler),
            )
            .route(
                "/api/v1/reload",
                axum::routing::post(handlers::control::reload_handler),
            )
            .fallback(Self::fallback_handler)
            .with_state(coordinator)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "http.request",
                            method = %request.method(),
                            path = %request.uri().path(),
                        )
                    })
                    .on_response(
                        |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                            let status = response.status();
                            if status.is_server_error() {
                                tracing::error!(%status, ?latency, "finished");
                            } else if status.is_client_error() {
                                tracing::warn!(%status, ?latency, "finished");
                            } else {
                                tracing::info!(%status, ?latency, "finished");
                            }
                        },
                    ),
            )
    }

    async fn fallback_handler() -> (StatusCode, Json<serde_json::Value>) {
        (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": {
                    "code": "NOT_FOUND",
                    "message": "The requested endpoint does not exist"
                }
            })),
        )
    }

    #[cfg(test)]
    pub(crate) fn router(&self) -> Router {
        self.router.clone()
    }
}
