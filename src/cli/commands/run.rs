use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::loader::ConfigSource;
use crate::config::paths::Paths;
use crate::config::validation::validate_config;
use crate::http::server::HttpServer;
use crate::monitor::coordinator::ReloadCoordinator;
use crate::monitor::watcher::ConfigMonitor;

/// Runs the configuration monitor until interrupted: watch the config
/// directory, reload on changes, log validation findings after each
/// reload, and serve the status API when enabled.
pub async fn handle_run(
    config_dir: Option<PathBuf>,
    dotenv: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config_dir = config_dir.unwrap_or_else(Paths::config_dir);
    let dotenv = dotenv.unwrap_or_else(Paths::dotenv_file);

    let source = ConfigSource::Files {
        config_dir: config_dir.clone(),
        dotenv: Some(dotenv.clone()),
    };
    let initial = source.load().context("Failed to load configuration")?;

    let startup = validate_config(&initial);
    for warning in &startup.warnings {
        warn!(field = %warning.field, message = %warning.message, "Config validation warning");
    }
    if !startup.is_valid() {
        for err in &startup.errors {
            error!(field = %err.field, message = %err.message, "Config validation error");
        }
        anyhow::bail!("Configuration validation failed: {} error(s)", startup.errors.len());
    }

    let monitor_config = initial.monitor.clone();
    let coordinator = Arc::new(ReloadCoordinator::new(source, initial));

    // Re-validate after every reload; findings are logged, never fatal.
    coordinator.add_reload_callback(Box::new(|config| {
        let result = validate_config(config);
        for err in &result.errors {
            error!(field = %err.field, message = %err.message, "Config validation error");
        }
        for warning in &result.warnings {
            warn!(field = %warning.field, message = %warning.message, "Config validation warning");
        }
        Ok(())
    }));

    let monitor = ConfigMonitor::new(
        Arc::clone(&coordinator),
        config_dir,
        Some(dotenv),
    )
    .with_debounce(Duration::from_millis(monitor_config.debounce_ms));

    if let Err(err) = monitor.start().await {
        warn!(error = %err, "Monitoring unavailable; ad hoc reload and checks still work");
    }

    let cancel = CancellationToken::new();
    let mut http_handle = None;
    match HttpServer::from_config(&monitor_config, cancel.clone(), Arc::clone(&coordinator)) {
        Ok(Some(server)) => {
            let server_cancel = cancel.clone();
            http_handle = Some(tokio::spawn(async move {
                if let Err(err) = server.start().await {
                    error!(error = %err, "Status API stopped with error");
                    server_cancel.cancel();
                }
            }));
        }
        Ok(None) => {}
        Err(err) => warn!(error = %err, "Failed to configure status API"),
    }

    info!("agrypnia running; press Ctrl-C to stop");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
        }
        _ = cancel.cancelled() => {}
    }

    cancel.cancel();
    monitor.stop().await;
    if let Some(handle) = http_handle {
        if let Err(err) = handle.await {
            error!(error = %err, "Status API task ended abnormally");
        }
    }

    Ok(())
}
