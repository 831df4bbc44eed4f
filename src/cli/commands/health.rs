use std::path::PathBuf;

use anyhow::Context;

use crate::config::loader::load_config;
use crate::config::paths::Paths;
use crate::health::checker::{HealthStatus, check_health};

pub async fn handle_health(config_dir: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let config_dir = config_dir.unwrap_or_else(Paths::config_dir);
    let dotenv = Paths::dotenv_file();
    let config =
        load_config(&config_dir, Some(&dotenv)).context("Failed to load configuration")?;

    let report = check_health(&config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let status = match report.status {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        };
        println!("Status: {status}");
        for issue in &report.issues {
            println!("issue: {issue}");
        }
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
    }

    if report.status == HealthStatus::Unhealthy {
        anyhow::bail!("Configuration unhealthy: {} issue(s)", report.issues.len());
    }
    Ok(())
}
