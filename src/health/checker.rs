use serde::Serialize;
use url::Url;

use crate::config::schema::{AppConfig, DEV_SECRET_PLACEHOLDER};
use crate::config::validation::{is_sqlite_url, sqlite_database_path};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// One concern's verdict. Warnings never affect status.
#[derive(Debug, Serialize)]
pub struct ConcernHealth {
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConcernHealth {
    fn from_findings(issues: Vec<String>, warnings: Vec<String>) -> Self {
        let status = if issues.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        Self {
            status,
            issues,
            warnings,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Per-concern results in evaluation order.
#[derive(Debug, Serialize)]
pub struct ConcernReports {
    pub database: ConcernHealth,
    pub application: ConcernHealth,
    pub security: ConcernHealth,
    pub logging: ConcernHealth,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub concerns: ConcernReports,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

/// Runs the four concern checks and aggregates them. The report is
/// unhealthy iff at least one concern is unhealthy; issues and warnings
/// concatenate in evaluation order (database, application, security,
/// logging).
pub fn check_health(config: &AppConfig) -> HealthReport {
    let concerns = ConcernReports {
        database: check_database(config),
        application: check_application(config),
        security: check_security(config),
        logging: check_logging(config),
    };

    let ordered = [
        &concerns.database,
        &concerns.application,
        &concerns.security,
        &concerns.logging,
    ];
    let status = if ordered.iter().all(|concern| concern.is_healthy()) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };
    let issues = ordered
        .iter()
        .flat_map(|concern| concern.issues.iter().cloned())
        .collect();
    let warnings = ordered
        .iter()
        .flat_map(|concern| concern.warnings.iter().cloned())
        .collect();

    HealthReport {
        status,
        concerns,
        issues,
        warnings,
    }
}

fn check_database(config: &AppConfig) -> ConcernHealth {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let url = config.database.url.trim();
    if url.is_empty() {
        issues.push("DATABASE_URL is not set".to_string());
        return ConcernHealth::from_findings(issues, warnings);
    }

    if is_sqlite_url(url) {
        if config.is_production() {
            warnings.push("SQLite database in production".to_string());
        }
        if let Some(db_path) = sqlite_database_path(url) {
            let parent = db_path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(|parent| parent.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            if !parent.is_dir() {
                issues.push(format!(
                    "Database directory does not exist: {}",
                    parent.display()
                ));
            }
        }
    } else {
        match Url::parse(url) {
            Ok(parsed) => {
                if parsed.host_str().is_none_or(str::is_empty) {
                    issues.push("DATABASE_URL has no host".to_string());
                }
            }
            Err(err) => issues.push(format!("DATABASE_URL is unparsable: {err}")),
        }
    }

    ConcernHealth::from_findings(issues, warnings)
}

fn check_application(config: &AppConfig) -> ConcernHealth {
    let mut issues = Vec::new();
    let app = &config.application;

    if app.max_worker_threads == 0 {
        issues.push("MAX_WORKER_THREADS is zero".to_string());
    }
    if app.max_concurrent_streams == 0 {
        issues.push("MAX_CONCURRENT_STREAMS is zero".to_string());
    }
    for (name, value) in [
        ("HTTP_TIMEOUT", app.http_timeout_secs),
        ("STREAM_TIMEOUT", app.stream_timeout_secs),
        ("CONNECT_TIMEOUT", app.connect_timeout_secs),
    ] {
        if value == 0 {
            issues.push(format!("{name} is zero"));
        }
    }

    ConcernHealth::from_findings(issues, Vec::new())
}

fn check_security(config: &AppConfig) -> ConcernHealth {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let secret = config.security.secret_key.trim();
    if secret.is_empty() {
        issues.push("SECRET_KEY is not set".to_string());
    } else {
        if secret.chars().count() < 16 {
            issues.push("SECRET_KEY is shorter than 16 characters".to_string());
        }
        if secret == DEV_SECRET_PLACEHOLDER {
            if config.is_production() {
                issues.push("SECRET_KEY is the development placeholder".to_string());
            } else {
                warnings.push("SECRET_KEY is the development placeholder".to_string());
            }
        }
    }

    ConcernHealth::from_findings(issues, warnings)
}

fn check_logging(config: &AppConfig) -> ConcernHealth {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let level = config.logging.level.trim().to_lowercase();
    if !VALID_LOG_LEVELS.iter().any(|value| *value == level) {
        issues.push(format!("LOG_LEVEL {level:?} is not valid"));
    }

    let dir = &config.logging.dir;
    if dir.exists() {
        if !dir.is_dir() {
            issues.push(format!("LOG_DIR is not a directory: {}", dir.display()));
        }
    } else {
        warnings.push(format!(
            "LOG_DIR does not exist yet: {}",
            dir.display()
        ));
    }

    ConcernHealth::from_findings(issues, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_config(temp: &tempfile::TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.logging.dir = temp.path().to_path_buf();
        config.database.url = format!("sqlite:///{}/app.db", temp.path().display());
        config.security.secret_key = "0123456789abcdef0123".to_string();
        config
    }

    #[test]
    fn test_healthy_config_reports_healthy() {
        let temp = tempfile::tempdir().unwrap();
        let report = check_health(&healthy_config(&temp));
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_single_unhealthy_concern_marks_report_unhealthy() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = healthy_config(&temp);
        config.security.secret_key = "short".to_string();
        let report = check_health(&config);
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.concerns.database.is_healthy());
        assert!(report.concerns.application.is_healthy());
        assert!(!report.concerns.security.is_healthy());
        assert!(report.concerns.logging.is_healthy());
    }

    #[test]
    fn test_issue_concatenation_matches_per_concern_counts() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = healthy_config(&temp);
        config.database.url = String::new();
        config.application.max_worker_threads = 0;
        config.application.http_timeout_secs = 0;
        config.security.secret_key = String::new();
        config.logging.level = "loud".to_string();

        let report = check_health(&config);
        let per_concern = report.concerns.database.issues.len()
            + report.concerns.application.issues.len()
            + report.concerns.security.issues.len()
            + report.concerns.logging.issues.len();
        assert_eq!(report.issues.len(), per_concern);
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_issues_ordered_by_concern_evaluation() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = healthy_config(&temp);
        config.database.url = String::new();
        config.logging.level = "loud".to_string();

        let report = check_health(&config);
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues[0].contains("DATABASE_URL"));
        assert!(report.issues[1].contains("LOG_LEVEL"));
    }

    #[test]
    fn test_warnings_do_not_affect_status() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = healthy_config(&temp);
        config.logging.dir = temp.path().join("not-yet-created");
        let report = check_health(&config);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_placeholder_secret_is_issue_only_in_production() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = healthy_config(&temp);
        config.security.secret_key = DEV_SECRET_PLACEHOLDER.to_string();
        let report = check_health(&config);
        assert!(report.concerns.security.is_healthy());
        assert!(!report.concerns.security.warnings.is_empty());

        config.environment = "production".to_string();
        let report = check_health(&config);
        assert!(!report.concerns.security.is_healthy());
    }

    #[test]
    fn test_report_serialization_shape() {
        let temp = tempfile::tempdir().unwrap();
        let report = check_health(&healthy_config(&temp));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json["concerns"]["database"]["issues"].as_array().is_some());
        assert!(json["concerns"]["logging"]["status"].as_str().is_some());
    }
}
