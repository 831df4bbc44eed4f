use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::config::schema::{AppConfig, DEV_SECRET_PLACEHOLDER};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

/// Validates a loaded configuration against field ranges and cross-field
/// constraints. Produces a fresh result on every call; errors mean the
/// configuration is unsafe to run, warnings are advisory.
pub fn validate_config(config: &AppConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_database(config, &mut errors, &mut warnings);
    validate_application(config, &mut errors, &mut warnings);
    validate_security(config, &mut errors, &mut warnings);
    validate_network(config, &mut errors, &mut warnings);
    validate_logging(config, &mut errors, &mut warnings);

    match config.environment.trim().to_lowercase().as_str() {
        "production" => validate_production(config, &mut errors, &mut warnings),
        "development" => validate_development(config, &mut warnings),
        "testing" => validate_testing(config, &mut errors, &mut warnings),
        _ => {}
    }

    ValidationResult { errors, warnings }
}

fn validate_database(
    config: &AppConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let url = config.database.url.trim();
    if url.is_empty() {
        errors.push(ValidationError {
            field: "database.url".to_string(),
            message: "DATABASE_URL is required".to_string(),
            suggestion: Some("Set database.url or the DATABASE_URL overlay".to_string()),
        });
        return;
    }

    if is_sqlite_url(url) {
        if config.is_production() {
            warnings.push(ValidationWarning {
                field: "database.url".to_string(),
                message: "DATABASE_URL uses SQLite, which is not recommended in production"
                    .to_string(),
            });
        }
        if let Some(db_path) = sqlite_database_path(url) {
            validate_sqlite_parent(&db_path, errors);
        }
    } else {
        validate_server_url(url, errors);
    }

    if config.database.pool_size > 100 {
        warnings.push(ValidationWarning {
            field: "database.pool_size".to_string(),
            message: format!(
                "DATABASE_POOL_SIZE of {} is unusually large",
                config.database.pool_size
            ),
        });
    }
}

/// Checks host, username, and database name on a networked database URL.
/// A parse failure becomes a single database-tagged error rather than
/// aborting the remaining checks.
fn validate_server_url(url: &str, errors: &mut Vec<ValidationError>) {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(err) => {
            errors.push(ValidationError {
                field: "database.url".to_string(),
                message: format!("Invalid DATABASE_URL: {err}"),
                suggestion: None,
            });
            return;
        }
    };

    if parsed.host_str().is_none_or(str::is_empty) {
        errors.push(ValidationError {
            field: "database.url".to_string(),
            message: "DATABASE_URL must include a database host".to_string(),
            suggestion: None,
        });
    }

    if parsed.username().is_empty() {
        errors.push(ValidationError {
            field: "database.url".to_string(),
            message: "DATABASE_URL must include a username".to_string(),
            suggestion: None,
        });
    }

    if parsed.path().trim_matches('/').is_empty() {
        errors.push(ValidationError {
            field: "database.url".to_string(),
            message: "DATABASE_URL must name a database".to_string(),
            suggestion: Some("Append /<database> to the URL".to_string()),
        });
    }
}

fn validate_sqlite_parent(db_path: &Path, errors: &mut Vec<ValidationError>) {
    let parent = match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !parent.is_dir() {
        errors.push(ValidationError {
            field: "database.url".to_string(),
            message: format!(
                "Database directory does not exist: {}",
                parent.display()
            ),
            suggestion: Some("Create the directory or update DATABASE_URL".to_string()),
        });
        return;
    }

    if !is_dir_writable(&parent) {
        errors.push(ValidationError {
            field: "database.url".to_string(),
            message: format!("Database directory is not writable: {}", parent.display()),
            suggestion: None,
        });
    }
}

fn validate_application(
    config: &AppConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let app = &config.application;

    if app.max_worker_threads == 0 {
        errors.push(ValidationError {
            field: "application.max_worker_threads".to_string(),
            message: "MAX_WORKER_THREADS must be a positive integer".to_string(),
            suggestion: Some("Use a value of at least 1".to_string()),
        });
    } else if app.max_worker_threads > 100 {
        warnings.push(ValidationWarning {
            field: "application.max_worker_threads".to_string(),
            message: format!("MAX_WORKER_THREADS of {} is unusually high", app.max_worker_threads),
        });
    }

    if app.max_concurrent_streams == 0 {
        errors.push(ValidationError {
            field: "application.max_concurrent_streams".to_string(),
            message: "MAX_CONCURRENT_STREAMS must be a positive integer".to_string(),
            suggestion: Some("Use a value of at least 1".to_string()),
        });
    } else if app.max_concurrent_streams > 1000 {
        warnings.push(ValidationWarning {
            field: "application.max_concurrent_streams".to_string(),
            message: format!(
                "MAX_CONCURRENT_STREAMS of {} is unusually high",
                app.max_concurrent_streams
            ),
        });
    }

    let timeouts = [
        ("application.http_timeout_secs", "HTTP_TIMEOUT", app.http_timeout_secs),
        ("application.stream_timeout_secs", "STREAM_TIMEOUT", app.stream_timeout_secs),
        ("application.connect_timeout_secs", "CONNECT_TIMEOUT", app.connect_timeout_secs),
    ];
    for (field, name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError {
                field: field.to_string(),
                message: format!("{name} must be a positive integer"),
                suggestion: Some("Use a value of at least 1 second".to_string()),
            });
        } else if value > 3600 {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{name} of {value}s exceeds one hour"),
            });
        }
    }
}

fn validate_security(
    config: &AppConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let secret = config.security.secret_key.trim();

    if secret.is_empty() {
        errors.push(ValidationError {
            field: "security.secret_key".to_string(),
            message: "SECRET_KEY is required".to_string(),
            suggestion: Some("Generate a random key of at least 16 characters".to_string()),
        });
        return;
    }

    if secret.chars().count() < 16 {
        errors.push(ValidationError {
            field: "security.secret_key".to_string(),
            message: "SECRET_KEY must be at least 16 characters".to_string(),
            suggestion: None,
        });
    }

    if secret == DEV_SECRET_PLACEHOLDER {
        if config.is_production() {
            errors.push(ValidationError {
                field: "security.secret_key".to_string(),
                message: "SECRET_KEY is the development placeholder and must be changed in production"
                    .to_string(),
                suggestion: None,
            });
        } else {
            warnings.push(ValidationWarning {
                field: "security.secret_key".to_string(),
                message: "SECRET_KEY is the development placeholder".to_string(),
            });
        }
    }
}

fn validate_network(
    config: &AppConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let network = &config.network;

    if network.max_connections == 0 {
        errors.push(ValidationError {
            field: "network.max_connections".to_string(),
            message: "MAX_CONNECTIONS must be a positive integer".to_string(),
            suggestion: Some("Use a value of at least 1".to_string()),
        });
    }

    if network.max_connections_per_host == 0 {
        errors.push(ValidationError {
            field: "network.max_connections_per_host".to_string(),
            message: "MAX_CONNECTIONS_PER_HOST must be a positive integer".to_string(),
            suggestion: Some("Use a value of at least 1".to_string()),
        });
    }

    // Soft inconsistency: the per-host cap can never be reached.
    if network.max_connections_per_host > network.max_connections {
        warnings.push(ValidationWarning {
            field: "network.max_connections_per_host".to_string(),
            message: format!(
                "MAX_CONNECTIONS_PER_HOST ({}) exceeds MAX_CONNECTIONS ({})",
                network.max_connections_per_host, network.max_connections
            ),
        });
    }
}

fn validate_logging(
    config: &AppConfig,
    errors: &mut Vec<ValidationError>,
    _warnings: &mut Vec<ValidationWarning>,
) {
    let level = config.logging.level.trim().to_lowercase();
    if !VALID_LOG_LEVELS.iter().any(|value| *value == level) {
        errors.push(ValidationError {
            field: "logging.level".to_string(),
            message: format!("Invalid LOG_LEVEL: {level}"),
            suggestion: Some(format!("Valid levels: {}", VALID_LOG_LEVELS.join(", "))),
        });
    }

    let dir = &config.logging.dir;
    if dir.exists() {
        if !dir.is_dir() {
            errors.push(ValidationError {
                field: "logging.dir".to_string(),
                message: format!("LOG_DIR is not a directory: {}", dir.display()),
                suggestion: None,
            });
        } else if !is_dir_writable(dir) {
            errors.push(ValidationError {
                field: "logging.dir".to_string(),
                message: format!("LOG_DIR is not writable: {}", dir.display()),
                suggestion: None,
            });
        }
    } else if let Err(err) = fs::create_dir_all(dir) {
        errors.push(ValidationError {
            field: "logging.dir".to_string(),
            message: format!("LOG_DIR could not be created: {err}"),
            suggestion: Some("Create the directory or update logging.dir".to_string()),
        });
    }
}

fn validate_production(
    config: &AppConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    if config.debug {
        errors.push(ValidationError {
            field: "debug".to_string(),
            message: "DEBUG must be disabled in production".to_string(),
            suggestion: Some("Set debug: false".to_string()),
        });
    }

    if config.database.record_queries {
        warnings.push(ValidationWarning {
            field: "database.record_queries".to_string(),
            message: "RECORD_QUERIES adds overhead and is rarely wanted in production".to_string(),
        });
    }

    if config.application.http_timeout_secs < 30 {
        warnings.push(ValidationWarning {
            field: "application.http_timeout_secs".to_string(),
            message: format!(
                "HTTP_TIMEOUT of {}s is low for production",
                config.application.http_timeout_secs
            ),
        });
    }

    if config.application.max_worker_threads < 4 {
        warnings.push(ValidationWarning {
            field: "application.max_worker_threads".to_string(),
            message: format!(
                "MAX_WORKER_THREADS of {} is low for production",
                config.application.max_worker_threads
            ),
        });
    }

    warn_missing_database_ssl(config, warnings);
}

/// Best-effort heuristic: a networked database on a non-loopback host
/// should carry explicit SSL settings in its URL query.
fn warn_missing_database_ssl(config: &AppConfig, warnings: &mut Vec<ValidationWarning>) {
    let url = config.database.url.trim();
    if is_sqlite_url(url) {
        return;
    }
    let Ok(parsed) = Url::parse(url) else {
        return;
    };
    let Some(host) = parsed.host_str() else {
        return;
    };
    if is_loopback_host(host) {
        return;
    }

    let has_ssl_config = parsed
        .query_pairs()
        .any(|(key, _)| matches!(key.as_ref(), "ssl" | "sslmode" | "ssl_ca" | "sslrootcert"));
    if !has_ssl_config {
        warnings.push(ValidationWarning {
            field: "database.url".to_string(),
            message: format!(
                "DATABASE_URL host {host} looks external but has no SSL configuration"
            ),
        });
    }
}

fn validate_development(config: &AppConfig, warnings: &mut Vec<ValidationWarning>) {
    if !config.debug {
        warnings.push(ValidationWarning {
            field: "debug".to_string(),
            message: "DEBUG is disabled in a development environment".to_string(),
        });
    }

    if config.application.http_timeout_secs > 60 {
        warnings.push(ValidationWarning {
            field: "application.http_timeout_secs".to_string(),
            message: format!(
                "HTTP_TIMEOUT of {}s is high for development",
                config.application.http_timeout_secs
            ),
        });
    }
}

fn validate_testing(
    config: &AppConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    if !config.testing {
        errors.push(ValidationError {
            field: "testing".to_string(),
            message: "TESTING must be true when environment is testing".to_string(),
            suggestion: Some("Set testing: true".to_string()),
        });
    }

    if config.debug {
        warnings.push(ValidationWarning {
            field: "debug".to_string(),
            message: "DEBUG is enabled in a testing environment".to_string(),
        });
    }

    let url = config.database.url.to_lowercase();
    if !url.contains(":memory:") && !url.contains("test") {
        warnings.push(ValidationWarning {
            field: "database.url".to_string(),
            message: "DATABASE_URL does not look like a test database".to_string(),
        });
    }
}

pub(crate) fn is_sqlite_url(url: &str) -> bool {
    url.starts_with("sqlite:")
}

/// Extracts the file path from a SQLite URL; None for in-memory databases.
/// `sqlite:///data/app.db` is relative, `sqlite:////var/app.db` absolute.
pub(crate) fn sqlite_database_path(url: &str) -> Option<PathBuf> {
    if url.contains(":memory:") {
        return None;
    }
    let rest = url.strip_prefix("sqlite:")?.strip_prefix("//")?;
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    if rest.is_empty() {
        return None;
    }
    Some(PathBuf::from(rest))
}

pub(crate) fn is_loopback_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
}

/// Probes writability by creating and removing a throwaway file; permission
/// bits alone are not trustworthy across platforms.
pub(crate) fn is_dir_writable(dir: &Path) -> bool {
    let probe = dir.join(format!(".agrypnia-probe-{}", std::process::id()));
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
    {
        Ok(file) => {
            drop(file);
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}
