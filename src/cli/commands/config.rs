use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::loader::{LoadError, load_config};
use crate::config::paths::Paths;
use crate::config::validation::validate_config;

pub async fn handle_init(force: bool) -> anyhow::Result<()> {
    let config_dir = Paths::config_dir();
    let config_path = config_dir.join("agrypnia.yaml");

    if config_path.exists() && !force && !confirm_overwrite(&config_path)? {
        println!("Aborted.");
        return Ok(());
    }

    fs::create_dir_all(&config_dir)?;
    fs::write(&config_path, starter_config_yaml())?;

    println!("Config created at {}", config_path.display());
    println!("Edit it, then check with: agrypnia config validate");

    Ok(())
}

pub async fn handle_show(config_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_or_explain(config_dir)?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

pub async fn handle_validate(config_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_or_explain(config_dir)?;

    let result = validate_config(&config);
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.field, warning.message);
    }
    if !result.is_valid() {
        for error in &result.errors {
            eprintln!("error: {}: {}", error.field, error.message);
            if let Some(suggestion) = &error.suggestion {
                eprintln!("  hint: {suggestion}");
            }
        }
        anyhow::bail!("Configuration errors: {}", result.errors.len());
    }

    println!("Configuration valid");
    Ok(())
}

fn load_or_explain(config_dir: Option<PathBuf>) -> anyhow::Result<crate::config::AppConfig> {
    let config_dir = config_dir.unwrap_or_else(Paths::config_dir);
    let dotenv = Paths::dotenv_file();

    if !config_dir.is_dir() {
        println!(
            "No config directory at {}, will use defaults",
            config_dir.display()
        );
    }

    load_config(&config_dir, Some(&dotenv)).map_err(|err| match err {
        LoadError::Parse { .. } => anyhow::anyhow!("Configuration syntax error: {err}"),
        LoadError::Deserialize(_) | LoadError::Overlay { .. } => {
            anyhow::anyhow!("Configuration value error: {err}")
        }
        other => anyhow::anyhow!(other),
    })
}

fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    print!(
        "Config already exists at {}. Overwrite? [y/N] ",
        path.display()
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let response = input.trim();
    Ok(response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes"))
}

fn starter_config_yaml() -> &'static str {
    r#"# agrypnia configuration
# Files in this directory merge in filename order; a .env file in the
# working directory overlays individual settings (DATABASE_URL, SECRET_KEY, ...).

# Deployment environment: production, development, or testing
environment: development
debug: true
testing: false

database:
  # DATABASE_URL
  url: "sqlite:///data/app.db"
  # Engine pool size (DATABASE_POOL_SIZE)
  pool_size: 10
  # Record executed queries (RECORD_QUERIES)
  record_queries: false

application:
  # Worker thread count (MAX_WORKER_THREADS)
  max_worker_threads: 4
  # Concurrent stream cap (MAX_CONCURRENT_STREAMS)
  max_concurrent_streams: 50
  # Timeouts in seconds (HTTP_TIMEOUT, STREAM_TIMEOUT, CONNECT_TIMEOUT)
  http_timeout_secs: 60
  stream_timeout_secs: 300
  connect_timeout_secs: 10

security:
  # SECRET_KEY: at least 16 characters; never ship the placeholder
  secret_key: "dev-secret-change-in-production"

network:
  # MAX_CONNECTIONS / MAX_CONNECTIONS_PER_HOST
  max_connections: 100
  max_connections_per_host: 10

logging:
  # LOG_LEVEL: trace, debug, info, warn, error
  level: "info"
  # LOG_DIR: created on demand
  dir: "logs"

monitor:
  # Debounce window for file events (milliseconds)
  debounce_ms: 1000
  # HTTP status API
  http_enabled: false
  http_port: 7655
  http_bind: "127.0.0.1"
"#
}
