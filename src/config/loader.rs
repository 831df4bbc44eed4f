use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::config::schema::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Merged configuration is invalid: {0}")]
    Deserialize(#[source] serde_yaml::Error),

    #[error("Invalid value for {key} in {path}: {value:?}")]
    Overlay {
        key: String,
        value: String,
        path: PathBuf,
    },
}

/// Where a configuration handle gets its data from. Reload capability is
/// fixed at construction: file-backed sources reload, fixed ones do not.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Merged `*.yaml`/`*.yml` files plus an optional `.env` overlay.
    Files {
        config_dir: PathBuf,
        dotenv: Option<PathBuf>,
    },
    /// An in-memory configuration with no backing files.
    Fixed(AppConfig),
}

impl ConfigSource {
    pub fn supports_reload(&self) -> bool {
        matches!(self, Self::Files { .. })
    }

    /// Loads a fresh configuration from the source.
    pub fn load(&self) -> Result<AppConfig, LoadError> {
        match self {
            Self::Files { config_dir, dotenv } => load_config(config_dir, dotenv.as_deref()),
            Self::Fixed(config) => Ok(config.clone()),
        }
    }

    pub fn config_dir(&self) -> Option<&Path> {
        match self {
            Self::Files { config_dir, .. } => Some(config_dir),
            Self::Fixed(_) => None,
        }
    }
}

/// Loads the merged configuration from a directory of YAML files plus an
/// optional `.env` overlay.
///
/// Files merge in lexicographic filename order (later overrides earlier,
/// nested mappings merge recursively). A missing or empty directory yields
/// the default configuration.
pub fn load_config(config_dir: &Path, dotenv: Option<&Path>) -> Result<AppConfig, LoadError> {
    let mut merged = Value::Null;

    for path in yaml_files(config_dir)? {
        let contents = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let value: Value =
            serde_yaml::from_str(&contents).map_err(|source| LoadError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Merged config file");
        merged = merge_values(merged, value);
    }

    let mut config = if merged.is_null() {
        AppConfig::default()
    } else {
        serde_yaml::from_value(merged).map_err(LoadError::Deserialize)?
    };

    if let Some(dotenv) = dotenv {
        if dotenv.exists() {
            apply_dotenv(&mut config, dotenv)?;
        }
    }

    Ok(config)
}

/// Lists `*.yaml`/`*.yml` files in the directory, sorted by file name.
fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    files.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));
    Ok(files)
}

/// Recursively merges `overlay` onto `base`; mappings merge key-by-key,
/// everything else is replaced by the overlay value.
fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_values(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Applies a `.env` overlay to an already-loaded configuration. Known
/// UPPER_SNAKE keys override the matching field; unknown keys are skipped.
fn apply_dotenv(config: &mut AppConfig, path: &Path) -> Result<(), LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    for line in contents.lines() {
        let Some((key, value)) = parse_dotenv_line(line) else {
            continue;
        };
        apply_setting(config, key, value, path)?;
    }

    Ok(())
}

/// Parses one `.env` line into a key/value pair. Blank lines and comments
/// yield None; a leading `export ` and surrounding quotes are stripped.
fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Some((key, value))
}

fn apply_setting(
    config: &mut AppConfig,
    key: &str,
    value: &str,
    path: &Path,
) -> Result<(), LoadError> {
    let overlay_err = || LoadError::Overlay {
        key: key.to_string(),
        value: value.to_string(),
        path: path.to_path_buf(),
    };

    match key {
        "ENVIRONMENT" => config.environment = value.to_string(),
        "DEBUG" => config.debug = parse_bool(value).ok_or_else(overlay_err)?,
        "TESTING" => config.testing = parse_bool(value).ok_or_else(overlay_err)?,
        "DATABASE_URL" => config.database.url = value.to_string(),
        "DATABASE_POOL_SIZE" => {
            config.database.pool_size = value.parse().map_err(|_| overlay_err())?;
        }
        "RECORD_QUERIES" => {
            config.database.record_queries = parse_bool(value).ok_or_else(overlay_err)?;
        }
        "MAX_WORKER_THREADS" => {
            config.application.max_worker_threads = value.parse().map_err(|_| overlay_err())?;
        }
        "MAX_CONCURRENT_STREAMS" => {
            config.application.max_concurrent_streams = value.parse().map_err(|_| overlay_err())?;
        }
        "HTTP_TIMEOUT" => {
            config.application.http_timeout_secs = value.parse().map_err(|_| overlay_err())?;
        }
        "STREAM_TIMEOUT" => {
            config.application.stream_timeout_secs = value.parse().map_err(|_| overlay_err())?;
        }
        "CONNECT_TIMEOUT" => {
            config.application.connect_timeout_secs = value.parse().map_err(|_| overlay_err())?;
        }
        "SECRET_KEY" => config.security.secret_key = value.to_string(),
        "MAX_CONNECTIONS" => {
            config.network.max_connections = value.parse().map_err(|_| overlay_err())?;
        }
        "MAX_CONNECTIONS_PER_HOST" => {
            config.network.max_connections_per_host = value.parse().map_err(|_| overlay_err())?;
        }
        "LOG_LEVEL" => config.logging.level = value.to_string(),
        "LOG_DIR" => config.logging.dir = PathBuf::from(value),
        _ => {
            debug!(key, "Ignoring unknown .env key");
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_directory_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = load_config(&temp.path().join("absent"), None).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_later_files_override_earlier() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join("00-base.yaml"),
            "environment: development\napplication:\n  max_worker_threads: 2\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("10-override.yaml"),
            "application:\n  max_worker_threads: 8\n",
        )
        .unwrap();

        let config = load_config(temp.path(), None).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.application.max_worker_threads, 8);
        // Untouched siblings survive the merge.
        assert_eq!(config.application.max_concurrent_streams, 50);
    }

    #[test]
    fn test_non_yaml_files_ignored() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "environment: production\n").unwrap();
        let config = load_config(temp.path(), None).unwrap();
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_dotenv_overlay_wins_over_yaml() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join("app.yaml"),
            "application:\n  max_worker_threads: 2\n",
        )
        .unwrap();
        let dotenv = temp.path().join(".env");
        fs::write(&dotenv, "MAX_WORKER_THREADS=12\nSECRET_KEY=\"0123456789abcdef0123\"\n").unwrap();

        let config = load_config(temp.path(), Some(&dotenv)).unwrap();
        assert_eq!(config.application.max_worker_threads, 12);
        assert_eq!(config.security.secret_key, "0123456789abcdef0123");
    }

    #[test]
    fn test_dotenv_unknown_keys_ignored() {
        let temp = tempfile::tempdir().unwrap();
        let dotenv = temp.path().join(".env");
        fs::write(&dotenv, "# comment\n\nUNRELATED_SETTING=1\nexport DEBUG=false\n").unwrap();

        let config = load_config(temp.path(), Some(&dotenv)).unwrap();
        assert!(!config.debug);
    }

    #[test]
    fn test_dotenv_bad_value_for_known_key_errors() {
        let temp = tempfile::tempdir().unwrap();
        let dotenv = temp.path().join(".env");
        fs::write(&dotenv, "MAX_WORKER_THREADS=many\n").unwrap();

        let err = load_config(temp.path(), Some(&dotenv)).unwrap_err();
        assert!(matches!(err, LoadError::Overlay { ref key, .. } if key == "MAX_WORKER_THREADS"));
    }

    #[test]
    fn test_parse_error_reports_file() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("broken.yaml"), "application: [unclosed\n").unwrap();

        let err = load_config(temp.path(), None).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_parse_dotenv_line_variants() {
        assert_eq!(parse_dotenv_line("KEY=value"), Some(("KEY", "value")));
        assert_eq!(parse_dotenv_line("export KEY=value"), Some(("KEY", "value")));
        assert_eq!(parse_dotenv_line("KEY='quoted'"), Some(("KEY", "quoted")));
        assert_eq!(parse_dotenv_line("# comment"), None);
        assert_eq!(parse_dotenv_line("   "), None);
        assert_eq!(parse_dotenv_line("NOEQUALS"), None);
    }

    #[test]
    fn test_fixed_source_does_not_reload() {
        let source = ConfigSource::Fixed(AppConfig::default());
        assert!(!source.supports_reload());
        assert_eq!(source.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_files_source_reports_reload_support() {
        let temp = tempfile::tempdir().unwrap();
        let source = ConfigSource::Files {
            config_dir: temp.path().to_path_buf(),
            dotenv: None,
        };
        assert!(source.supports_reload());
        assert_eq!(source.config_dir(), Some(temp.path()));
    }
}
