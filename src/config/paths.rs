use std::env;
use std::path::PathBuf;

/// Path resolution for the watched configuration inputs.
pub struct Paths;

impl Paths {
    /// Returns the configuration directory holding `*.yaml`/`*.yml` files.
    /// - Default: ./config relative to the working directory
    /// - Override: AGRYPNIA_CONFIG_DIR env var
    pub fn config_dir() -> PathBuf {
        if let Ok(path) = env::var("AGRYPNIA_CONFIG_DIR") {
            return PathBuf::from(path);
        }
        PathBuf::from("config")
    }

    /// Returns the `.env` overlay file path.
    /// - Default: .env in the working directory
    /// - Override: AGRYPNIA_DOTENV env var
    pub fn dotenv_file() -> PathBuf {
        if let Ok(path) = env::var("AGRYPNIA_DOTENV") {
            return PathBuf::from(path);
        }
        PathBuf::from(".env")
    }

    /// Returns the state directory for agrypnia's own artifacts.
    /// - Linux: ~/.local/state/agrypnia/
    /// - Override: AGRYPNIA_STATE env var
    pub fn state_dir() -> PathBuf {
        if let Ok(path) = env::var("AGRYPNIA_STATE") {
            return PathBuf::from(path);
        }
        dirs::state_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
            .unwrap_or_else(|| PathBuf::from(".local/state"))
            .join("agrypnia")
    }
}
