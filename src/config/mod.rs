//! Configuration management module.

pub mod loader;
pub mod paths;
pub mod schema;
pub mod validation;

pub use loader::{ConfigSource, LoadError, load_config};
pub use paths::Paths;
pub use schema::{
    AppConfig, ApplicationConfig, DatabaseConfig, LoggingConfig, MonitorConfig, NetworkConfig,
    SecurityConfig,
};
pub use validation::{ValidationError, ValidationResult, ValidationWarning, validate_config};
