use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agrypnia", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the configuration monitor
    Run {
        /// Configuration directory to watch
        #[arg(long, env = "AGRYPNIA_CONFIG_DIR")]
        config_dir: Option<PathBuf>,
        /// .env overlay file to watch
        #[arg(long, env = "AGRYPNIA_DOTENV")]
        dotenv: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run configuration health checks
    Health {
        /// Configuration directory to check
        #[arg(long, env = "AGRYPNIA_CONFIG_DIR")]
        config_dir: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize a starter configuration file
    Init {
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Show the effective merged configuration
    Show {
        /// Configuration directory to load
        #[arg(long, env = "AGRYPNIA_CONFIG_DIR")]
        config_dir: Option<PathBuf>,
    },
    /// Validate the configuration
    Validate {
        /// Configuration directory to load
        #[arg(long, env = "AGRYPNIA_CONFIG_DIR")]
        config_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_with_no_subcommand() {
        let cli = Cli::try_parse_from(["agrypnia"]);
        assert!(cli.is_ok());
        assert!(cli.unwrap().command.is_none());
    }

    #[test]
    fn test_cli_help_flag_exits_with_help_error() {
        let result = Cli::try_parse_from(["agrypnia", "--help"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_command_with_config_dir() {
        let _lock = crate::test_utils::ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("AGRYPNIA_CONFIG_DIR");
            std::env::remove_var("AGRYPNIA_DOTENV");
        }
        let cli = Cli::try_parse_from(["agrypnia", "run", "--config-dir", "/etc/app"]).unwrap();
        match cli.command {
            Some(Commands::Run { config_dir, dotenv }) => {
                assert_eq!(config_dir, Some(PathBuf::from("/etc/app")));
                assert!(dotenv.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_config_validate_command() {
        let cli = Cli::try_parse_from(["agrypnia", "config", "validate"]).unwrap();
        match cli.command {
            Some(Commands::Config {
                action: ConfigAction::Validate { .. },
            }) => {}
            _ => panic!("Expected Config Validate command"),
        }
    }

    #[test]
    fn test_config_init_force_flag() {
        let cli = Cli::try_parse_from(["agrypnia", "config", "init", "--force"]).unwrap();
        match cli.command {
            Some(Commands::Config {
                action: ConfigAction::Init { force },
            }) => assert!(force),
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_health_command_json_flag() {
        let cli = Cli::try_parse_from(["agrypnia", "health", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Health { json, .. }) => assert!(json),
            _ => panic!("Expected Health command"),
        }
    }

    #[test]
    fn test_invalid_command_fails() {
        let result = Cli::try_parse_from(["agrypnia", "invalid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_requires_subcommand() {
        let result = Cli::try_parse_from(["agrypnia", "config"]);
        assert!(result.is_err());
    }
}
