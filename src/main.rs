use clap::Parser;

use agrypnia::cli::app::{Cli, Commands, ConfigAction};
use agrypnia::cli::commands;
use agrypnia::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing("info", false)?;

    match cli.command {
        Some(Commands::Run { config_dir, dotenv }) => {
            commands::run::handle_run(config_dir, dotenv).await
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { force } => commands::config::handle_init(force).await,
            ConfigAction::Show { config_dir } => commands::config::handle_show(config_dir).await,
            ConfigAction::Validate { config_dir } => {
                commands::config::handle_validate(config_dir).await
            }
        },
        Some(Commands::Health { config_dir, json }) => {
            commands::health::handle_health(config_dir, json).await
        }
        None => {
            println!("agrypnia - configuration watchdog for stream servers");
            println!("Use --help to see available commands");
            Ok(())
        }
    }
}
