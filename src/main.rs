//! Roundtable CLI entry point.

use anyhow::Result;
use clap::Parser;
use roundtable::cli::{commands, Cli, Commands};
use roundtable::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::load_from(cli.config.as_deref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("roundtable={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Run {
            team,
            task,
            transcript,
            model,
            max_turns,
        } => {
            commands::run_team(
                team,
                task.clone(),
                transcript.clone(),
                model.clone(),
                *max_turns,
                settings,
            )
            .await?;
        }

        Commands::Tools { json } => {
            commands::run_tools(*json, &settings)?;
        }

        Commands::Show { transcript } => {
            commands::run_show(transcript)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, cli.config.clone())?;
        }
    }

    Ok(())
}
