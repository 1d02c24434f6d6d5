//! blogsmith CLI entry point.

use anyhow::Result;
use blogsmith::cli::preflight::{self, Operation};
use blogsmith::cli::{commands, Cli, Commands, Output};
use blogsmith::config::Settings;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("blogsmith={},tower_http={}", log_level, log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let api_key = cli.api_key.as_deref();

    // Execute command
    match cli.command {
        Commands::Topic {
            topic,
            language,
            json,
        } => {
            let key = require_key(Operation::Topic, api_key, &settings)?;
            commands::run_topic(&topic, language.as_deref(), json, &key, settings).await?;
        }

        Commands::Youtube {
            url,
            language,
            json,
        } => {
            let key = require_key(Operation::Youtube, api_key, &settings)?;
            commands::run_youtube(&url, language.as_deref(), json, &key, settings).await?;
        }

        Commands::Transcript { input, output } => {
            preflight::check(Operation::Transcript, api_key, &settings)?;
            commands::run_transcript(&input, output, settings).await?;
        }

        Commands::Serve { host, port } => {
            let key = require_key(Operation::Serve, api_key, &settings)?;
            commands::run_serve(host, port, &key, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}

/// Run pre-flight checks for an operation that talks to the model.
fn require_key(operation: Operation, api_key: Option<&str>, settings: &Settings) -> Result<String> {
    match preflight::check(operation, api_key, settings) {
        Ok(Some(key)) => Ok(key),
        Ok(None) => Err(anyhow::anyhow!("No API key available")),
        Err(e) => {
            Output::error(&e.to_string());
            Err(e.into())
        }
    }
}
