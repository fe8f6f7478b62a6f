//! g13d - Logitech G13 userspace driver

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use g13_daemon::{CoreCommand, CoreEvent, DaemonConfig, G13Service, logging, signals};
use g13_errors::{DeviceError, ErrorCategory, G13Error};
use g13_transport::G13Transport;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "g13d")]
#[command(about = "Userspace driver for the Logitech G13 gameboard")]
#[command(version)]
struct Cli {
    /// Configuration file (default: $HOME/.config/g13/g13d.json)
    #[arg(short, long, global = true, env = "G13D_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output in JSON format for machine parsing
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Drive the device until interrupted (default)
    Run,
    /// Load and validate the configuration, then exit
    CheckConfig,
    /// Print the built-in configuration as JSON
    PrintDefaultConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.command == Some(Commands::PrintDefaultConfig) {
        return match DaemonConfig::default().to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => report(&e, cli.json),
        };
    }

    let config = match load_config(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => return report(&e, cli.json),
    };

    if let Err(e) = logging::init(cli.verbose, &config.logging.filter) {
        return report(&e, cli.json);
    }

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::CheckConfig => check_config(&config, cli.json),
        Commands::Run | Commands::PrintDefaultConfig => run(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, cli.json),
    }
}

async fn load_config(path: Option<&Path>) -> Result<DaemonConfig> {
    match path {
        Some(path) => DaemonConfig::load_from_path(path).await,
        None => DaemonConfig::load().await,
    }
}

fn check_config(config: &DaemonConfig, json: bool) -> Result<()> {
    let outcome = config.validate();
    if json {
        let body = match &outcome {
            Ok(()) => serde_json::json!({ "valid": true }),
            Err(e) => serde_json::json!({ "valid": false, "error": format!("{e:#}") }),
        };
        println!("{body}");
    } else if outcome.is_ok() {
        println!("Configuration OK");
    }
    outcome
}

async fn run(config: DaemonConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    info!("Starting g13d v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.device.transport_settings();
    let transport = tokio::task::spawn_blocking(move || G13Transport::open(&settings))
        .await
        .map_err(|e| G13Error::other(format!("Device startup task failed: {e}")))??;

    let (service, handle) = G13Service::new(&config, transport)?;

    let commands = handle.commands.clone();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        if commands.send(CoreCommand::Shutdown).is_err() {
            debug!("Core already stopped");
        }
    });

    let mut events = handle.events;
    let listener = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                CoreEvent::Chord(keys) => info!(keys = ?keys, "Chord ready for injection"),
                CoreEvent::TransportFault(e) => debug!(error = %e, "Transport fault"),
                CoreEvent::Stopped(reason) => {
                    debug!(reason = %reason, "Core stopped");
                    break;
                }
                CoreEvent::Input(_) => {}
            }
        }
    });

    let reason = service.run().await?;
    if let Err(e) = listener.await {
        debug!(error = %e, "Event listener ended abnormally");
    }
    info!(reason = %reason, "g13d stopped");
    Ok(())
}

fn report(error: &anyhow::Error, json: bool) -> ExitCode {
    if json {
        eprintln!("{}", serde_json::json!({ "error": format!("{error:#}") }));
    } else {
        eprintln!("Error: {error:#}");
    }
    error!(error = %format!("{error:#}"), "g13d failed");
    ExitCode::from(exit_code(error))
}

fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(device) = error.chain().find_map(|e| e.downcast_ref::<DeviceError>()) {
        return match device {
            d if d.is_device_unavailable() => 2,
            DeviceError::PrivilegeDropFailed(_) => 6,
            _ => 3,
        };
    }
    match error
        .chain()
        .find_map(|e| e.downcast_ref::<G13Error>())
        .map(G13Error::category)
    {
        Some(ErrorCategory::Config) => 4,
        Some(ErrorCategory::IO) => 5,
        _ => 1,
    }
}
