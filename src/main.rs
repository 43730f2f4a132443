mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;
use cli::{Cli, Commands, InspectCommand};
use hitcount::config::{Config, HumanDuration, TelemetryConfig};
use hitcount::counter::{Event, SlidingWindow, WindowOptions};
use hitcount::journal::{self, ReplayEnd};
use hitcount::observability::init_tracing;
use hitcount::snapshot::{self, SnapshotFormat};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let mut config = load_config(args.config)?;
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            init_tracing(&config.telemetry);
            hitcount::api::run(config).await?;
        }
        Commands::Inspect(command) => {
            init_tracing(&TelemetryConfig {
                log_level: "warn".to_string(),
                ..TelemetryConfig::default()
            });
            inspect(command)?;
        }
        Commands::Config(args) => {
            let config = load_config(args.config)?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config, AnyError> {
    let config = match path {
        Some(path) => {
            let _ = dotenvy::dotenv();
            Config::load_from_path(path)?
        }
        None => Config::load()?,
    };
    Ok(config)
}

fn inspect(command: InspectCommand) -> Result<(), AnyError> {
    match command {
        InspectCommand::Journal { path, window } => {
            let replay = journal::replay(&path)?;
            print_summary(&path, &replay.events, window);
            match replay.end {
                ReplayEnd::Clean => println!("end:        clean"),
                ReplayEnd::Damaged { offset, reason } => {
                    println!("end:        damaged at byte {offset} ({reason})")
                }
            }
        }
        InspectCommand::Snapshot {
            path,
            format,
            window,
        } => {
            let format = SnapshotFormat::from(format);
            match snapshot::restore(&path, format)? {
                Some(events) => print_summary(&path, &events, window),
                None => println!("{}: no snapshot", path.display()),
            }
        }
    }
    Ok(())
}

/// Counted the way the server would count them right now
fn print_summary(path: &Path, events: &[Event], window: HumanDuration) {
    let store = SlidingWindow::new(
        WindowOptions::builder()
            .window(window.as_duration())
            .initial(events.to_vec())
            .build(),
    );

    println!("file:       {}", path.display());
    println!("records:    {}", events.len());
    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        println!("first:      {}", first.to_rfc3339());
        println!("last:       {}", last.to_rfc3339());
    }
    println!("in window:  {} (last {})", store.len(), window);
}
