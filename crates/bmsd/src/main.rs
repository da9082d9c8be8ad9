//! bmsd - Building Monitoring Daemon
//!
//! REST API for hotel floor fault monitoring: fault lists, analysis,
//! sensor reading ingestion with fault detection, and change events.
//!
//! Usage:
//!   bmsd [OPTIONS] [config.toml]
//!
//! If no config file is provided, runs on 0.0.0.0:18090 with an empty store.

mod config;

use std::path::Path;
use std::sync::Arc;

use bms_api::{create_router, AppState};
use bms_core::{FaultDetector, MemoryStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DaemonConfig;

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
    /// Override for the configured port
    port: Option<u16>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args {
        config_path: None,
        port: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                match args.get(i + 1).map(|p| p.parse::<u16>()) {
                    Some(Ok(port)) => result.port = Some(port),
                    Some(Err(_)) => tracing::error!("Invalid port: {}", args[i + 1]),
                    None => tracing::error!("Missing argument for --port"),
                }
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"bmsd - Building Monitoring Daemon

Usage: bmsd [OPTIONS] [config.toml]

Options:
  -p, --port <port>  Listen on this port instead of the configured one
  -h, --help         Print this help message

Examples:
  # Run with defaults and an empty store
  bmsd

  # Run with config file (detection limits, seed data)
  bmsd config/bmsd.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bmsd=info,bms_api=info,bms_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting bmsd (Building Monitoring Daemon)");

    let args = parse_args();

    let mut config = if let Some(ref path) = args.config_path {
        tracing::info!("Loading config from: {}", path);
        DaemonConfig::load(Path::new(path))?
    } else {
        tracing::info!("No config file provided, using defaults");
        DaemonConfig::default()
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let faults = config.seed.load_faults()?;
    let readings = config.seed.load_readings()?;
    let store = MemoryStore::with_data(faults, readings);

    let state = AppState::new(Arc::new(store))
        .with_detector(FaultDetector::new(config.detection.clone()))
        .with_offline_threshold(chrono::Duration::seconds(
            config.sensors.offline_threshold_secs,
        ));

    // Create the router
    let app = create_router(state);

    // Bind to address
    let addr = config.listen_addr()?;
    tracing::info!("Listening on http://{}", addr);

    // Run the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
