//! BMS CLI - Command-line tool for hotel building fault data
//!
//! Decodes fault bitmasks, prints the fault bit table, summarises exported
//! fault lists and runs fault detection on single readings. Works offline.

mod commands;
mod config;
mod output;

use anyhow::Result;
use bms_core::SensorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::DetectArgs;
use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "bms-cli")]
#[command(author, version, about = "Hotel building fault monitoring CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BMS_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain a fault bitmask (decimal, 0x hex or 0b binary)
    Decode {
        /// Fault flags value
        #[arg(allow_hyphen_values = true)]
        flags: String,
    },

    /// Print the fault bit table
    Flags,

    /// Fault statistics for a JSON export of fault records
    Summary {
        /// JSON file containing an array of fault records
        file: PathBuf,

        /// Time range: 30min, 1hour, 6hours, 1day, 1week
        #[arg(long)]
        range: Option<String>,

        /// Use every record regardless of time
        #[arg(long, conflicts_with = "range")]
        all: bool,
    },

    /// Run fault detection on a single reading
    Detect {
        /// Sensor type: iaq, power, presence
        #[arg(long)]
        kind: SensorKind,

        /// Temperature (°C)
        #[arg(long)]
        temperature: Option<f64>,

        /// Relative humidity (%)
        #[arg(long)]
        humidity: Option<f64>,

        /// CO2 (ppm)
        #[arg(long)]
        co2: Option<f64>,

        /// Power (kW)
        #[arg(long)]
        power: Option<f64>,

        /// Presence (0 none, 1 partial, 2 full, 3 error)
        #[arg(long)]
        presence: Option<i32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(cli.output, cli.no_color)?;

    // Create output context
    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);

    // Execute command
    match cli.command {
        Commands::Decode { flags } => {
            commands::decode(&flags, &ctx)?;
        }

        Commands::Flags => {
            commands::flags(&ctx);
        }

        Commands::Summary { file, range, all } => {
            let range = range.unwrap_or(merged.range);
            commands::summary(&file, &range, all, &ctx)?;
        }

        Commands::Detect {
            kind,
            temperature,
            humidity,
            co2,
            power,
            presence,
        } => {
            let args = DetectArgs {
                kind,
                temperature,
                humidity,
                co2,
                power,
                presence,
            };
            commands::detect(args, &merged.detection, &ctx)?;
        }
    }

    Ok(())
}
