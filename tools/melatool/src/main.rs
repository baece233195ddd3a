//! melatool - conversion tool for MELA simulation data
//!
//! # Commands
//!
//! - `melatool convert` - Convert between MSB, PAR and JSON
//! - `melatool inspect` - Summarize an MSB or PAR file
//!
//! # Usage
//!
//! ```bash
//! # Binary inventory data to JSON on stdout
//! melatool convert plots.rsd
//!
//! # JSON back to MSB, written big-endian with 64-bit floats
//! melatool convert plots.json plots.rsd --endian big --float-type f64
//!
//! # Re-encode between machine formats
//! melatool convert in.rsd out.rsd --out-uid-type u32
//!
//! # Normalize a simulation definition
//! melatool convert sim.par clean.par
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG` or pass `--verbose` for more.

mod config;
mod convert;
mod inspect;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// melatool - conversion tool for MELA simulation data
#[derive(Parser)]
#[command(name = "melatool")]
#[command(about = "Convert MELA simulation data between MSB, PAR and JSON")]
#[command(version)]
struct Cli {
    /// Configuration file (melatool.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a file between MSB, PAR and JSON
    Convert(convert::ConvertArgs),

    /// Print a summary of an MSB or PAR file
    Inspect(inspect::InspectArgs),
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::ToolConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert(args) => convert::execute(args, &config),
        Commands::Inspect(args) => inspect::execute(args, &config),
    }
}
