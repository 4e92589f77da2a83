//! vedirect - VE.Direct text protocol reader
//!
//! Reads records from battery monitors and charge controllers over a serial
//! link and identifies which port a device is attached to.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vedirect_core::{Config, VedirectError};

#[derive(Parser)]
#[command(name = "vedirect")]
#[command(about = "Read and identify VE.Direct devices on serial ports")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "VEDIRECT_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port (overrides configuration)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides configuration)
    #[arg(short, long)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List serial ports
    Ports,

    /// Read one record and print it as JSON
    Read,

    /// Stream records as JSON lines
    Watch {
        /// Stop after this many records
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Find the port whose device passes the serial tests
    Discover,

    /// Validate the configuration and serial tests
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load_from(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };
    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    if let Some(baud) = cli.baud {
        config.serial.baud = baud;
    }
    tracing::debug!(
        port = %config.serial.port,
        baud = config.serial.baud,
        tests = config.serial_tests.len(),
        "configuration loaded"
    );

    if let Err(e) = commands::execute(&config, cli.command) {
        match e.downcast_ref::<VedirectError>() {
            Some(err) => eprintln!("{} [{}]: {}", "Error".red(), err.error_code(), err),
            None => eprintln!("{}: {}", "Error".red(), e),
        }
        std::process::exit(1);
    }

    Ok(())
}
