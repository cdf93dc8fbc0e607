//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tether",
    about = "Expose desktop terminal sessions to paired mobile devices via a relay"
)]
pub struct Args {
    /// Log filter directive, e.g. `tether=debug` (overrides the default).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to an alternate config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Run the relay daemon (the default when no subcommand is given).
    Run,
    /// Request a pairing PIN from the relay and print it.
    Pair,
    /// Rename this device.
    Rename { name: String },
    /// Generate a fresh device identity (forces all mobiles to re-pair).
    ResetId,
    /// Print the device identity and relay settings.
    Status,
}

pub fn parse() -> Args {
    Args::parse()
}
