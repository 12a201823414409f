//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "weii", version, about = "Weigh yourself with a Wii balance board")]
pub struct Cli {
    /// Path to config TOML (default: $XDG_CONFIG_HOME/weii/weii.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct MeasureArgs {
    /// Print only the final weight (one decimal) and nothing else
    #[arg(long, short = 't', action = ArgAction::SetTrue)]
    pub terse: bool,
    /// Add this many kilograms to the result (negative to subtract clothing)
    #[arg(long, short = 'a', value_name = "KG", allow_negative_numbers = true)]
    pub adjust: Option<f64>,
    /// Same as --adjust, in pounds
    #[arg(
        long,
        value_name = "LB",
        allow_negative_numbers = true,
        conflicts_with = "adjust"
    )]
    pub adjust_lb: Option<f64>,
    /// Readings below this many kilograms mean nobody is on the board
    #[arg(long, short = 'm', value_name = "KG")]
    pub min_limit: Option<f64>,
    /// Stop after this many samples
    #[arg(long, value_name = "N")]
    pub max_samples: Option<usize>,
    /// Bluetooth address to disconnect after measuring (AA:BB:CC:DD:EE:FF)
    #[arg(long, short = 'd', value_name = "ADDR")]
    pub disconnect_address: Option<String>,
    /// Shell command to run after measuring; {weight} is replaced with the result
    #[arg(long, short = 'c', value_name = "CMD")]
    pub command: Option<String>,
    /// Use the simulated board (configured through WEII_SIM_* variables)
    #[arg(long, action = ArgAction::SetTrue)]
    pub simulate: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for the board, measure, and print the weight
    Measure(MeasureArgs),
    /// Look for the balance board once and report whether it is present
    SelfCheck {
        /// Check the simulated board instead of real hardware
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
    },
    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

/// `$XDG_CONFIG_HOME/weii/weii.toml`, falling back to `~/.config/weii/weii.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("weii").join("weii.toml"))
}
