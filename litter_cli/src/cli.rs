//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "litter", version, about = "Litterbox scale presence detector")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/litter_config.toml")]
    pub config: PathBuf,

    /// Emit snapshots, summaries and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed a recorded readings CSV (headers: at_ms,grams) through the detector
    Replay {
        /// Readings CSV; empty or "unavailable" grams are absent readings
        #[arg(long, value_name = "FILE")]
        readings: PathBuf,
    },
    /// Read one weight per line from stdin and report changes live (Ctrl-C to stop)
    Watch,
    /// Validate the config and print the effective detection parameters
    SelfCheck,
}
