//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "gluview", version, about = "Terminal glucose monitor")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/gluview.toml")]
    pub config: PathBuf,

    /// Emit machine-readable JSON (output and errors)
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Live chart, refreshed on the configured cadence
    Watch {
        /// Use the offline simulated source instead of the vendor API
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
        /// Run a single refresh cycle, print the chart, and exit
        #[arg(long, action = ArgAction::SetTrue)]
        once: bool,
        /// Override refresh interval in ms (takes precedence over config)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },
    /// One refresh cycle; print the chart (or a JSON object with --json)
    Fetch {
        /// Use the offline simulated source instead of the vendor API
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
    },
    /// Config / credentials / storage sanity check without network
    SelfCheck,
}
