//! gluview entry point: config loading, logging setup, signal handling,
//! and command dispatch.

mod cli;
mod error_fmt;
mod watch;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use gluview_config::{Config, Logging};
use tracing_subscriber::EnvFilter;

fn main() {
    let _ = color_eyre::install();
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    match run(args) {
        Ok(()) => {}
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::format_error_json(&e));
            } else {
                eprintln!("{}", error_fmt::humanize(&e));
            }
            std::process::exit(error_fmt::exit_code_for_error(&e));
        }
    }
}

fn run(args: Cli) -> eyre::Result<()> {
    let cfg = load_config(&args.config)?;
    cfg.validate().wrap_err("invalid configuration")?;
    init_tracing(&args.log_level, args.json, &cfg.logging);
    tracing::debug!(config = %args.config.display(), "configuration loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("installing ctrl-c handler")?;
    }

    match args.cmd {
        Commands::Watch {
            simulate,
            once,
            interval_ms,
        } => watch::run_watch(&cfg, simulate, once, interval_ms, shutdown),
        Commands::Fetch { simulate } => watch::run_fetch(&cfg, simulate, args.json),
        Commands::SelfCheck => watch::run_self_check(&cfg),
    }
}

/// Read and parse the config file. The default path is allowed to be absent
/// (built-in defaults apply); an explicitly passed path is not.
fn load_config(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        if path == Path::new("etc/gluview.toml") {
            return Ok(Config::default());
        }
        eyre::bail!("config file not found: {}", path.display());
    }
    let contents = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    gluview_config::load_toml(&contents)
        .wrap_err_with(|| format!("parsing config {}", path.display()))
}

fn init_tracing(log_level: &str, json: bool, logging: &Logging) {
    // CLI flag wins; the config level applies when the flag is untouched.
    let effective = if log_level != "info" {
        log_level
    } else {
        logging.level.as_deref().unwrap_or(log_level)
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective));

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let name = path.file_name().unwrap_or_else(|| "gluview.log".as_ref());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
    } else {
        // Logs go to stderr so the live chart owns stdout.
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
    }
}
