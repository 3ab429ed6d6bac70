use crate::error::{ExecutionError, WatchError};
use crate::model::WatchConfig;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const HELP_TEMPLATE: &str = concat!(
    "\
NAME:
    {name} - {about}

USAGE:
    {usage}

FLAGS:
{options}

ABOUT:
    Author:  {author}
    Version: {version}
    License: ",
    env!("CARGO_PKG_LICENSE"),
    "
    Source:  ",
    env!("CARGO_PKG_REPOSITORY"),
    "
    Bugs:    ",
    env!("CARGO_PKG_REPOSITORY"),
    "/issues
"
);

#[derive(Debug, Parser, Clone)]
#[command(
    name = "gwatch",
    version,
    author,
    about = "A cross-platform version of the linux tool watch.",
    override_usage = "gwatch [-i DURATION] COMMAND [ARGS...]",
    help_template = HELP_TEMPLATE,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Interval; how often should the command be run? (e.g. 500ms, 2s, 1m)
    #[arg(
        short = 'i',
        long = "interval",
        value_name = "DURATION",
        default_value = "2s",
        value_parser = parse_interval
    )]
    pub interval: Duration,

    /// Append diagnostic logs to this file (filtered by RUST_LOG, default info)
    #[arg(long, value_name = "PATH", env = "GWATCH_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Command to run, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Parse a humantime duration, rejecting zero.
fn parse_interval(s: &str) -> std::result::Result<Duration, String> {
    let d = humantime::parse_duration(s).map_err(|e| format!("invalid duration `{s}`: {e}"))?;
    if d.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(d)
}

/// Build a `WatchConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> WatchConfig {
    WatchConfig {
        command: args.command.clone(),
        interval: args.interval,
    }
}

/// Install file logging if a log file was requested.
///
/// The terminal belongs to the TUI while a session runs, so logs never go to
/// stdout or stderr.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    tracing::debug!(?cfg, "starting watch session");

    match crate::tui::run(cfg).await {
        Ok(()) => Ok(()),
        Err(WatchError::Execution(e)) => {
            // The UI is gone by now, so the failing run's output can go to stderr.
            if let Some(output) = e.captured_output() {
                eprint!("{output}");
                if !output.ends_with('\n') {
                    eprintln!();
                }
            }
            Err(report_execution(e))
        }
        Err(WatchError::Render(e)) => Err(e).context("terminal session failed"),
    }
}

fn report_execution(e: ExecutionError) -> anyhow::Error {
    anyhow::Error::new(e).context("error executing command")
}
