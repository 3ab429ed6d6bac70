mod cli;
mod display;
mod error;
mod model;
mod orchestrator;
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors and --help exit here, before anything is started.
    let args = cli::Cli::parse();
    cli::init_logging(args.log_file.as_deref())?;

    cli::run(args).await
}
