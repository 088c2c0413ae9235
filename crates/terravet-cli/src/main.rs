mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = commands::load_config(&cli)?;

    match cli.command {
        Command::Validate => commands::validate(cfg).await,
        Command::Verify => commands::verify(cfg).await,
        Command::Negative => commands::negative(cfg).await,
    }
}
