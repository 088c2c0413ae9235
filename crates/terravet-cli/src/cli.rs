use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "terravet",
    about = "Apply–verify–destroy validation of a Terraform network module against live Azure state",
    version
)]
pub struct Cli {
    /// Path to the run config file.
    #[arg(long, env = "TERRAVET_CONFIG", global = true, default_value = "terravet.yml")]
    pub config: PathBuf,

    /// Override the module directory from the config file.
    #[arg(long, global = true)]
    pub module_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Structural check: init without a backend, then validate. Needs no
    /// credentials.
    Validate,

    /// Full apply → verify → destroy against the configured subscription.
    Verify,

    /// Prove the module rejects an empty address space at plan time.
    Negative,
}
