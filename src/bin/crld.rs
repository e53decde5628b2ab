//! crld CLI - deterministic collective reinforcement-learning dynamics
//!
//! This CLI provides a unified interface for:
//! - Running learning dynamics from JSON experiment configs
//! - Describing configured environments
//! - Inspecting saved runs

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crld")]
#[command(version, about = "Collective reinforcement-learning dynamics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run learning dynamics and optionally save the trajectory
    Run(crld::cli::commands::run::RunArgs),

    /// Describe the environment and learner of a config
    Describe(crld::cli::commands::describe::DescribeArgs),

    /// Inspect a saved run
    Inspect(crld::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => crld::cli::commands::run::execute(args),
        Commands::Describe(args) => crld::cli::commands::describe::execute(args),
        Commands::Inspect(args) => crld::cli::commands::inspect::execute(args),
    }
}
