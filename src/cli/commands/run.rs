//! Run command - Compute a learning trajectory from an experiment config

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::{App, ExperimentConfig},
    cli::output::{format_values, print_kv, print_section},
    export::TrajectoryCsvExporter,
    pipeline::{JsonlObserver, ProgressObserver},
    ports::Observer,
};

#[derive(Parser, Debug)]
#[command(about = "Run learning dynamics from a JSON experiment config")]
pub struct RunArgs {
    /// Experiment configuration file (JSON)
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Save the run as MessagePack
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write one JSON object per step
    #[arg(long)]
    pub jsonl: Option<PathBuf>,

    /// Export the policy trajectory as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Export per-step metrics as CSV
    #[arg(long)]
    pub metrics_csv: Option<PathBuf>,

    /// Seed for a random initial policy, overriding the config
    #[arg(long)]
    pub seed: Option<u64>,

    /// Suppress the progress bar and summary
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let mut config = ExperimentConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(seed) = args.seed {
        config.run.seed = Some(seed);
    }

    let mut observers: Vec<Box<dyn Observer>> = Vec::new();
    if !args.quiet {
        observers.push(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.jsonl {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        observers.push(Box::new(observer));
    }

    let app = App::new();
    let run = app.run_experiment(&config, observers)?;

    if !args.quiet {
        print_section(&format!("{} on {}", run.learner, run.env_id));
        print_kv("Steps", &run.summary.steps.to_string());
        print_kv("Converged", &run.summary.converged.to_string());
        print_kv("Initial rewards", &format_values(&run.summary.initial_rewards));
        print_kv("Final rewards", &format_values(&run.summary.final_rewards));
        if let Some(seed) = run.seed {
            print_kv("Seed", &seed.to_string());
        }
    }

    if let Some(path) = &args.output {
        app.save_run(&run, path)
            .with_context(|| format!("Failed to save run to {}", path.display()))?;
        if !args.quiet {
            println!("✓ Run saved to: {}", path.display());
        }
    }

    if let Some(path) = &args.csv {
        let rows = TrajectoryCsvExporter::export(&run.trajectory, path)
            .with_context(|| format!("Failed to export trajectory to {}", path.display()))?;
        if !args.quiet {
            println!("✓ Exported {rows} policy rows to: {}", path.display());
        }
    }

    if let Some(path) = &args.metrics_csv {
        let rows = TrajectoryCsvExporter::export_metrics(&run.metrics, path)
            .with_context(|| format!("Failed to export metrics to {}", path.display()))?;
        if !args.quiet {
            println!("✓ Exported {rows} metric rows to: {}", path.display());
        }
    }

    Ok(())
}
