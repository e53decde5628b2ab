//! Inspect command - Show the outcome of a saved run

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::App,
    cli::output::{format_values, print_kv, print_policy, print_section, print_subsection},
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a saved run")]
pub struct InspectArgs {
    /// Saved run (MessagePack)
    pub run: PathBuf,

    /// Also print the initial policy
    #[arg(long)]
    pub initial: bool,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let run = App::new()
        .load_run(&args.run)
        .with_context(|| format!("Failed to load run {}", args.run.display()))?;

    print_section(&format!("{} on {}", run.learner, run.env_id));
    print_kv("Steps", &run.summary.steps.to_string());
    print_kv("Converged", &run.summary.converged.to_string());
    print_kv("Learning rates", &format_values(&run.parameters.learning_rates));
    print_kv("Discount factors", &format_values(&run.parameters.discount_factors));
    print_kv(
        "Choice intensities",
        &format_values(&run.parameters.choice_intensities),
    );
    print_kv("Prefactor", &run.parameters.use_prefactor.to_string());
    print_kv("Initial rewards", &format_values(&run.summary.initial_rewards));
    print_kv("Final rewards", &format_values(&run.summary.final_rewards));

    let final_policy = run.final_policy()?;
    // runs saved without labels fall back to indices
    let situations = run.situation_labels.clone();
    let actions: Vec<String> = if run.action_labels.len() == final_policy.n_actions() {
        run.action_labels.clone()
    } else {
        (0..final_policy.n_actions()).map(|a| format!("a{a}")).collect()
    };

    if args.initial {
        print_subsection("Initial policy");
        print_policy(run.trajectory.initial()?, &situations, &actions);
    }

    print_subsection("Final policy");
    print_policy(final_policy, &situations, &actions);

    Ok(())
}
