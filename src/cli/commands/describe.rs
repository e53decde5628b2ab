//! Describe command - Summarize the environment and learner of a config

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::{App, EnvironmentSpec, ExperimentConfig},
    cli::output::{format_values, print_kv, print_section, print_subsection},
};

#[derive(Parser, Debug)]
#[command(about = "Describe the environment of an experiment config")]
pub struct DescribeArgs {
    /// Experiment configuration file (JSON)
    #[arg(long, short = 'c')]
    pub config: PathBuf,
}

pub fn execute(args: DescribeArgs) -> Result<()> {
    let config = ExperimentConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    let env = config.environment.build()?;

    print_section(&env.id());
    print_kv("Agents", &env.n_agents().to_string());
    print_kv("States", &env.n_states().to_string());
    print_kv("Observations", &env.n_observations().to_string());
    print_kv("Actions", &env.n_actions().to_string());
    print_kv("Joint actions", &env.joint_actions()?.count().to_string());
    print_kv("State labels", &env.state_labels().join(", "));
    print_kv("Observation labels", &env.observation_labels().join(", "));
    print_kv("Action labels", &env.action_labels().join(", "));
    print_kv("Final states", &format_values(&env.final_states().to_vec()));

    match &config.environment {
        EnvironmentSpec::SocialDilemma(payoffs) => {
            print_kv("Prisoner's dilemma", &payoffs.is_prisoners_dilemma().to_string());
        }
        EnvironmentSpec::UncertainSocialDilemma(params) => {
            print_kv(
                "Prisoner's dilemma (A / B)",
                &format!(
                    "{} / {}",
                    params.game_a.is_prisoners_dilemma(),
                    params.game_b.is_prisoners_dilemma()
                ),
            );
        }
        _ => {}
    }

    print_subsection("Rewards per agent (min / max)");
    let rewards = env.reward_tensor();
    for (agent, agent_rewards) in rewards.outer_iter().enumerate() {
        let min = agent_rewards.iter().copied().fold(f64::INFINITY, f64::min);
        let max = agent_rewards.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        print_kv(&format!("Agent {agent}"), &format!("{min:.4} / {max:.4}"));
    }

    print_subsection("Learner");
    let learner = App::new()
        .create_learner(env.as_ref(), &config.learner)
        .context("Learner configuration does not fit the environment")?;
    print_kv("Kind", learner.name());
    print_kv("Situations", &learner.n_situations().to_string());
    print_kv("Max steps", &config.run.max_steps.to_string());
    print_kv(
        "Tolerance",
        &config
            .run
            .tolerance
            .map_or_else(|| "none".to_string(), |t| format!("{t:e}")),
    );

    Ok(())
}
