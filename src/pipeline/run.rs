//! Learning-run pipeline

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Result,
    policy::Policy,
    ports::{LearningDynamics, Observer},
    trajectory::{Trajectory, TrajectoryConfig},
};

/// Metrics recorded after each learning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Step number (1-based; step 0 is the initial policy)
    pub step: usize,
    /// Long-run average reward per agent under the new policy
    pub average_rewards: Vec<f64>,
    /// Frobenius distance to the previous policy
    pub policy_change: f64,
    /// Mean action entropy per agent
    pub mean_entropy: Vec<f64>,
}

/// Outcome of a learning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub learner: String,
    pub env_id: String,
    pub steps: usize,
    pub converged: bool,
    pub initial_rewards: Vec<f64>,
    pub final_rewards: Vec<f64>,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunResult {
    pub trajectory: Trajectory,
    pub metrics: Vec<StepMetrics>,
    pub summary: RunSummary,
}

/// Drives a learning dynamics step by step and notifies observers
pub struct LearningRun {
    config: TrajectoryConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl LearningRun {
    /// Create a new run with the given stopping rule
    pub fn new(config: TrajectoryConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the run
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Run `learner` from `initial` until a fixed point or the step budget.
    pub fn run(
        &mut self,
        learner: &dyn LearningDynamics,
        env_id: &str,
        initial: Policy,
    ) -> Result<RunResult> {
        learner.check_policy(&initial)?;

        for observer in &mut self.observers {
            observer.on_run_start(learner.name(), self.config.max_steps)?;
        }

        let initial_rewards = learner.average_rewards(&initial)?.to_vec();
        let mut metrics = Vec::new();
        let observers = &mut self.observers;
        let trajectory = self.config.iterate(
            initial,
            |policy| learner.step(policy),
            |step, next, change| {
                let step_metrics = StepMetrics {
                    step,
                    average_rewards: learner.average_rewards(next)?.to_vec(),
                    policy_change: change,
                    mean_entropy: next.mean_entropy(),
                };
                for observer in observers.iter_mut() {
                    observer.on_step(&step_metrics, next)?;
                }
                metrics.push(step_metrics);
                Ok(())
            },
        )?;
        let converged = trajectory.converged;

        let final_rewards = metrics
            .last()
            .map_or_else(|| initial_rewards.clone(), |m| m.average_rewards.clone());
        let summary = RunSummary {
            learner: learner.name().to_string(),
            env_id: env_id.to_string(),
            steps: metrics.len(),
            converged,
            initial_rewards,
            final_rewards,
        };

        if converged {
            info!(learner = learner.name(), env = env_id, steps = summary.steps, "run converged");
        } else if self.config.tolerance.is_some() {
            warn!(learner = learner.name(), env = env_id, steps = summary.steps, "run did not converge");
        }

        for observer in &mut self.observers {
            observer.on_run_end(&summary)?;
        }

        Ok(RunResult {
            trajectory,
            metrics,
            summary,
        })
    }
}
