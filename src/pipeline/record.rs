//! Persistable record of a finished learning run

use serde::{Deserialize, Serialize};

use super::run::{RunResult, RunSummary, StepMetrics};
use crate::{Result, policy::Policy, trajectory::Trajectory};

/// Learner parameters as they were broadcast to the agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub learning_rates: Vec<f64>,
    pub discount_factors: Vec<f64>,
    pub choice_intensities: Vec<f64>,
    #[serde(default)]
    pub use_prefactor: bool,
}

/// A learning run with enough context to inspect or re-run it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRun {
    pub env_id: String,
    pub learner: String,
    pub parameters: RunParameters,
    /// Seed of the random initial policy, if one was drawn
    pub seed: Option<u64>,
    /// Labels of the policy's situations (states or observations)
    #[serde(default)]
    pub situation_labels: Vec<String>,
    #[serde(default)]
    pub action_labels: Vec<String>,
    pub trajectory: Trajectory,
    pub metrics: Vec<StepMetrics>,
    pub summary: RunSummary,
}

impl SavedRun {
    pub fn from_result(result: RunResult, parameters: RunParameters, seed: Option<u64>) -> Self {
        let RunResult {
            trajectory,
            metrics,
            summary,
        } = result;
        Self {
            env_id: summary.env_id.clone(),
            learner: summary.learner.clone(),
            parameters,
            seed,
            situation_labels: Vec::new(),
            action_labels: Vec::new(),
            trajectory,
            metrics,
            summary,
        }
    }

    pub fn with_labels(mut self, situations: Vec<String>, actions: Vec<String>) -> Self {
        self.situation_labels = situations;
        self.action_labels = actions;
        self
    }

    pub fn final_policy(&self) -> Result<&Policy> {
        self.trajectory.last()
    }
}
