//! Ecological public good
//!
//! An N-agent public-goods game embedded in an environment that can
//! collapse. Defection raises the collapse probability; the degraded state
//! pays a (typically negative) reward until the environment recovers.

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use super::check_probability;
use crate::{Error, Result, ports::Environment, types::JointActions};

pub const PROSPEROUS: usize = 0;
pub const DEGRADED: usize = 1;
pub const COOPERATE: usize = 0;
pub const DEFECT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PublicGoodParams {
    pub n_agents: usize,
    /// Public-good synergy factor
    pub synergy: f64,
    /// Cost of cooperation
    pub cost: f64,
    /// Reward while (and when becoming) degraded
    pub collapse_impact: f64,
    /// Collapse probability if everyone defects
    pub collapse_prob: f64,
    /// Recovery probability from the degraded state
    pub recovery_prob: f64,
    /// Whether recovery requires full cooperation in the degraded state
    #[serde(default)]
    pub degraded_choice: bool,
}

#[derive(Debug, Clone)]
pub struct EcologicalPublicGood {
    params: PublicGoodParams,
    transitions: Array3<f64>,
    rewards: Array4<f64>,
}

impl EcologicalPublicGood {
    pub fn new(params: PublicGoodParams) -> Result<Self> {
        if params.n_agents == 0 {
            return Err(Error::InvalidConfiguration {
                message: "ecological public good needs at least one agent".to_string(),
            });
        }
        check_probability("collapse_prob", params.collapse_prob)?;
        check_probability("recovery_prob", params.recovery_prob)?;

        let n = params.n_agents;
        let joint = JointActions::new(n, 2)?;
        let mut transitions = Array3::zeros((2, joint.count(), 2));
        let mut rewards = Array4::zeros((n, 2, joint.count(), 2));

        for (j, profile) in joint.profiles() {
            let cooperators = profile.iter().filter(|&&a| a == COOPERATE).count();
            let defectors = n - cooperators;

            let collapse = params.collapse_prob * defectors as f64 / n as f64;
            transitions[[PROSPEROUS, j, DEGRADED]] = collapse;
            transitions[[PROSPEROUS, j, PROSPEROUS]] = 1.0 - collapse;

            let recovery = if params.degraded_choice && defectors > 0 {
                0.0
            } else {
                params.recovery_prob
            };
            transitions[[DEGRADED, j, PROSPEROUS]] = recovery;
            transitions[[DEGRADED, j, DEGRADED]] = 1.0 - recovery;

            let share = params.synergy * params.cost * cooperators as f64 / n as f64;
            for (agent, &action) in profile.iter().enumerate() {
                let own_cost = if action == COOPERATE { params.cost } else { 0.0 };
                rewards[[agent, PROSPEROUS, j, PROSPEROUS]] = share - own_cost;
                rewards[[agent, PROSPEROUS, j, DEGRADED]] = params.collapse_impact;
                rewards[[agent, DEGRADED, j, DEGRADED]] = params.collapse_impact;
            }
        }

        Ok(Self {
            params,
            transitions,
            rewards,
        })
    }

    pub fn params(&self) -> &PublicGoodParams {
        &self.params
    }
}

impl Environment for EcologicalPublicGood {
    fn id(&self) -> String {
        let p = &self.params;
        format!(
            "EcologicalPublicGood_N{}_f{}_c{}_m{}_qc{}_qr{}_dc{}",
            p.n_agents,
            p.synergy,
            p.cost,
            p.collapse_impact,
            p.collapse_prob,
            p.recovery_prob,
            p.degraded_choice
        )
    }

    fn n_agents(&self) -> usize {
        self.params.n_agents
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn n_states(&self) -> usize {
        2
    }

    fn transition_tensor(&self) -> Array3<f64> {
        self.transitions.clone()
    }

    fn reward_tensor(&self) -> Array4<f64> {
        self.rewards.clone()
    }

    fn state_labels(&self) -> Vec<String> {
        vec!["g".to_string(), "p".to_string()]
    }

    fn action_labels(&self) -> Vec<String> {
        vec!["c".to_string(), "d".to_string()]
    }
}
