//! Single-agent risk-reward dilemma
//!
//! A risky action pays more in the short run but may tip the environment
//! into a degraded state from which it only slowly recovers.

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use super::check_probability;
use crate::{Result, ports::Environment};

pub const PROSPEROUS: usize = 0;
pub const DEGRADED: usize = 1;
pub const SAFE: usize = 0;
pub const RISKY: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskRewardParams {
    /// Collapse probability of the risky action
    pub collapse_prob: f64,
    /// Recovery probability from the degraded state
    pub recovery_prob: f64,
    /// Reward of the safe action
    pub safe_reward: f64,
    /// Reward of the risky action when no collapse happens
    pub risky_reward: f64,
    /// Reward while degraded (including the collapse transition)
    pub degraded_reward: f64,
}

#[derive(Debug, Clone)]
pub struct RiskReward {
    params: RiskRewardParams,
    transitions: Array3<f64>,
    rewards: Array4<f64>,
}

impl RiskReward {
    pub fn new(params: RiskRewardParams) -> Result<Self> {
        check_probability("collapse_prob", params.collapse_prob)?;
        check_probability("recovery_prob", params.recovery_prob)?;

        let mut transitions = Array3::zeros((2, 2, 2));
        transitions[[PROSPEROUS, SAFE, PROSPEROUS]] = 1.0;
        transitions[[PROSPEROUS, RISKY, PROSPEROUS]] = 1.0 - params.collapse_prob;
        transitions[[PROSPEROUS, RISKY, DEGRADED]] = params.collapse_prob;
        for action in [SAFE, RISKY] {
            transitions[[DEGRADED, action, PROSPEROUS]] = params.recovery_prob;
            transitions[[DEGRADED, action, DEGRADED]] = 1.0 - params.recovery_prob;
        }

        let mut rewards = Array4::zeros((1, 2, 2, 2));
        rewards[[0, PROSPEROUS, SAFE, PROSPEROUS]] = params.safe_reward;
        rewards[[0, PROSPEROUS, RISKY, PROSPEROUS]] = params.risky_reward;
        rewards[[0, PROSPEROUS, RISKY, DEGRADED]] = params.degraded_reward;
        for action in [SAFE, RISKY] {
            rewards[[0, DEGRADED, action, DEGRADED]] = params.degraded_reward;
        }

        Ok(Self {
            params,
            transitions,
            rewards,
        })
    }

    pub fn params(&self) -> &RiskRewardParams {
        &self.params
    }
}

impl Environment for RiskReward {
    fn id(&self) -> String {
        let p = &self.params;
        format!(
            "RiskReward_pc{}_pr{}_rs{}_rr{}_rd{}",
            p.collapse_prob, p.recovery_prob, p.safe_reward, p.risky_reward, p.degraded_reward
        )
    }

    fn n_agents(&self) -> usize {
        1
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
        vec!["prosperous".to_string(), "degraded".to_string()]
    }

    fn action_labels(&self) -> Vec<String> {
        vec!["safe".to_string(), "risky".to_string()]
    }
}
