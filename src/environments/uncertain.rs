//! Social dilemma with a hidden, switching game
//!
//! Two hidden states each carry their own 2x2 game. The state flips with a
//! fixed probability every step and each agent only receives a noisy
//! observation of which game is currently being played.

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use super::{check_probability, social_dilemma::SocialDilemmaPayoffs};
use crate::{Result, ports::Environment, types::JointActions};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertainDilemmaParams {
    pub game_a: SocialDilemmaPayoffs,
    pub game_b: SocialDilemmaPayoffs,
    /// Probability that the hidden game changes between steps
    pub switch_prob: f64,
    /// Probability that an agent observes the true game
    pub accuracy: f64,
}

#[derive(Debug, Clone)]
pub struct UncertainSocialDilemma {
    params: UncertainDilemmaParams,
    transitions: Array3<f64>,
    rewards: Array4<f64>,
    observations: Array3<f64>,
}

impl UncertainSocialDilemma {
    pub fn new(params: UncertainDilemmaParams) -> Result<Self> {
        check_probability("switch_prob", params.switch_prob)?;
        check_probability("accuracy", params.accuracy)?;

        let joint = JointActions::pairwise_binary();
        let transitions = Array3::from_shape_fn((2, joint.count(), 2), |(s, _, next)| {
            if s == next {
                1.0 - params.switch_prob
            } else {
                params.switch_prob
            }
        });

        let games = [params.game_a, params.game_b];
        let mut rewards = Array4::zeros((2, 2, joint.count(), 2));
        for (state, game) in games.iter().enumerate() {
            for (j, profile) in joint.profiles() {
                for next in 0..2 {
                    rewards[[0, state, j, next]] = game.payoff(profile[0], profile[1]);
                    rewards[[1, state, j, next]] = game.payoff(profile[1], profile[0]);
                }
            }
        }

        let observations = Array3::from_shape_fn((2, 2, 2), |(_, s, o)| {
            if s == o {
                params.accuracy
            } else {
                1.0 - params.accuracy
            }
        });

        Ok(Self {
            params,
            transitions,
            rewards,
            observations,
        })
    }

    pub fn params(&self) -> &UncertainDilemmaParams {
        &self.params
    }
}

impl Environment for UncertainSocialDilemma {
    fn id(&self) -> String {
        format!(
            "UncertainSocialDilemma_p{}_acc{}",
            self.params.switch_prob, self.params.accuracy
        )
    }

    fn n_agents(&self) -> usize {
        2
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn n_states(&self) -> usize {
        2
    }

    fn n_observations(&self) -> usize {
        2
    }

    fn transition_tensor(&self) -> Array3<f64> {
        self.transitions.clone()
    }

    fn reward_tensor(&self) -> Array4<f64> {
        self.rewards.clone()
    }

    fn observation_tensor(&self) -> Array3<f64> {
        self.observations.clone()
    }

    fn state_labels(&self) -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn action_labels(&self) -> Vec<String> {
        vec!["c".to_string(), "d".to_string()]
    }
}
