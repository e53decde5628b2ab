//! Two-agent, one-state social dilemmas (repeated normal-form games)

use ndarray::{Array1, Array3, Array4};
use serde::{Deserialize, Serialize};

use crate::{ports::Environment, types::JointActions};

pub const COOPERATE: usize = 0;
pub const DEFECT: usize = 1;

/// Ordinal payoffs of a symmetric 2x2 game from the row player's view.
///
/// * `reward` - both cooperate
/// * `temptation` - defect against a cooperator
/// * `sucker` - cooperate against a defector
/// * `punishment` - both defect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocialDilemmaPayoffs {
    pub reward: f64,
    pub temptation: f64,
    pub sucker: f64,
    pub punishment: f64,
}

impl SocialDilemmaPayoffs {
    pub fn new(reward: f64, temptation: f64, sucker: f64, punishment: f64) -> Self {
        Self {
            reward,
            temptation,
            sucker,
            punishment,
        }
    }

    /// Payoff for playing `own` against `other`.
    pub fn payoff(&self, own: usize, other: usize) -> f64 {
        match (own, other) {
            (COOPERATE, COOPERATE) => self.reward,
            (COOPERATE, _) => self.sucker,
            (_, COOPERATE) => self.temptation,
            _ => self.punishment,
        }
    }

    /// Whether the payoffs form a prisoner's dilemma (T > R > P > S).
    pub fn is_prisoners_dilemma(&self) -> bool {
        self.temptation > self.reward
            && self.reward > self.punishment
            && self.punishment > self.sucker
    }
}

/// Repeated symmetric 2x2 game between two agents.
///
/// There is a single state; actions are cooperate (0) and defect (1).
#[derive(Debug, Clone)]
pub struct SocialDilemma {
    payoffs: SocialDilemmaPayoffs,
    transitions: Array3<f64>,
    rewards: Array4<f64>,
}

impl SocialDilemma {
    pub fn new(reward: f64, temptation: f64, sucker: f64, punishment: f64) -> Self {
        Self::from_payoffs(SocialDilemmaPayoffs::new(
            reward, temptation, sucker, punishment,
        ))
    }

    pub fn from_payoffs(payoffs: SocialDilemmaPayoffs) -> Self {
        let joint = JointActions::pairwise_binary();
        let transitions = Array3::ones((1, joint.count(), 1));
        let mut rewards = Array4::zeros((2, 1, joint.count(), 1));
        for (j, profile) in joint.profiles() {
            rewards[[0, 0, j, 0]] = payoffs.payoff(profile[0], profile[1]);
            rewards[[1, 0, j, 0]] = payoffs.payoff(profile[1], profile[0]);
        }
        Self {
            payoffs,
            transitions,
            rewards,
        }
    }

    pub fn payoffs(&self) -> &SocialDilemmaPayoffs {
        &self.payoffs
    }
}

impl Environment for SocialDilemma {
    fn id(&self) -> String {
        let p = &self.payoffs;
        format!(
            "SocialDilemma_R{}_T{}_S{}_P{}",
            p.reward, p.temptation, p.sucker, p.punishment
        )
    }

    fn n_agents(&self) -> usize {
        2
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn n_states(&self) -> usize {
        1
    }

    fn transition_tensor(&self) -> Array3<f64> {
        self.transitions.clone()
    }

    fn reward_tensor(&self) -> Array4<f64> {
        self.rewards.clone()
    }

    fn final_states(&self) -> Array1<f64> {
        Array1::zeros(1)
    }

    fn state_labels(&self) -> Vec<String> {
        vec![".".to_string()]
    }

    fn action_labels(&self) -> Vec<String> {
        vec!["c".to_string(), "d".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environments::check_transition_tensor;

    #[test]
    fn rewards_follow_payoff_matrix() {
        let env = SocialDilemma::new(1.0, 1.2, -0.5, 0.0);
        let r = env.reward_tensor();
        // joint index = 2 * a0 + a1
        assert_eq!(r[[0, 0, 0, 0]], 1.0);
        assert_eq!(r[[0, 0, 1, 0]], -0.5);
        assert_eq!(r[[0, 0, 2, 0]], 1.2);
        assert_eq!(r[[0, 0, 3, 0]], 0.0);
        assert_eq!(r[[1, 0, 1, 0]], 1.2);
        assert_eq!(r[[1, 0, 2, 0]], -0.5);
    }

    #[test]
    fn transitions_are_valid() {
        let env = SocialDilemma::new(3.0, 5.0, 0.0, 1.0);
        check_transition_tensor(&env.transition_tensor()).unwrap();
        assert!(env.payoffs().is_prisoners_dilemma());
    }
}
