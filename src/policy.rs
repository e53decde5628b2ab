//! Behaviour policies of all agents
//!
//! A [`Policy`] stores `X[i, k, a]`: the probability that agent `i` chooses
//! action `a` in situation `k`, where `k` is a state for fully observable
//! learners and an observation for partially observable ones.

use ndarray::{Array3, Axis};
use rand::Rng;
use rand_distr::{Distribution, Exp1};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    utils::{PROBABILITY_TOLERANCE, shannon_entropy},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    values: Array3<f64>,
}

impl Policy {
    /// Wrap an `(agents, situations, actions)` array after validating it.
    pub fn new(values: Array3<f64>) -> Result<Self> {
        let policy = Self { values };
        policy.validate()?;
        Ok(policy)
    }

    /// Wrap without validation; callers guarantee normalized rows.
    pub(crate) fn from_normalized(values: Array3<f64>) -> Self {
        Self { values }
    }

    /// Every action equally likely in every situation.
    pub fn uniform(n_agents: usize, n_situations: usize, n_actions: usize) -> Self {
        Self {
            values: Array3::from_elem((n_agents, n_situations, n_actions), 1.0 / n_actions as f64),
        }
    }

    /// Rows drawn independently from a flat Dirichlet distribution.
    pub fn random<R: Rng + ?Sized>(
        n_agents: usize,
        n_situations: usize,
        n_actions: usize,
        rng: &mut R,
    ) -> Self {
        let mut values = Array3::zeros((n_agents, n_situations, n_actions));
        for mut row in values.lanes_mut(Axis(2)) {
            let mut total: f64 = 0.0;
            for entry in row.iter_mut() {
                let draw: f64 = Exp1.sample(rng);
                // all-zero draws would leave the row unnormalizable
                *entry = draw.max(f64::MIN_POSITIVE);
                total += *entry;
            }
            row.mapv_inplace(|v| v / total);
        }
        Self { values }
    }

    /// Check non-negativity, finiteness and row normalization.
    pub fn validate(&self) -> Result<()> {
        if self.values.iter().any(|&v| !v.is_finite() || v < 0.0) {
            return Err(Error::InvalidPolicy {
                message: "probabilities must be finite and non-negative".to_string(),
            });
        }
        for ((agent, situation), sum) in self.values.sum_axis(Axis(2)).indexed_iter() {
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(Error::InvalidPolicy {
                    message: format!(
                        "agent {agent} situation {situation} sums to {sum} instead of 1"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Check that the policy has the given shape.
    pub fn expect_shape(&self, n_agents: usize, n_situations: usize, n_actions: usize) -> Result<()> {
        let expected = [n_agents, n_situations, n_actions];
        if self.values.shape() != expected {
            return Err(Error::ShapeMismatch {
                tensor: "policy".to_string(),
                expected: expected.to_vec(),
                got: self.values.shape().to_vec(),
            });
        }
        Ok(())
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array3<f64> {
        self.values
    }

    pub fn n_agents(&self) -> usize {
        self.values.dim().0
    }

    pub fn n_situations(&self) -> usize {
        self.values.dim().1
    }

    pub fn n_actions(&self) -> usize {
        self.values.dim().2
    }

    /// Probability of `action` for `agent` in `situation`.
    pub fn prob(&self, agent: usize, situation: usize, action: usize) -> f64 {
        self.values[[agent, situation, action]]
    }

    /// Frobenius norm of the difference to `other`.
    pub fn distance(&self, other: &Policy) -> f64 {
        (&self.values - &other.values)
            .iter()
            .map(|d| d * d)
            .sum::<f64>()
            .sqrt()
    }

    /// Mean Shannon entropy of each agent's action distributions.
    pub fn mean_entropy(&self) -> Vec<f64> {
        self.values
            .outer_iter()
            .map(|agent| {
                let rows = agent.nrows().max(1) as f64;
                agent
                    .outer_iter()
                    .map(|row| shannon_entropy(row.iter().copied()))
                    .sum::<f64>()
                    / rows
            })
            .collect()
    }
}
