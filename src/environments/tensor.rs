//! Environment from raw, user-supplied tensors

use ndarray::{Array1, Array3, Array4};
use serde::{Deserialize, Serialize};

use super::{check_observation_tensor, check_transition_tensor};
use crate::{Error, Result, ports::Environment, types::JointActions};

/// Raw environment tensors as they appear in configuration files.
///
/// `observations` and `final_states` are optional and default to full
/// observability and no final states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentTensors {
    pub n_agents: usize,
    pub n_actions: usize,
    pub transitions: Array3<f64>,
    pub rewards: Array4<f64>,
    #[serde(default)]
    pub observations: Option<Array3<f64>>,
    #[serde(default)]
    pub final_states: Option<Array1<f64>>,
}

/// Environment backed by explicit tensors, validated on construction.
#[derive(Debug, Clone)]
pub struct TensorEnvironment {
    id: String,
    n_agents: usize,
    n_actions: usize,
    transitions: Array3<f64>,
    rewards: Array4<f64>,
    observations: Option<Array3<f64>>,
    final_states: Array1<f64>,
}

fn shape_error(tensor: &str, expected: &[usize], got: &[usize]) -> Error {
    Error::ShapeMismatch {
        tensor: tensor.to_string(),
        expected: expected.to_vec(),
        got: got.to_vec(),
    }
}

impl TensorEnvironment {
    pub fn new(id: impl Into<String>, tensors: EnvironmentTensors) -> Result<Self> {
        let EnvironmentTensors {
            n_agents,
            n_actions,
            transitions,
            rewards,
            observations,
            final_states,
        } = tensors;

        let joint = JointActions::new(n_agents, n_actions)?;
        let n_states = transitions.dim().0;

        let expected_t = [n_states, joint.count(), n_states];
        if transitions.shape() != expected_t {
            return Err(shape_error("transitions", &expected_t, transitions.shape()));
        }
        check_transition_tensor(&transitions)?;

        let expected_r = [n_agents, n_states, joint.count(), n_states];
        if rewards.shape() != expected_r {
            return Err(shape_error("rewards", &expected_r, rewards.shape()));
        }

        if let Some(obs) = &observations {
            if obs.dim().0 != n_agents || obs.dim().1 != n_states {
                let expected = [n_agents, n_states, obs.dim().2];
                return Err(shape_error("observations", &expected, obs.shape()));
            }
            check_observation_tensor(obs)?;
        }

        let final_states = final_states.unwrap_or_else(|| Array1::zeros(n_states));
        if final_states.len() != n_states {
            return Err(shape_error("final_states", &[n_states], final_states.shape()));
        }

        Ok(Self {
            id: id.into(),
            n_agents,
            n_actions,
            transitions,
            rewards,
            observations,
            final_states,
        })
    }

    /// Capture the tensors of any environment.
    pub fn from_environment(env: &dyn Environment) -> Result<Self> {
        Self::new(
            env.id(),
            EnvironmentTensors {
                n_agents: env.n_agents(),
                n_actions: env.n_actions(),
                transitions: env.transition_tensor(),
                rewards: env.reward_tensor(),
                observations: Some(env.observation_tensor()),
                final_states: Some(env.final_states()),
            },
        )
    }
}

impl Environment for TensorEnvironment {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn n_agents(&self) -> usize {
        self.n_agents
    }

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn n_states(&self) -> usize {
        self.transitions.dim().0
    }

    fn n_observations(&self) -> usize {
        self.observations
            .as_ref()
            .map_or(self.n_states(), |obs| obs.dim().2)
    }

    fn transition_tensor(&self) -> Array3<f64> {
        self.transitions.clone()
    }

    fn reward_tensor(&self) -> Array4<f64> {
        self.rewards.clone()
    }

    fn observation_tensor(&self) -> Array3<f64> {
        match &self.observations {
            Some(obs) => obs.clone(),
            None => crate::ports::environment::full_observation_tensor(
                self.n_agents,
                self.n_states(),
            ),
        }
    }

    fn final_states(&self) -> Array1<f64> {
        self.final_states.clone()
    }
}
