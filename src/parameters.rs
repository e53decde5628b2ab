//! Per-agent learning parameters
//!
//! Learning rates, discount factors and choice intensities can be given
//! either as one value shared by every agent or as one value per agent.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A parameter that is either shared by all agents or given per agent.
///
/// Deserializes from a JSON number (`0.1`) or array (`[0.1, 0.2]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentParameter {
    Uniform(f64),
    PerAgent(Vec<f64>),
}

impl From<f64> for AgentParameter {
    fn from(value: f64) -> Self {
        AgentParameter::Uniform(value)
    }
}

impl From<Vec<f64>> for AgentParameter {
    fn from(values: Vec<f64>) -> Self {
        AgentParameter::PerAgent(values)
    }
}

impl From<&[f64]> for AgentParameter {
    fn from(values: &[f64]) -> Self {
        AgentParameter::PerAgent(values.to_vec())
    }
}

/// Broadcast `value` to a vector with one entry per agent.
///
/// A uniform value is repeated `n_agents` times; a per-agent vector must
/// already have exactly `n_agents` entries.
///
/// # Examples
///
/// ```
/// use crld::parameters::{make_variable_vector, AgentParameter};
///
/// let alpha = make_variable_vector("learning_rates", &AgentParameter::Uniform(0.1), 3)?;
/// assert_eq!(alpha.to_vec(), vec![0.1, 0.1, 0.1]);
///
/// let beta = make_variable_vector("choice_intensities", &AgentParameter::PerAgent(vec![1.0, 5.0]), 2)?;
/// assert_eq!(beta.to_vec(), vec![1.0, 5.0]);
/// # Ok::<(), crld::Error>(())
/// ```
pub fn make_variable_vector(
    name: &str,
    value: &AgentParameter,
    n_agents: usize,
) -> Result<Array1<f64>> {
    match value {
        AgentParameter::Uniform(v) => Ok(Array1::from_elem(n_agents, *v)),
        AgentParameter::PerAgent(values) if values.len() == n_agents => {
            Ok(Array1::from(values.clone()))
        }
        AgentParameter::PerAgent(values) => Err(Error::ParameterLength {
            name: name.to_string(),
            expected: n_agents,
            got: values.len(),
        }),
    }
}

fn check_each(
    name: &str,
    values: &Array1<f64>,
    expected: &str,
    accept: impl Fn(f64) -> bool,
) -> Result<()> {
    match values.iter().find(|&&v| !accept(v)) {
        Some(&value) => Err(Error::ParameterOutOfRange {
            name: name.to_string(),
            value,
            expected: expected.to_string(),
        }),
        None => Ok(()),
    }
}

/// Learning rates must lie in (0, 1].
pub fn validate_learning_rates(values: &Array1<f64>) -> Result<()> {
    check_each("learning_rates", values, "0 < alpha <= 1", |v| {
        v.is_finite() && v > 0.0 && v <= 1.0
    })
}

/// Discount factors must lie in [0, 1).
pub fn validate_discount_factors(values: &Array1<f64>) -> Result<()> {
    check_each("discount_factors", values, "0 <= gamma < 1", |v| {
        v.is_finite() && (0.0..1.0).contains(&v)
    })
}

/// Choice intensities must be positive and finite.
pub fn validate_choice_intensities(values: &Array1<f64>) -> Result<()> {
    check_each("choice_intensities", values, "0 < beta < inf", |v| {
        v.is_finite() && v > 0.0
    })
}
