//! Standard environments
//!
//! Each environment builds its tensors once on construction. All of them
//! implement [`Environment`](crate::ports::Environment).

pub mod public_good;
pub mod risk_reward;
pub mod social_dilemma;
pub mod tensor;
pub mod uncertain;

pub use public_good::EcologicalPublicGood;
pub use risk_reward::RiskReward;
pub use social_dilemma::{SocialDilemma, SocialDilemmaPayoffs};
pub use tensor::TensorEnvironment;
pub use uncertain::UncertainSocialDilemma;

use ndarray::Array3;

use crate::{Error, Result, utils::is_close};

/// Check that every row `T[s, j, :]` is a probability distribution.
pub fn check_transition_tensor(transitions: &Array3<f64>) -> Result<()> {
    for (state, rows) in transitions.outer_iter().enumerate() {
        for (joint_action, row) in rows.outer_iter().enumerate() {
            let sum = row.sum();
            if !is_valid_row(row.iter().copied(), sum) {
                return Err(Error::InvalidTransitionTensor {
                    state,
                    joint_action,
                    sum,
                });
            }
        }
    }
    Ok(())
}

/// Check that every row `O[i, s, :]` is a probability distribution.
pub fn check_observation_tensor(observations: &Array3<f64>) -> Result<()> {
    for (agent, rows) in observations.outer_iter().enumerate() {
        for (state, row) in rows.outer_iter().enumerate() {
            let sum = row.sum();
            if !is_valid_row(row.iter().copied(), sum) {
                return Err(Error::InvalidObservationTensor { agent, state, sum });
            }
        }
    }
    Ok(())
}

fn is_valid_row(mut probabilities: impl Iterator<Item = f64>, sum: f64) -> bool {
    is_close(sum, 1.0) && probabilities.all(|p| p.is_finite() && p >= 0.0)
}

pub(crate) fn check_probability(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ParameterOutOfRange {
            name: name.to_string(),
            value,
            expected: "0 <= p <= 1".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn transition_rows_must_sum_to_one() {
        let ok = array![[[0.3, 0.7]], [[1.0, 0.0]]];
        assert!(check_transition_tensor(&ok).is_ok());

        let bad = array![[[0.3, 0.6]], [[1.0, 0.0]]];
        assert!(matches!(
            check_transition_tensor(&bad),
            Err(Error::InvalidTransitionTensor {
                state: 0,
                joint_action: 0,
                ..
            })
        ));
    }

    #[test]
    fn observation_rows_must_sum_to_one() {
        let bad = array![[[0.5, 0.5], [0.2, 0.2]]];
        assert!(matches!(
            check_observation_tensor(&bad),
            Err(Error::InvalidObservationTensor {
                agent: 0,
                state: 1,
                ..
            })
        ));
    }
}
