//! Common test utilities for the crld test suite.

#![allow(dead_code)]

use crld::{
    AgentParameter, POStrategyActorCritic, Policy,
    environments::{SocialDilemmaPayoffs, UncertainSocialDilemma, uncertain::UncertainDilemmaParams},
};
use ndarray::Array3;

pub const TOLERANCE: f64 = 1e-9;

/// Two hidden games with swapped reward/temptation payoffs.
pub fn uncertain_dilemma(switch_prob: f64, accuracy: f64) -> UncertainSocialDilemma {
    UncertainSocialDilemma::new(UncertainDilemmaParams {
        game_a: SocialDilemmaPayoffs::new(3.0, 5.0, 0.0, 1.0),
        game_b: SocialDilemmaPayoffs::new(5.0, 3.0, 0.0, 1.0),
        switch_prob,
        accuracy,
    })
    .expect("valid uncertain dilemma")
}

pub fn po_learner(
    env: &UncertainSocialDilemma,
    alpha: f64,
    gamma: f64,
    beta: f64,
) -> POStrategyActorCritic {
    POStrategyActorCritic::new(
        env,
        &AgentParameter::Uniform(alpha),
        &AgentParameter::Uniform(gamma),
        &AgentParameter::Uniform(beta),
    )
    .expect("valid learner")
}

/// Two agents, two observations, two actions; agent/observation specific rows.
pub fn skewed_policy() -> Policy {
    Policy::new(
        Array3::from_shape_vec(
            (2, 2, 2),
            vec![0.7, 0.3, 0.2, 0.8, 0.4, 0.6, 0.9, 0.1],
        )
        .expect("shape matches"),
    )
    .expect("rows are normalized")
}

pub fn assert_all_close(a: &Array3<f64>, b: &Array3<f64>, tol: f64) {
    assert_eq!(a.dim(), b.dim());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < tol, "{x} vs {y}");
    }
}
