//! Environment port - the tensors a Markov environment supplies to learners
//!
//! Learners never simulate an environment step by step. They read its full
//! transition, reward, observation and final-state tensors once and compute
//! expected learning updates from them.

use ndarray::{Array1, Array3, Array4};

use crate::{Result, types::JointActions};

/// A (possibly partially observable) multi-agent Markov environment.
///
/// # Tensor layout
///
/// * `T[s, j, s']` - transition probability from `s` to `s'` under joint action `j`
/// * `R[i, s, j, s']` - reward to agent `i` for that transition
/// * `O[i, s, o]` - probability that agent `i` observes `o` in state `s`
/// * `F[s]` - 1.0 if the episode ends on entering `s`
///
/// Joint actions are flattened as described in [`JointActions`].
///
/// # Examples
///
/// ```
/// use crld::{environments::SocialDilemma, ports::Environment};
///
/// let env = SocialDilemma::new(1.0, 1.2, -0.5, 0.0);
/// assert_eq!(env.n_agents(), 2);
/// assert_eq!(env.transition_tensor().dim(), (1, 4, 1));
/// ```
pub trait Environment {
    /// Short identifier used in saved runs and logs.
    fn id(&self) -> String;

    fn n_agents(&self) -> usize;

    fn n_actions(&self) -> usize;

    fn n_states(&self) -> usize;

    /// Number of observations per agent.
    ///
    /// Defaults to the number of states (full observability).
    fn n_observations(&self) -> usize {
        self.n_states()
    }

    fn transition_tensor(&self) -> Array3<f64>;

    fn reward_tensor(&self) -> Array4<f64>;

    /// Observation tensor `O[i, s, o]`.
    ///
    /// The default makes every state perfectly observable to every agent.
    fn observation_tensor(&self) -> Array3<f64> {
        full_observation_tensor(self.n_agents(), self.n_states())
    }

    /// Final-state indicator `F[s]`; defaults to no final states.
    fn final_states(&self) -> Array1<f64> {
        Array1::zeros(self.n_states())
    }

    fn state_labels(&self) -> Vec<String> {
        (0..self.n_states()).map(|s| format!("s{s}")).collect()
    }

    /// Labels of the observations of partially observable learners.
    ///
    /// When there are as many observations as states they are labelled like
    /// the states.
    fn observation_labels(&self) -> Vec<String> {
        if self.n_observations() == self.n_states() {
            self.state_labels()
        } else {
            (0..self.n_observations()).map(|o| format!("o{o}")).collect()
        }
    }

    fn action_labels(&self) -> Vec<String> {
        (0..self.n_actions()).map(|a| format!("a{a}")).collect()
    }

    /// Joint-action layout; fails if the joint-action space is too large.
    fn joint_actions(&self) -> Result<JointActions> {
        JointActions::new(self.n_agents(), self.n_actions())
    }
}

/// Observation tensor under which each agent sees the true state.
pub fn full_observation_tensor(n_agents: usize, n_states: usize) -> Array3<f64> {
    Array3::from_shape_fn((n_agents, n_states, n_states), |(_, s, o)| {
        if s == o { 1.0 } else { 0.0 }
    })
}
