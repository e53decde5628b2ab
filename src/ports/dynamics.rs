//! Learning-dynamics port - deterministic learners in policy space
//!
//! A learning dynamics maps the joint policy of all agents to the joint
//! policy after one expected learning update. Fully and partially
//! observable learners implement the same trait, so trajectories, runs
//! and observers work with either.

use ndarray::{Array1, Array3};
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::{
    Result,
    policy::Policy,
    trajectory::{Trajectory, TrajectoryConfig},
};

pub trait LearningDynamics {
    /// Name used in logs and saved runs.
    fn name(&self) -> &str;

    fn n_agents(&self) -> usize;

    /// Number of situations a policy conditions on (states or observations).
    fn n_situations(&self) -> usize;

    fn n_actions(&self) -> usize;

    /// Expected temporal-difference error `δ[i, k, a]` under `policy`.
    fn td_error(&self, policy: &Policy) -> Result<Array3<f64>>;

    /// Apply one expected learning update to all agents simultaneously.
    fn step(&self, policy: &Policy) -> Result<Policy>;

    /// Action values `Q[i, k, a]` under `policy`.
    fn action_values(&self, policy: &Policy) -> Result<Array3<f64>>;

    /// Long-run average reward per agent under `policy`.
    fn average_rewards(&self, policy: &Policy) -> Result<Array1<f64>>;

    /// Policy choosing every action with equal probability.
    fn zero_intelligence_policy(&self) -> Policy {
        Policy::uniform(self.n_agents(), self.n_situations(), self.n_actions())
    }

    /// Policy with rows drawn from a flat Dirichlet distribution.
    fn random_policy(&self, rng: &mut dyn RngCore) -> Policy {
        Policy::random(self.n_agents(), self.n_situations(), self.n_actions(), rng)
    }

    /// Check that `policy` has this learner's shape and valid rows.
    fn check_policy(&self, policy: &Policy) -> Result<()> {
        policy.expect_shape(self.n_agents(), self.n_situations(), self.n_actions())?;
        policy.validate()
    }

    /// Iterate [`step`](Self::step) from `initial` until a fixed point or
    /// `config.max_steps` is reached.
    fn trajectory(&self, initial: Policy, config: &TrajectoryConfig) -> Result<Trajectory> {
        self.check_policy(&initial)?;

        let trajectory = config.iterate(
            initial,
            |policy| self.step(policy),
            |step, _, change| {
                debug!(learner = self.name(), step, change, "learning step");
                Ok(())
            },
        )?;

        if trajectory.converged {
            info!(learner = self.name(), steps = trajectory.steps(), "reached fixed point");
        } else if config.tolerance.is_some() {
            warn!(
                learner = self.name(),
                max_steps = config.max_steps,
                "no fixed point within step budget"
            );
        }

        Ok(trajectory)
    }
}
