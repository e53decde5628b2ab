//! Learning trajectories in policy space

use serde::{Deserialize, Serialize};

use crate::{Error, Result, policy::Policy};

/// Stopping rule for trajectory computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    /// Maximum number of learning steps
    pub max_steps: usize,
    /// Stop once consecutive policies are closer than this (Frobenius norm)
    pub tolerance: Option<f64>,
}

impl TrajectoryConfig {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            tolerance: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Apply `step` repeatedly from `initial` under this stopping rule.
    ///
    /// `on_step` receives the 1-based step number, the new policy and its
    /// distance to the previous one before the stopping rule is checked.
    pub fn iterate<S, F>(&self, initial: Policy, mut step: S, mut on_step: F) -> Result<Trajectory>
    where
        S: FnMut(&Policy) -> Result<Policy>,
        F: FnMut(usize, &Policy, f64) -> Result<()>,
    {
        let mut policies = Vec::with_capacity(self.max_steps.min(10_000) + 1);
        policies.push(initial);
        let mut converged = false;

        for n in 1..=self.max_steps {
            let current = &policies[policies.len() - 1];
            let next = step(current)?;
            let change = next.distance(current);
            on_step(n, &next, change)?;
            policies.push(next);

            if self.tolerance.is_some_and(|tol| change < tol) {
                converged = true;
                break;
            }
        }

        Ok(Trajectory {
            policies,
            converged,
        })
    }
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            tolerance: Some(1e-5),
        }
    }
}

/// Sequence of joint policies visited by learning, starting at the initial one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub policies: Vec<Policy>,
    /// Whether the stopping tolerance was reached before `max_steps`
    pub converged: bool,
}

impl Trajectory {
    pub fn initial(&self) -> Result<&Policy> {
        self.policies.first().ok_or(Error::EmptyTrajectory)
    }

    pub fn last(&self) -> Result<&Policy> {
        self.policies.last().ok_or(Error::EmptyTrajectory)
    }

    /// Number of learning steps taken (policies minus the initial one).
    pub fn steps(&self) -> usize {
        self.policies.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trajectory_has_no_last_policy() {
        let trajectory = Trajectory {
            policies: vec![],
            converged: false,
        };
        assert!(matches!(trajectory.last(), Err(Error::EmptyTrajectory)));
        assert_eq!(trajectory.steps(), 0);
    }

    #[test]
    fn iterate_stops_at_a_fixed_point() {
        let config = TrajectoryConfig::new(10).with_tolerance(1e-9);
        let mut seen = Vec::new();
        let trajectory = config
            .iterate(
                Policy::uniform(1, 1, 2),
                |policy| Ok(policy.clone()),
                |step, _, change| {
                    seen.push((step, change));
                    Ok(())
                },
            )
            .unwrap();
        assert!(trajectory.converged);
        assert_eq!(trajectory.steps(), 1);
        assert_eq!(seen, vec![(1, 0.0)]);
    }

    #[test]
    fn iterate_uses_the_whole_budget_without_tolerance() {
        let trajectory = TrajectoryConfig::new(4)
            .iterate(Policy::uniform(1, 1, 2), |policy| Ok(policy.clone()), |_, _, _| Ok(()))
            .unwrap();
        assert!(!trajectory.converged);
        assert_eq!(trajectory.steps(), 4);
    }

    #[test]
    fn config_builder_sets_tolerance() {
        let config = TrajectoryConfig::new(50).with_tolerance(1e-3);
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.tolerance, Some(1e-3));
    }
}
