//! Fully observable learning-dynamics base
//!
//! Given all agents' current state policies `X[i, s, a]`, this module
//! computes the expected quantities a temporal-difference learner would
//! estimate from infinitely many samples: state transitions, rewards,
//! state values and next-state values for every agent.
//!
//! Final states end the episode, so the continuation value of a transition
//! into a final state is zero.

use ndarray::{Array1, Array2, Array3, Array4, Axis};
use tracing::{trace, warn};

use crate::{
    Error, Result,
    environments::check_transition_tensor,
    parameters::{AgentParameter, make_variable_vector, validate_discount_factors},
    ports::Environment,
    types::JointActions,
    utils::solve_linear_system,
};

const STATDIST_TOLERANCE: f64 = 1e-12;
const STATDIST_MAX_SWEEPS: usize = 10_000;

/// Expected reward and transition quantities under one state policy.
#[derive(Debug, Clone)]
pub struct StateValuation {
    /// `Risa[i, s, a]`: expected immediate reward of action `a`
    pub risa: Array3<f64>,
    /// `Ris[i, s]`: expected immediate reward under the policy
    pub ris: Array2<f64>,
    /// `Vis[i, s]`: state values
    pub vis: Array2<f64>,
    /// `NextVisa[i, s, a]`: expected value of the successor state
    pub next_visa: Array3<f64>,
}

/// Shared machinery for policy-average, independent learners.
#[derive(Debug, Clone)]
pub struct DynamicsBase {
    joint: JointActions,
    profiles: Vec<Vec<usize>>,
    n_states: usize,
    transitions: Array3<f64>,
    /// `Rsj[i, s, j] = Σ_s' T[s, j, s'] R[i, s, j, s']`
    expected_rewards: Array3<f64>,
    /// `1 - F[s]`
    continuation: Array1<f64>,
    gamma: Array1<f64>,
    prefactor: Array1<f64>,
}

impl DynamicsBase {
    /// Build from an environment's transition, reward and final-state tensors.
    ///
    /// With `use_prefactor` the values are scaled by `1 - γ`, putting them on
    /// the same scale as the rewards.
    pub fn new(
        env: &dyn Environment,
        discount_factors: &AgentParameter,
        use_prefactor: bool,
    ) -> Result<Self> {
        let transitions = env.transition_tensor();
        let rewards = env.reward_tensor();
        let final_states = env.final_states();
        Self::from_tensors(
            env.joint_actions()?,
            transitions,
            rewards,
            final_states,
            discount_factors,
            use_prefactor,
        )
    }

    pub fn from_tensors(
        joint: JointActions,
        transitions: Array3<f64>,
        rewards: Array4<f64>,
        final_states: Array1<f64>,
        discount_factors: &AgentParameter,
        use_prefactor: bool,
    ) -> Result<Self> {
        let n_agents = joint.n_agents();
        let n_states = transitions.dim().0;

        let expected_t = [n_states, joint.count(), n_states];
        if transitions.shape() != expected_t {
            return Err(Error::ShapeMismatch {
                tensor: "transitions".to_string(),
                expected: expected_t.to_vec(),
                got: transitions.shape().to_vec(),
            });
        }
        check_transition_tensor(&transitions)?;

        let expected_r = [n_agents, n_states, joint.count(), n_states];
        if rewards.shape() != expected_r {
            return Err(Error::ShapeMismatch {
                tensor: "rewards".to_string(),
                expected: expected_r.to_vec(),
                got: rewards.shape().to_vec(),
            });
        }
        if final_states.len() != n_states {
            return Err(Error::ShapeMismatch {
                tensor: "final_states".to_string(),
                expected: vec![n_states],
                got: final_states.shape().to_vec(),
            });
        }

        let gamma = make_variable_vector("discount_factors", discount_factors, n_agents)?;
        validate_discount_factors(&gamma)?;
        let prefactor = if use_prefactor {
            gamma.mapv(|g| 1.0 - g)
        } else {
            Array1::ones(n_agents)
        };

        let expected_rewards = Array3::from_shape_fn(
            (n_agents, n_states, joint.count()),
            |(i, s, j)| {
                (0..n_states)
                    .map(|next| transitions[[s, j, next]] * rewards[[i, s, j, next]])
                    .sum()
            },
        );

        Ok(Self {
            profiles: (0..joint.count()).map(|j| joint.decode(j)).collect(),
            joint,
            n_states,
            transitions,
            expected_rewards,
            continuation: final_states.mapv(|f| 1.0 - f),
            gamma,
            prefactor,
        })
    }

    pub fn n_agents(&self) -> usize {
        self.joint.n_agents()
    }

    pub fn n_actions(&self) -> usize {
        self.joint.n_actions()
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn discount_factors(&self) -> &Array1<f64> {
        &self.gamma
    }

    pub fn prefactors(&self) -> &Array1<f64> {
        &self.prefactor
    }

    pub fn joint_actions(&self) -> JointActions {
        self.joint
    }

    /// Probability that all other agents jointly play their parts of `j`.
    fn others_weight(&self, x: &Array3<f64>, agent: usize, state: usize, j: usize) -> f64 {
        self.profiles[j]
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != agent)
            .map(|(k, &a)| x[[k, state, a]])
            .product()
    }

    /// `P(j | s)`: probability of each joint action in each state.
    pub fn joint_policy(&self, x: &Array3<f64>) -> Array2<f64> {
        Array2::from_shape_fn((self.n_states, self.joint.count()), |(s, j)| {
            self.profiles[j]
                .iter()
                .enumerate()
                .map(|(k, &a)| x[[k, s, a]])
                .product()
        })
    }

    /// `Tss[s, s']`: state transition matrix under the joint policy.
    pub fn tss(&self, x: &Array3<f64>) -> Array2<f64> {
        let joint_policy = self.joint_policy(x);
        let mut tss = Array2::zeros((self.n_states, self.n_states));
        for s in 0..self.n_states {
            for j in 0..self.joint.count() {
                let p = joint_policy[[s, j]];
                if p == 0.0 {
                    continue;
                }
                for next in 0..self.n_states {
                    tss[[s, next]] += p * self.transitions[[s, j, next]];
                }
            }
        }
        tss
    }

    /// `Tisas[i, s, a, s']`: transitions when agent `i` plays `a` and the
    /// others follow their policies.
    pub fn tisas(&self, x: &Array3<f64>) -> Array4<f64> {
        let (n, m, z) = (self.n_agents(), self.n_actions(), self.n_states);
        let mut tisas = Array4::zeros((n, z, m, z));
        for i in 0..n {
            for s in 0..z {
                for j in 0..self.joint.count() {
                    let w = self.others_weight(x, i, s, j);
                    if w == 0.0 {
                        continue;
                    }
                    let a = self.profiles[j][i];
                    for next in 0..z {
                        tisas[[i, s, a, next]] += w * self.transitions[[s, j, next]];
                    }
                }
            }
        }
        tisas
    }

    /// `Risa[i, s, a]`: expected reward when agent `i` plays `a`.
    pub fn risa(&self, x: &Array3<f64>) -> Array3<f64> {
        let (n, m, z) = (self.n_agents(), self.n_actions(), self.n_states);
        let mut risa = Array3::zeros((n, z, m));
        for i in 0..n {
            for s in 0..z {
                for j in 0..self.joint.count() {
                    let w = self.others_weight(x, i, s, j);
                    risa[[i, s, self.profiles[j][i]]] += w * self.expected_rewards[[i, s, j]];
                }
            }
        }
        risa
    }

    /// `Ris[i, s] = Σ_a X[i, s, a] Risa[i, s, a]`.
    pub fn ris(&self, x: &Array3<f64>, risa: &Array3<f64>) -> Array2<f64> {
        (x * risa).sum_axis(Axis(2))
    }

    /// `Vis[i] = pre_i (I - γ_i Tss diag(1 - F))⁻¹ Ris[i]`.
    pub fn vis(&self, tss: &Array2<f64>, ris: &Array2<f64>) -> Result<Array2<f64>> {
        let z = self.n_states;
        let masked = tss * &self.continuation.view().insert_axis(Axis(0));
        let mut vis = Array2::zeros((self.n_agents(), z));
        for i in 0..self.n_agents() {
            let system = Array2::<f64>::eye(z) - &masked * self.gamma[i];
            let values = solve_linear_system(&system, &ris.row(i).to_owned())
                .ok_or(Error::SingularSystem { agent: i })?;
            vis.row_mut(i).assign(&(values * self.prefactor[i]));
        }
        Ok(vis)
    }

    /// `NextVisa[i, s, a] = Σ_s' Tisas[i, s, a, s'] (1 - F[s']) Vis[i, s']`.
    pub fn next_visa(&self, tisas: &Array4<f64>, vis: &Array2<f64>) -> Array3<f64> {
        let (n, z, m, _) = tisas.dim();
        Array3::from_shape_fn((n, z, m), |(i, s, a)| {
            (0..z)
                .map(|next| tisas[[i, s, a, next]] * self.continuation[next] * vis[[i, next]])
                .sum()
        })
    }

    /// Evaluate all expected quantities for state policy `x`.
    pub fn evaluate(&self, x: &Array3<f64>) -> Result<StateValuation> {
        let risa = self.risa(x);
        let ris = self.ris(x, &risa);
        let tss = self.tss(x);
        let vis = self.vis(&tss, &ris)?;
        let next_visa = self.next_visa(&self.tisas(x), &vis);
        trace!(?vis, "evaluated state values");
        Ok(StateValuation {
            risa,
            ris,
            vis,
            next_visa,
        })
    }

    /// `Qisa = pre · Risa + γ · NextVisa`.
    pub fn qisa(&self, x: &Array3<f64>) -> Result<Array3<f64>> {
        let valuation = self.evaluate(x)?;
        Ok(self.combine(&valuation.risa, &valuation.next_visa))
    }

    /// `pre_i · rewards + γ_i · next_values`, broadcast over the last two axes.
    pub fn combine(&self, rewards: &Array3<f64>, next_values: &Array3<f64>) -> Array3<f64> {
        let pre = self.prefactor.view().insert_axis(Axis(1)).insert_axis(Axis(2));
        let gamma = self.gamma.view().insert_axis(Axis(1)).insert_axis(Axis(2));
        &pre * rewards + &gamma * next_values
    }

    /// A stationary distribution of the state chain under `x`.
    ///
    /// Solves `δ (I - Tss) = 0` with `Σ δ = 1` directly. That system is
    /// singular exactly when the chain has several closed classes; those
    /// chains fall back to [`Self::power_statdist`].
    pub fn statdist(&self, x: &Array3<f64>) -> Array1<f64> {
        let tss = self.tss(x);
        self.solve_statdist(&tss).unwrap_or_else(|| {
            trace!("stationary distribution not unique, iterating");
            self.power_statdist(&tss)
        })
    }

    fn solve_statdist(&self, tss: &Array2<f64>) -> Option<Array1<f64>> {
        let last = self.n_states.checked_sub(1)?;
        // transpose of (I - Tss), one balance equation swapped for Σ δ = 1
        let mut system = Array2::<f64>::eye(self.n_states) - &tss.t();
        system.row_mut(last).fill(1.0);
        let mut rhs = Array1::zeros(self.n_states);
        rhs[last] = 1.0;

        let dist = solve_linear_system(&system, &rhs)?.mapv(|p| p.max(0.0));
        let total = dist.sum();
        (total > 0.0).then(|| dist / total)
    }

    /// Power iteration on the lazy chain `(I + Tss) / 2`.
    ///
    /// The lazy chain has the same stationary distributions as `Tss` but is
    /// aperiodic. Starting from the uniform distribution, reducible chains
    /// converge to a mixture of their closed classes.
    pub fn power_statdist(&self, tss: &Array2<f64>) -> Array1<f64> {
        let z = self.n_states;
        let mut dist = Array1::from_elem(z, 1.0 / z as f64);
        let mut converged = false;
        for sweep in 0..STATDIST_MAX_SWEEPS {
            let next = (&dist + &dist.dot(tss)) * 0.5;
            let change = (&next - &dist).iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
            dist = next;
            if change < STATDIST_TOLERANCE {
                trace!(sweep, "stationary distribution converged");
                converged = true;
                break;
            }
        }
        if !converged {
            warn!(
                sweeps = STATDIST_MAX_SWEEPS,
                "stationary distribution did not converge"
            );
        }
        let total = dist.sum();
        dist / total
    }

    /// Long-run average reward per agent, `Σ_s δ_s Ris[i, s]`.
    pub fn average_rewards(&self, x: &Array3<f64>) -> Array1<f64> {
        let risa = self.risa(x);
        let ris = self.ris(x, &risa);
        ris.dot(&self.statdist(x))
    }
}
