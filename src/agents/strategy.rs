//! Strategy (policy-space) actor-critic learning
//!
//! Every agent adjusts its policy in the direction of its expected
//! temporal-difference error
//!
//! ```text
//! δ[i, k, a] = pre_i R[i, k, a] + γ_i NextV[i, k, a] - ln X[i, k, a] / β_i
//! X'[i, k, a] ∝ X[i, k, a] exp(α_i β_i δ[i, k, a])
//! ```
//!
//! Fixed points of this map are the logit equilibria `X ∝ exp(β Q)`.

use ndarray::{Array1, Array3, Axis, Zip};

use super::base::DynamicsBase;
use crate::{
    Result,
    parameters::{
        AgentParameter, make_variable_vector, validate_choice_intensities,
        validate_learning_rates,
    },
    policy::Policy,
    ports::{Environment, LearningDynamics},
    utils::softmax,
};

/// Learning rates and choice intensities after broadcasting to all agents.
#[derive(Debug, Clone)]
pub struct StrategyRates {
    pub alpha: Array1<f64>,
    pub beta: Array1<f64>,
}

impl StrategyRates {
    pub fn new(
        learning_rates: &AgentParameter,
        choice_intensities: &AgentParameter,
        n_agents: usize,
    ) -> Result<Self> {
        let alpha = make_variable_vector("learning_rates", learning_rates, n_agents)?;
        validate_learning_rates(&alpha)?;
        let beta = make_variable_vector("choice_intensities", choice_intensities, n_agents)?;
        validate_choice_intensities(&beta)?;
        Ok(Self { alpha, beta })
    }
}

/// `δ = target - ln X / β`, where `target = pre R + γ NextV`.
///
/// The log-policy term is dropped where `X` is zero.
pub(crate) fn td_error(target: &Array3<f64>, x: &Array3<f64>, beta: &Array1<f64>) -> Array3<f64> {
    let mut delta = target.clone();
    for (i, agent) in delta.axis_iter_mut(Axis(0)).enumerate() {
        let inv_beta = 1.0 / beta[i];
        Zip::from(agent)
            .and(x.index_axis(Axis(0), i))
            .for_each(|d, &p| {
                if p > 0.0 {
                    *d -= inv_beta * p.ln();
                }
            });
    }
    delta
}

/// One actor-critic update `X' ∝ X exp(α β δ)`.
///
/// Computed in log space as `(1 - α) ln X + α β target`, normalised with a
/// max-shifted softmax per row. Zero entries stay zero.
pub(crate) fn actor_critic_step(
    target: &Array3<f64>,
    x: &Array3<f64>,
    rates: &StrategyRates,
) -> Policy {
    let mut next = Array3::zeros(x.raw_dim());
    for i in 0..x.dim().0 {
        let alpha = rates.alpha[i];
        let beta = rates.beta[i];
        for k in 0..x.dim().1 {
            let exponents: Vec<f64> = (0..x.dim().2)
                .map(|a| {
                    let p = x[[i, k, a]];
                    let gain = alpha * beta * target[[i, k, a]];
                    if p <= 0.0 {
                        f64::NEG_INFINITY
                    } else if alpha >= 1.0 {
                        gain
                    } else {
                        (1.0 - alpha) * p.ln() + gain
                    }
                })
                .collect();
            for (a, p) in softmax(&exponents).into_iter().enumerate() {
                next[[i, k, a]] = p;
            }
        }
    }
    Policy::from_normalized(next)
}

/// Fully observable, policy-average, independent strategy actor-critic.
///
/// # Examples
///
/// ```
/// use crld::{
///     agents::StrategyActorCritic,
///     environments::SocialDilemma,
///     parameters::AgentParameter,
///     ports::LearningDynamics,
/// };
///
/// let env = SocialDilemma::new(1.0, 1.2, -0.5, 0.0);
/// let learner = StrategyActorCritic::new(
///     &env,
///     &AgentParameter::Uniform(0.05),
///     &AgentParameter::Uniform(0.9),
///     &AgentParameter::Uniform(50.0),
/// )?;
/// let next = learner.step(&learner.zero_intelligence_policy())?;
/// // defection dominates, so both agents shift towards it
/// assert!(next.prob(0, 0, 1) > 0.5);
/// # Ok::<(), crld::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct StrategyActorCritic {
    base: DynamicsBase,
    rates: StrategyRates,
}

impl StrategyActorCritic {
    pub fn new(
        env: &dyn Environment,
        learning_rates: &AgentParameter,
        discount_factors: &AgentParameter,
        choice_intensities: &AgentParameter,
    ) -> Result<Self> {
        Self::with_prefactor(
            env,
            learning_rates,
            discount_factors,
            choice_intensities,
            false,
        )
    }

    pub fn with_prefactor(
        env: &dyn Environment,
        learning_rates: &AgentParameter,
        discount_factors: &AgentParameter,
        choice_intensities: &AgentParameter,
        use_prefactor: bool,
    ) -> Result<Self> {
        let base = DynamicsBase::new(env, discount_factors, use_prefactor)?;
        let rates = StrategyRates::new(learning_rates, choice_intensities, base.n_agents())?;
        Ok(Self { base, rates })
    }

    pub fn base(&self) -> &DynamicsBase {
        &self.base
    }

    pub fn learning_rates(&self) -> &Array1<f64> {
        &self.rates.alpha
    }

    pub fn choice_intensities(&self) -> &Array1<f64> {
        &self.rates.beta
    }

    fn target(&self, policy: &Policy) -> Result<Array3<f64>> {
        self.check_policy(policy)?;
        let valuation = self.base.evaluate(policy.values())?;
        Ok(self.base.combine(&valuation.risa, &valuation.next_visa))
    }
}

impl LearningDynamics for StrategyActorCritic {
    fn name(&self) -> &str {
        "StrategyActorCritic"
    }

    fn n_agents(&self) -> usize {
        self.base.n_agents()
    }

    fn n_situations(&self) -> usize {
        self.base.n_states()
    }

    fn n_actions(&self) -> usize {
        self.base.n_actions()
    }

    fn td_error(&self, policy: &Policy) -> Result<Array3<f64>> {
        let target = self.target(policy)?;
        Ok(td_error(&target, policy.values(), &self.rates.beta))
    }

    fn step(&self, policy: &Policy) -> Result<Policy> {
        let target = self.target(policy)?;
        Ok(actor_critic_step(&target, policy.values(), &self.rates))
    }

    fn action_values(&self, policy: &Policy) -> Result<Array3<f64>> {
        self.check_policy(policy)?;
        self.base.qisa(policy.values())
    }

    fn average_rewards(&self, policy: &Policy) -> Result<Array1<f64>> {
        self.check_policy(policy)?;
        Ok(self.base.average_rewards(policy.values()))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{
        environments::{RiskReward, SocialDilemma, risk_reward::RiskRewardParams},
        trajectory::TrajectoryConfig,
    };

    fn learner(alpha: f64, gamma: f64, beta: f64) -> StrategyActorCritic {
        let env = SocialDilemma::new(1.0, 1.2, -0.5, 0.0);
        StrategyActorCritic::new(
            &env,
            &AgentParameter::Uniform(alpha),
            &AgentParameter::Uniform(gamma),
            &AgentParameter::Uniform(beta),
        )
        .unwrap()
    }

    #[test]
    fn step_preserves_normalization() {
        let learner = learner(0.1, 0.9, 10.0);
        let x = Policy::new(array![[[0.3, 0.7]], [[0.8, 0.2]]]).unwrap();
        let next = learner.step(&x).unwrap();
        next.validate().unwrap();
    }

    #[test]
    fn step_matches_multiplicative_update() {
        let learner = learner(0.1, 0.5, 2.0);
        let x = Policy::new(array![[[0.3, 0.7]], [[0.8, 0.2]]]).unwrap();
        let delta = learner.td_error(&x).unwrap();
        let next = learner.step(&x).unwrap();
        for i in 0..2 {
            let weights: Vec<f64> = (0..2)
                .map(|a| x.prob(i, 0, a) * (0.1 * 2.0 * delta[[i, 0, a]]).exp())
                .collect();
            let total: f64 = weights.iter().sum();
            for a in 0..2 {
                assert!((next.prob(i, 0, a) - weights[a] / total).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn prisoners_dilemma_learns_defection() {
        let learner = learner(0.1, 0.0, 50.0);
        let trajectory = learner
            .trajectory(
                learner.zero_intelligence_policy(),
                &TrajectoryConfig::new(2_000).with_tolerance(1e-9),
            )
            .unwrap();
        let last = trajectory.last().unwrap();
        assert!(last.prob(0, 0, 1) > 0.99);
        assert!(last.prob(1, 0, 1) > 0.99);
    }

    #[test]
    fn fixed_point_is_logit_response() {
        // at a fixed point every row equals softmax(β Q)
        let env = RiskReward::new(RiskRewardParams {
            collapse_prob: 0.0,
            recovery_prob: 1.0,
            safe_reward: 0.2,
            risky_reward: 0.6,
            degraded_reward: 0.0,
        })
        .unwrap();
        let learner = StrategyActorCritic::with_prefactor(
            &env,
            &AgentParameter::Uniform(0.5),
            &AgentParameter::Uniform(0.5),
            &AgentParameter::Uniform(3.0),
            true,
        )
        .unwrap();
        let trajectory = learner
            .trajectory(
                learner.zero_intelligence_policy(),
                &TrajectoryConfig::new(5_000).with_tolerance(1e-12),
            )
            .unwrap();
        assert!(trajectory.converged);
        let last = trajectory.last().unwrap();
        let q = learner.action_values(last).unwrap();
        let logit = softmax(&[3.0 * q[[0, 0, 0]], 3.0 * q[[0, 0, 1]]]);
        assert!((last.prob(0, 0, 0) - logit[0]).abs() < 1e-8);
        assert!((last.prob(0, 0, 1) - logit[1]).abs() < 1e-8);
    }

    #[test]
    fn zero_probabilities_stay_zero() {
        let x = Policy::new(array![[[1.0, 0.0]], [[0.5, 0.5]]]).unwrap();
        for alpha in [0.5, 1.0] {
            let learner = learner(alpha, 0.9, 1.0);
            let next = learner.step(&x).unwrap();
            assert_eq!(next.prob(0, 0, 1), 0.0, "alpha = {alpha}");
            assert_eq!(next.prob(0, 0, 0), 1.0, "alpha = {alpha}");
            assert!(learner.td_error(&x).unwrap().iter().all(|d| d.is_finite()));
        }
    }

    #[test]
    fn rejects_policy_of_wrong_shape() {
        let learner = learner(0.1, 0.9, 1.0);
        let x = Policy::uniform(2, 2, 2);
        assert!(learner.step(&x).is_err());
    }

    #[test]
    fn rejects_invalid_learning_rate() {
        let env = SocialDilemma::new(1.0, 1.2, -0.5, 0.0);
        let result = StrategyActorCritic::new(
            &env,
            &AgentParameter::PerAgent(vec![0.1, 0.0]),
            &AgentParameter::Uniform(0.9),
            &AgentParameter::Uniform(1.0),
        );
        assert!(result.is_err());
    }
}
