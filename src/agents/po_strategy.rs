//! Partially observable strategy actor-critic
//!
//! Deterministic policy-average independent (multi-agent) partially
//! observable temporal-difference reinforcement learning in policy space.
//! Agents hold observation policies `X[i, o, a]`; rewards and next values
//! are averaged over each agent's belief about the hidden state.

use ndarray::{Array1, Array3};
use tracing::debug;

use super::{
    po_base::ObservationBase,
    strategy::{StrategyRates, actor_critic_step, td_error},
};
use crate::{
    Error, Result,
    environments::check_transition_tensor,
    parameters::AgentParameter,
    policy::Policy,
    ports::{Environment, LearningDynamics},
    utils::all_close_to_zero,
};

/// Partially observable, policy-average, independent strategy learner.
///
/// # Examples
///
/// ```
/// use crld::{
///     agents::POStrategyActorCritic,
///     environments::{SocialDilemmaPayoffs, UncertainSocialDilemma, uncertain::UncertainDilemmaParams},
///     parameters::AgentParameter,
///     ports::LearningDynamics,
/// };
///
/// let env = UncertainSocialDilemma::new(UncertainDilemmaParams {
///     game_a: SocialDilemmaPayoffs::new(3.0, 5.0, 0.0, 1.0),
///     game_b: SocialDilemmaPayoffs::new(5.0, 3.0, 0.0, 1.0),
///     switch_prob: 0.1,
///     accuracy: 0.8,
/// })?;
/// let learner = POStrategyActorCritic::new(
///     &env,
///     &AgentParameter::Uniform(0.1),
///     &AgentParameter::Uniform(0.9),
///     &AgentParameter::Uniform(1.0),
/// )?;
/// assert_eq!(learner.n_situations(), 2);
/// # Ok::<(), crld::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct POStrategyActorCritic {
    env_id: String,
    base: ObservationBase,
    rates: StrategyRates,
}

impl POStrategyActorCritic {
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

    /// Wire the environment's tensors to the per-agent parameters.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidTransitionTensor`] if a transition row does not sum to 1
    /// * [`Error::FinalStatesUnsupported`] if the environment has final states
    /// * parameter errors for mis-sized or out-of-range parameters
    pub fn with_prefactor(
        env: &dyn Environment,
        learning_rates: &AgentParameter,
        discount_factors: &AgentParameter,
        choice_intensities: &AgentParameter,
        use_prefactor: bool,
    ) -> Result<Self> {
        check_transition_tensor(&env.transition_tensor())?;
        let base = ObservationBase::new(env, discount_factors, use_prefactor)?;

        if !all_close_to_zero(env.final_states().view()) {
            return Err(Error::FinalStatesUnsupported);
        }

        let rates = StrategyRates::new(
            learning_rates,
            choice_intensities,
            base.state_base().n_agents(),
        )?;

        debug!(
            env = %env.id(),
            agents = base.state_base().n_agents(),
            observations = base.n_observations(),
            "initialised partially observable strategy learner"
        );

        Ok(Self {
            env_id: env.id(),
            base,
            rates,
        })
    }

    pub fn env_id(&self) -> &str {
        &self.env_id
    }

    pub fn observation_base(&self) -> &ObservationBase {
        &self.base
    }

    pub fn learning_rates(&self) -> &Array1<f64> {
        &self.rates.alpha
    }

    pub fn choice_intensities(&self) -> &Array1<f64> {
        &self.rates.beta
    }

    pub fn discount_factors(&self) -> &Array1<f64> {
        self.base.state_base().discount_factors()
    }

    /// Effective state policy induced by an observation policy.
    pub fn state_policy(&self, policy: &Policy) -> Result<Policy> {
        self.check_policy(policy)?;
        Ok(Policy::from_normalized(self.base.xisa(policy.values())))
    }

    fn target(&self, policy: &Policy) -> Result<Array3<f64>> {
        self.check_policy(policy)?;
        let valuation = self.base.evaluate(policy.values())?;
        Ok(self
            .base
            .state_base()
            .combine(&valuation.rioa, &valuation.next_vioa))
    }
}

impl LearningDynamics for POStrategyActorCritic {
    fn name(&self) -> &str {
        "POStrategyActorCritic"
    }

    fn n_agents(&self) -> usize {
        self.base.state_base().n_agents()
    }

    fn n_situations(&self) -> usize {
        self.base.n_observations()
    }

    fn n_actions(&self) -> usize {
        self.base.state_base().n_actions()
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
        self.base.qioa(policy.values())
    }

    fn average_rewards(&self, policy: &Policy) -> Result<Array1<f64>> {
        self.check_policy(policy)?;
        Ok(self.base.average_rewards(policy.values()))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array3, Array4, array};

    use super::*;
    use crate::{
        agents::StrategyActorCritic,
        environments::{
            SocialDilemma, SocialDilemmaPayoffs, TensorEnvironment, UncertainSocialDilemma,
            tensor::EnvironmentTensors, uncertain::UncertainDilemmaParams,
        },
    };

    fn uncertain(accuracy: f64) -> UncertainSocialDilemma {
        UncertainSocialDilemma::new(UncertainDilemmaParams {
            game_a: SocialDilemmaPayoffs::new(3.0, 5.0, 0.0, 1.0),
            game_b: SocialDilemmaPayoffs::new(5.0, 3.0, 0.0, 1.0),
            switch_prob: 0.1,
            accuracy,
        })
        .unwrap()
    }

    fn uniform(v: f64) -> AgentParameter {
        AgentParameter::Uniform(v)
    }

    #[test]
    fn parameters_are_broadcast_per_agent() {
        let learner = POStrategyActorCritic::new(
            &uncertain(0.8),
            &AgentParameter::PerAgent(vec![0.1, 0.2]),
            &uniform(0.9),
            &uniform(1.0),
        )
        .unwrap();
        assert_eq!(learner.learning_rates().to_vec(), vec![0.1, 0.2]);
        assert_eq!(learner.choice_intensities().to_vec(), vec![1.0, 1.0]);
        assert_eq!(learner.discount_factors().to_vec(), vec![0.9, 0.9]);
    }

    #[test]
    fn rejects_environment_with_final_states() {
        let env = TensorEnvironment::new(
            "episodic",
            EnvironmentTensors {
                n_agents: 1,
                n_actions: 1,
                transitions: array![[[0.0, 1.0]], [[1.0, 0.0]]],
                rewards: Array4::zeros((1, 2, 1, 2)),
                observations: None,
                final_states: Some(array![0.0, 1.0]),
            },
        )
        .unwrap();
        let result = POStrategyActorCritic::new(&env, &uniform(0.1), &uniform(0.9), &uniform(1.0));
        assert!(matches!(result, Err(Error::FinalStatesUnsupported)));
    }

    #[test]
    fn rejects_invalid_transition_tensor() {
        struct Leaky;
        impl Environment for Leaky {
            fn id(&self) -> String {
                "leaky".to_string()
            }
            fn n_agents(&self) -> usize {
                1
            }
            fn n_actions(&self) -> usize {
                1
            }
            fn n_states(&self) -> usize {
                1
            }
            fn transition_tensor(&self) -> Array3<f64> {
                Array3::from_elem((1, 1, 1), 0.9)
            }
            fn reward_tensor(&self) -> Array4<f64> {
                Array4::zeros((1, 1, 1, 1))
            }
        }
        let result =
            POStrategyActorCritic::new(&Leaky, &uniform(0.1), &uniform(0.9), &uniform(1.0));
        assert!(matches!(result, Err(Error::InvalidTransitionTensor { .. })));
    }

    #[test]
    fn choice_intensity_defaults_are_validated() {
        let result =
            POStrategyActorCritic::new(&uncertain(0.8), &uniform(0.1), &uniform(0.9), &uniform(0.0));
        assert!(matches!(result, Err(Error::ParameterOutOfRange { .. })));
    }

    #[test]
    fn matches_fully_observable_learner_under_full_observability() {
        let env = SocialDilemma::new(1.0, 1.2, -0.5, 0.0);
        let po = POStrategyActorCritic::new(&env, &uniform(0.2), &uniform(0.7), &uniform(5.0))
            .unwrap();
        let fo = StrategyActorCritic::new(&env, &uniform(0.2), &uniform(0.7), &uniform(5.0))
            .unwrap();
        let x = Policy::new(array![[[0.3, 0.7]], [[0.6, 0.4]]]).unwrap();
        let a = po.step(&x).unwrap();
        let b = fo.step(&x).unwrap();
        assert!(a.distance(&b) < 1e-12);
    }

    #[test]
    fn step_keeps_observation_policies_normalized() {
        let learner =
            POStrategyActorCritic::new(&uncertain(0.7), &uniform(0.1), &uniform(0.9), &uniform(2.0))
                .unwrap();
        let mut policy = learner.zero_intelligence_policy();
        for _ in 0..20 {
            policy = learner.step(&policy).unwrap();
            policy.validate().unwrap();
        }
        let rewards: Array1<f64> = learner.average_rewards(&policy).unwrap();
        assert!(rewards.iter().all(|r| r.is_finite()));
    }

    #[test]
    fn state_policy_mixes_by_observation_accuracy() {
        let learner =
            POStrategyActorCritic::new(&uncertain(0.9), &uniform(0.1), &uniform(0.9), &uniform(1.0))
                .unwrap();
        let x = Policy::new(array![[[1.0, 0.0], [0.0, 1.0]], [[0.5, 0.5], [0.5, 0.5]]]).unwrap();
        let xs = learner.state_policy(&x).unwrap();
        assert!((xs.prob(0, 0, 0) - 0.9).abs() < 1e-12);
        assert!((xs.prob(0, 1, 0) - 0.1).abs() < 1e-12);
        assert!((xs.prob(1, 0, 0) - 0.5).abs() < 1e-12);
    }
}
