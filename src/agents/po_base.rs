//! Partially observable learning-dynamics base
//!
//! Agents condition their behaviour on observations `o` instead of states.
//! An observation policy `X[i, o, a]` induces the effective state policy
//! `Σ_o O[i, s, o] X[i, o, a]`, and observation-level quantities are state
//! quantities averaged under the belief `B[i, o, s] ∝ δ(s) O[i, s, o]`
//! with the stationary state distribution `δ`.

use ndarray::{Array1, Array2, Array3, Axis};

use super::base::DynamicsBase;
use crate::{
    Error, Result,
    environments::check_observation_tensor,
    parameters::AgentParameter,
    ports::Environment,
    utils::{NormalizationFallback, normalize_weights_with_options},
};

/// Expected quantities at the level of observations.
#[derive(Debug, Clone)]
pub struct ObservationValuation {
    /// `Rioa[i, o, a]`
    pub rioa: Array3<f64>,
    /// `Vio[i, o]`
    pub vio: Array2<f64>,
    /// `NextVioa[i, o, a]`
    pub next_vioa: Array3<f64>,
    /// `B[i, o, s]`
    pub beliefs: Array3<f64>,
}

#[derive(Debug, Clone)]
pub struct ObservationBase {
    base: DynamicsBase,
    observations: Array3<f64>,
}

impl ObservationBase {
    pub fn new(
        env: &dyn Environment,
        discount_factors: &AgentParameter,
        use_prefactor: bool,
    ) -> Result<Self> {
        let base = DynamicsBase::new(env, discount_factors, use_prefactor)?;
        Self::from_parts(base, env.observation_tensor())
    }

    pub fn from_parts(base: DynamicsBase, observations: Array3<f64>) -> Result<Self> {
        let (n, z) = (base.n_agents(), base.n_states());
        if observations.dim().0 != n || observations.dim().1 != z {
            return Err(Error::ShapeMismatch {
                tensor: "observations".to_string(),
                expected: vec![n, z, observations.dim().2],
                got: observations.shape().to_vec(),
            });
        }
        check_observation_tensor(&observations)?;
        Ok(Self { base, observations })
    }

    pub fn state_base(&self) -> &DynamicsBase {
        &self.base
    }

    pub fn observation_tensor(&self) -> &Array3<f64> {
        &self.observations
    }

    pub fn n_observations(&self) -> usize {
        self.observations.dim().2
    }

    /// Effective state policy `Xisa[i, s, a] = Σ_o O[i, s, o] Xioa[i, o, a]`.
    pub fn xisa(&self, xioa: &Array3<f64>) -> Array3<f64> {
        let (n, z, _) = self.observations.dim();
        let m = xioa.dim().2;
        let mut xisa = Array3::zeros((n, z, m));
        for i in 0..n {
            let o_i = self.observations.index_axis(Axis(0), i);
            let x_i = xioa.index_axis(Axis(0), i);
            xisa.index_axis_mut(Axis(0), i).assign(&o_i.dot(&x_i));
        }
        xisa
    }

    /// Beliefs `B[i, o, s]` about the state given an observation.
    ///
    /// Observations that never occur under the stationary distribution fall
    /// back to the observation likelihood normalised over states, and to a
    /// uniform belief if even that is zero.
    pub fn beliefs_from_statdist(&self, statdist: &Array1<f64>) -> Array3<f64> {
        let (n, z, q) = self.observations.dim();
        let mut beliefs = Array3::zeros((n, q, z));
        for i in 0..n {
            for o in 0..q {
                let joint: Vec<f64> = (0..z)
                    .map(|s| statdist[s] * self.observations[[i, s, o]])
                    .collect();
                let likelihood: Vec<f64> = (0..z).map(|s| self.observations[[i, s, o]]).collect();
                let belief = normalize_weights_with_options(joint, NormalizationFallback::None)
                    .or_else(|| {
                        normalize_weights_with_options(likelihood, NormalizationFallback::Uniform)
                    })
                    .unwrap_or_else(|| vec![1.0 / z as f64; z]);
                for (s, b) in belief.into_iter().enumerate() {
                    beliefs[[i, o, s]] = b;
                }
            }
        }
        beliefs
    }

    pub fn beliefs(&self, xioa: &Array3<f64>) -> Array3<f64> {
        let xisa = self.xisa(xioa);
        self.beliefs_from_statdist(&self.base.statdist(&xisa))
    }

    /// Average state quantities `values[i, s, a]` into `[i, o, a]`.
    fn average_over_beliefs(beliefs: &Array3<f64>, values: &Array3<f64>) -> Array3<f64> {
        let (n, q, _) = beliefs.dim();
        let m = values.dim().2;
        let mut out = Array3::zeros((n, q, m));
        for i in 0..n {
            let b_i = beliefs.index_axis(Axis(0), i);
            let v_i = values.index_axis(Axis(0), i);
            out.index_axis_mut(Axis(0), i).assign(&b_i.dot(&v_i));
        }
        out
    }

    /// Evaluate observation-level rewards and values for `xioa`.
    pub fn evaluate(&self, xioa: &Array3<f64>) -> Result<ObservationValuation> {
        let xisa = self.xisa(xioa);
        let states = self.base.evaluate(&xisa)?;
        let beliefs = self.beliefs_from_statdist(&self.base.statdist(&xisa));

        let rioa = Self::average_over_beliefs(&beliefs, &states.risa);
        let next_vioa = Self::average_over_beliefs(&beliefs, &states.next_visa);
        let vio = Self::average_over_beliefs(&beliefs, &states.vis.clone().insert_axis(Axis(2)))
            .remove_axis(Axis(2));

        Ok(ObservationValuation {
            rioa,
            vio,
            next_vioa,
            beliefs,
        })
    }

    /// `Qioa = pre · Rioa + γ · NextVioa`.
    pub fn qioa(&self, xioa: &Array3<f64>) -> Result<Array3<f64>> {
        let valuation = self.evaluate(xioa)?;
        Ok(self.base.combine(&valuation.rioa, &valuation.next_vioa))
    }

    /// Long-run average reward per agent under the induced state policy.
    pub fn average_rewards(&self, xioa: &Array3<f64>) -> Array1<f64> {
        self.base.average_rewards(&self.xisa(xioa))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::environments::{
        SocialDilemma, SocialDilemmaPayoffs, UncertainSocialDilemma,
        uncertain::UncertainDilemmaParams,
    };

    fn uncertain(accuracy: f64) -> UncertainSocialDilemma {
        UncertainSocialDilemma::new(UncertainDilemmaParams {
            game_a: SocialDilemmaPayoffs::new(3.0, 5.0, 0.0, 1.0),
            game_b: SocialDilemmaPayoffs::new(5.0, 3.0, 0.0, 1.0),
            switch_prob: 0.2,
            accuracy,
        })
        .unwrap()
    }

    #[test]
    fn full_observability_reduces_to_state_quantities() {
        let env = SocialDilemma::new(1.0, 1.2, -0.5, 0.0);
        let po = ObservationBase::new(&env, &AgentParameter::Uniform(0.8), false).unwrap();
        let x = array![[[0.3, 0.7]], [[0.6, 0.4]]];
        assert_eq!(po.xisa(&x), x);
        let q_obs = po.qioa(&x).unwrap();
        let q_state = po.state_base().qisa(&x).unwrap();
        for (a, b) in q_obs.iter().zip(q_state.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn xisa_mixes_observation_policies() {
        let env = uncertain(0.75);
        let po = ObservationBase::new(&env, &AgentParameter::Uniform(0.8), false).unwrap();
        // both agents: cooperate on observation 0, defect on observation 1
        let x = array![[[1.0, 0.0], [0.0, 1.0]], [[1.0, 0.0], [0.0, 1.0]]];
        let xisa = po.xisa(&x);
        assert!((xisa[[0, 0, 0]] - 0.75).abs() < 1e-12);
        assert!((xisa[[0, 1, 0]] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn beliefs_are_distributions_over_states() {
        let env = uncertain(0.9);
        let po = ObservationBase::new(&env, &AgentParameter::Uniform(0.8), false).unwrap();
        let x = array![[[0.5, 0.5], [0.5, 0.5]], [[0.5, 0.5], [0.5, 0.5]]];
        let beliefs = po.beliefs(&x);
        for row in beliefs.lanes(Axis(2)) {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
        // symmetric switching: stationary distribution uniform, belief = accuracy
        assert!((beliefs[[0, 0, 0]] - 0.9).abs() < 1e-9);
    }

    #[test]
    fn unobserved_observation_falls_back_to_likelihood() {
        let env = uncertain(1.0);
        let po = ObservationBase::new(&env, &AgentParameter::Uniform(0.8), false).unwrap();
        let beliefs = po.beliefs_from_statdist(&array![1.0, 0.0]);
        // observation 1 never happens under δ = (1, 0)
        assert_eq!(beliefs[[0, 1, 1]], 1.0);
        assert_eq!(beliefs[[0, 1, 0]], 0.0);
    }
}
