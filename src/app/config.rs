//! Configuration types for experiments.
//!
//! An experiment is an environment, a learner and run settings. All three
//! deserialize from JSON and have builder-style constructors for library use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    environments::{
        EcologicalPublicGood, RiskReward, SocialDilemma, SocialDilemmaPayoffs, TensorEnvironment,
        UncertainSocialDilemma, public_good::PublicGoodParams, risk_reward::RiskRewardParams,
        tensor::EnvironmentTensors, uncertain::UncertainDilemmaParams,
    },
    parameters::AgentParameter,
    ports::Environment,
    trajectory::TrajectoryConfig,
};

/// Environment to learn in.
///
/// # Examples
///
/// ```
/// use crld::app::EnvironmentSpec;
///
/// let spec: EnvironmentSpec = serde_json::from_str(
///     r#"{"kind": "social_dilemma", "reward": 1.0, "temptation": 1.2, "sucker": -0.5, "punishment": 0.0}"#,
/// )?;
/// let env = spec.build()?;
/// assert_eq!(env.n_agents(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvironmentSpec {
    SocialDilemma(SocialDilemmaPayoffs),
    EcologicalPublicGood(PublicGoodParams),
    RiskReward(RiskRewardParams),
    UncertainSocialDilemma(UncertainDilemmaParams),
    Tensors {
        id: String,
        tensors: EnvironmentTensors,
    },
}

impl EnvironmentSpec {
    /// Construct the environment this spec describes.
    pub fn build(&self) -> Result<Box<dyn Environment>> {
        Ok(match self {
            Self::SocialDilemma(payoffs) => Box::new(SocialDilemma::from_payoffs(*payoffs)),
            Self::EcologicalPublicGood(params) => Box::new(EcologicalPublicGood::new(*params)?),
            Self::RiskReward(params) => Box::new(RiskReward::new(*params)?),
            Self::UncertainSocialDilemma(params) => {
                Box::new(UncertainSocialDilemma::new(*params)?)
            }
            Self::Tensors { id, tensors } => {
                Box::new(TensorEnvironment::new(id.clone(), tensors.clone())?)
            }
        })
    }
}

/// Which learning dynamics to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerKind {
    /// Fully observable strategy actor-critic
    Strategy,
    /// Partially observable strategy actor-critic
    PoStrategy,
}

fn default_choice_intensities() -> AgentParameter {
    AgentParameter::Uniform(1.0)
}

/// Configuration for creating learning dynamics.
///
/// # Examples
///
/// ```
/// use crld::app::{LearnerConfig, LearnerKind};
/// use crld::parameters::AgentParameter;
///
/// let config = LearnerConfig::new(LearnerKind::PoStrategy, 0.1, 0.9)
///     .with_choice_intensities(AgentParameter::PerAgent(vec![1.0, 2.0]))
///     .with_prefactor(true);
/// assert!(config.use_prefactor);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    pub kind: LearnerKind,
    pub learning_rates: AgentParameter,
    pub discount_factors: AgentParameter,
    /// Softmax inverse temperatures (default 1 for every agent)
    #[serde(default = "default_choice_intensities")]
    pub choice_intensities: AgentParameter,
    /// Scale values by `1 - γ`
    #[serde(default)]
    pub use_prefactor: bool,
}

impl LearnerConfig {
    /// Create a learner configuration with uniform rates.
    ///
    /// Uses choice intensity 1 and no value prefactor.
    pub fn new(kind: LearnerKind, learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            kind,
            learning_rates: AgentParameter::Uniform(learning_rate),
            discount_factors: AgentParameter::Uniform(discount_factor),
            choice_intensities: default_choice_intensities(),
            use_prefactor: false,
        }
    }

    pub fn with_learning_rates(mut self, learning_rates: AgentParameter) -> Self {
        self.learning_rates = learning_rates;
        self
    }

    pub fn with_discount_factors(mut self, discount_factors: AgentParameter) -> Self {
        self.discount_factors = discount_factors;
        self
    }

    pub fn with_choice_intensities(mut self, choice_intensities: AgentParameter) -> Self {
        self.choice_intensities = choice_intensities;
        self
    }

    pub fn with_prefactor(mut self, use_prefactor: bool) -> Self {
        self.use_prefactor = use_prefactor;
        self
    }
}

/// How the initial joint policy is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialPolicy {
    /// Every action equally likely
    #[default]
    Uniform,
    /// Rows drawn from a flat Dirichlet distribution
    Random,
}

fn default_max_steps() -> usize {
    TrajectoryConfig::default().max_steps
}

fn default_tolerance() -> Option<f64> {
    TrajectoryConfig::default().tolerance
}

/// Stopping rule, seed and initial policy of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// `null` disables the convergence check
    #[serde(default = "default_tolerance")]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub initial_policy: InitialPolicy,
}

impl RunSettings {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_initial_policy(mut self, initial_policy: InitialPolicy) -> Self {
        self.initial_policy = initial_policy;
        self
    }

    pub fn trajectory_config(&self) -> TrajectoryConfig {
        TrajectoryConfig {
            max_steps: self.max_steps,
            tolerance: self.tolerance,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            tolerance: default_tolerance(),
            seed: None,
            initial_policy: InitialPolicy::default(),
        }
    }
}

/// A complete experiment as read from a JSON config file.
///
/// ```json
/// {
///   "environment": {"kind": "uncertain_social_dilemma", "game_a": {...}, ...},
///   "learner": {"kind": "po_strategy", "learning_rates": 0.05, "discount_factors": [0.9, 0.8]},
///   "run": {"max_steps": 2000, "tolerance": 1e-6, "seed": 7, "initial_policy": "random"}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub environment: EnvironmentSpec,
    pub learner: LearnerConfig,
    #[serde(default)]
    pub run: RunSettings,
}

impl ExperimentConfig {
    pub fn new(environment: EnvironmentSpec, learner: LearnerConfig) -> Self {
        Self {
            environment,
            learner,
            run: RunSettings::default(),
        }
    }

    pub fn with_run(mut self, run: RunSettings) -> Self {
        self.run = run;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {path:?}"),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check run settings that deserialization alone cannot.
    ///
    /// Learner parameters are range-checked when the learner is built.
    pub fn validate(&self) -> Result<()> {
        if self.run.max_steps == 0 {
            return Err(Error::InvalidConfiguration {
                message: "run.max_steps must be at least 1".to_string(),
            });
        }
        if let Some(tolerance) = self.run.tolerance
            && !(tolerance.is_finite() && tolerance > 0.0)
        {
            return Err(Error::InvalidConfiguration {
                message: format!("run.tolerance must be positive and finite, got {tolerance}"),
            });
        }
        Ok(())
    }
}
