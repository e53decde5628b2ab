//! Dependency injection container for experiments.
//!
//! The container owns infrastructure dependencies (the run repository and the
//! default seed) and provides factory methods for environments and learners.

use std::{path::Path, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};
use tracing::info;

use super::config::{ExperimentConfig, InitialPolicy, LearnerConfig, LearnerKind};
use crate::{
    Result,
    adapters::MsgPackRepository,
    agents::{POStrategyActorCritic, StrategyActorCritic},
    parameters::make_variable_vector,
    pipeline::{LearningRun, RunParameters, SavedRun},
    ports::{Environment, LearningDynamics, Observer, RunRepository},
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```no_run
/// use crld::app::{App, ExperimentConfig};
/// use std::path::Path;
///
/// let app = App::new();
/// let config = ExperimentConfig::from_file(Path::new("experiment.json"))?;
/// let run = app.run_experiment(&config, Vec::new())?;
/// app.save_run(&run, Path::new("run.msgpack"))?;
/// # Ok::<(), crld::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use crld::app::App;
/// use crld::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    /// Repository for run persistence
    run_repository: Arc<dyn RunRepository + Send + Sync>,
    /// Seed for random initial policies when the config has none
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults.
    ///
    /// Uses `MsgPackRepository` for persistence and no default seed.
    pub fn new() -> Self {
        Self {
            run_repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Get the run repository.
    pub fn run_repository(&self) -> Arc<dyn RunRepository + Send + Sync> {
        Arc::clone(&self.run_repository)
    }

    /// Create learning dynamics for `env` as described by `config`.
    pub fn create_learner(
        &self,
        env: &dyn Environment,
        config: &LearnerConfig,
    ) -> Result<Box<dyn LearningDynamics>> {
        Ok(match config.kind {
            LearnerKind::Strategy => Box::new(StrategyActorCritic::with_prefactor(
                env,
                &config.learning_rates,
                &config.discount_factors,
                &config.choice_intensities,
                config.use_prefactor,
            )?),
            LearnerKind::PoStrategy => Box::new(POStrategyActorCritic::with_prefactor(
                env,
                &config.learning_rates,
                &config.discount_factors,
                &config.choice_intensities,
                config.use_prefactor,
            )?),
        })
    }

    /// Build the environment and learner of `config` and run it to the end.
    ///
    /// Random initial policies use the config's seed, then the app's default
    /// seed, then fresh entropy. The seed actually used is recorded.
    pub fn run_experiment(
        &self,
        config: &ExperimentConfig,
        observers: Vec<Box<dyn Observer>>,
    ) -> Result<SavedRun> {
        config.validate()?;
        let env = config.environment.build()?;
        let learner = self.create_learner(env.as_ref(), &config.learner)?;

        let (initial, seed) = match config.run.initial_policy {
            InitialPolicy::Uniform => (learner.zero_intelligence_policy(), None),
            InitialPolicy::Random => {
                let seed = config
                    .run
                    .seed
                    .or(self.default_seed)
                    .unwrap_or_else(rand::random);
                let mut rng = StdRng::seed_from_u64(seed);
                (learner.random_policy(&mut rng), Some(seed))
            }
        };

        info!(
            env = %env.id(),
            learner = learner.name(),
            max_steps = config.run.max_steps,
            "starting experiment"
        );

        let mut run = observers
            .into_iter()
            .fold(LearningRun::new(config.run.trajectory_config()), |run, observer| {
                run.with_observer(observer)
            });
        let result = run.run(learner.as_ref(), &env.id(), initial)?;

        let parameters = RunParameters {
            learning_rates: make_variable_vector(
                "learning_rates",
                &config.learner.learning_rates,
                env.n_agents(),
            )?
            .to_vec(),
            discount_factors: make_variable_vector(
                "discount_factors",
                &config.learner.discount_factors,
                env.n_agents(),
            )?
            .to_vec(),
            choice_intensities: make_variable_vector(
                "choice_intensities",
                &config.learner.choice_intensities,
                env.n_agents(),
            )?
            .to_vec(),
            use_prefactor: config.learner.use_prefactor,
        };

        let situation_labels = match config.learner.kind {
            LearnerKind::Strategy => env.state_labels(),
            LearnerKind::PoStrategy => env.observation_labels(),
        };
        Ok(SavedRun::from_result(result, parameters, seed)
            .with_labels(situation_labels, env.action_labels()))
    }

    /// Load a run from persistent storage.
    pub fn load_run(&self, path: &Path) -> Result<SavedRun> {
        self.run_repository.load(path)
    }

    /// Save a run to persistent storage.
    pub fn save_run(&self, run: &SavedRun, path: &Path) -> Result<()> {
        self.run_repository.save(run, path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
///
/// # Examples
///
/// ```
/// use crld::app::AppBuilder;
/// use crld::adapters::InMemoryRepository;
///
/// let app = AppBuilder::new()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct AppBuilder {
    run_repository: Option<Arc<dyn RunRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    /// Create a new app builder.
    pub fn new() -> Self {
        Self {
            run_repository: None,
            default_seed: None,
        }
    }

    /// Set a custom run repository.
    pub fn with_repository<R: RunRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.run_repository = Some(Arc::new(repo));
        self
    }

    /// Set a default seed for random initial policies.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app with the configured dependencies.
    ///
    /// If no repository was specified, uses `MsgPackRepository` by default.
    pub fn build(self) -> App {
        App {
            run_repository: self
                .run_repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Error,
        adapters::InMemoryRepository,
        app::config::{EnvironmentSpec, RunSettings},
        environments::{
            SocialDilemmaPayoffs, public_good::PublicGoodParams, uncertain::UncertainDilemmaParams,
        },
    };

    fn uncertain_dilemma() -> EnvironmentSpec {
        EnvironmentSpec::UncertainSocialDilemma(UncertainDilemmaParams {
            game_a: SocialDilemmaPayoffs::new(3.0, 5.0, 0.0, 1.0),
            game_b: SocialDilemmaPayoffs::new(5.0, 3.0, 0.0, 1.0),
            switch_prob: 0.1,
            accuracy: 0.8,
        })
    }

    #[test]
    fn test_app_runs_a_partially_observable_experiment() {
        let app = App::new();
        let config = ExperimentConfig::new(
            uncertain_dilemma(),
            LearnerConfig::new(LearnerKind::PoStrategy, 0.1, 0.9),
        )
        .with_run(RunSettings::default().with_max_steps(20));

        let run = app.run_experiment(&config, Vec::new()).unwrap();
        assert_eq!(run.learner, "POStrategyActorCritic");
        assert_eq!(run.trajectory.policies[0].n_situations(), 2);
        assert_eq!(run.parameters.discount_factors, vec![0.9, 0.9]);
        assert_eq!(run.seed, None);
        assert_eq!(run.situation_labels, vec!["A", "B"]);
        assert_eq!(run.action_labels, vec!["c", "d"]);
    }

    #[test]
    fn test_app_applies_default_seed() {
        let app = App::for_testing().with_default_seed(42).build();
        let config = ExperimentConfig::new(
            uncertain_dilemma(),
            LearnerConfig::new(LearnerKind::PoStrategy, 0.1, 0.9),
        )
        .with_run(
            RunSettings::default()
                .with_max_steps(5)
                .with_initial_policy(InitialPolicy::Random),
        );

        let first = app.run_experiment(&config, Vec::new()).unwrap();
        let second = app.run_experiment(&config, Vec::new()).unwrap();
        assert_eq!(first.seed, Some(42));
        assert_eq!(first.trajectory, second.trajectory);
    }

    #[test]
    fn test_config_seed_overrides_default_seed() {
        let app = App::for_testing().with_default_seed(42).build();
        let config = ExperimentConfig::new(
            uncertain_dilemma(),
            LearnerConfig::new(LearnerKind::PoStrategy, 0.1, 0.9),
        )
        .with_run(
            RunSettings::default()
                .with_max_steps(5)
                .with_seed(7)
                .with_initial_policy(InitialPolicy::Random),
        );
        assert_eq!(app.run_experiment(&config, Vec::new()).unwrap().seed, Some(7));
    }

    #[test]
    fn test_po_learner_rejects_final_states() {
        let app = App::new();
        let tensors = crate::environments::tensor::EnvironmentTensors {
            n_agents: 1,
            n_actions: 1,
            transitions: ndarray::Array3::from_elem((2, 1, 2), 0.5),
            rewards: ndarray::Array4::zeros((1, 2, 1, 2)),
            observations: None,
            final_states: Some(ndarray::array![0.0, 1.0]),
        };
        let env = EnvironmentSpec::Tensors {
            id: "terminal".to_string(),
            tensors,
        }
        .build()
        .unwrap();

        let po = LearnerConfig::new(LearnerKind::PoStrategy, 0.1, 0.9);
        assert!(matches!(
            app.create_learner(env.as_ref(), &po),
            Err(Error::FinalStatesUnsupported)
        ));
        let full = LearnerConfig::new(LearnerKind::Strategy, 0.1, 0.9);
        assert!(app.create_learner(env.as_ref(), &full).is_ok());
    }

    #[test]
    fn test_save_and_load_through_injected_repository() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing().with_repository(repo.clone()).build();
        let config = ExperimentConfig::new(
            EnvironmentSpec::EcologicalPublicGood(PublicGoodParams {
                n_agents: 2,
                synergy: 1.2,
                cost: 5.0,
                collapse_impact: -5.0,
                collapse_prob: 0.02,
                recovery_prob: 0.0001,
                degraded_choice: false,
            }),
            LearnerConfig::new(LearnerKind::Strategy, 0.05, 0.99),
        )
        .with_run(RunSettings::default().with_max_steps(10));

        let run = app.run_experiment(&config, Vec::new()).unwrap();
        app.save_run(&run, Path::new("ecopg")).unwrap();
        assert!(repo.contains(Path::new("ecopg")));
        assert_eq!(app.load_run(Path::new("ecopg")).unwrap(), run);
    }

    #[test]
    fn test_oversized_public_good_fails_without_panicking() {
        let json = r#"{
            "environment": {"kind": "ecological_public_good", "n_agents": 64, "synergy": 1.2,
                            "cost": 5.0, "collapse_impact": -5.0, "collapse_prob": 0.02,
                            "recovery_prob": 0.0001},
            "learner": {"kind": "strategy", "learning_rates": 0.1, "discount_factors": 0.9}
        }"#;
        let config = ExperimentConfig::from_json(json).unwrap();
        assert!(matches!(
            App::new().run_experiment(&config, Vec::new()),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
