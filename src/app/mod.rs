//! Application layer with dependency injection container.
//!
//! The container owns infrastructure dependencies and wires configured
//! environments to learning dynamics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           Application Layer (app)           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │       App (DI container)             │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ owns                       │
//! │                 ▼                            │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Infrastructure (adapters)           │   │
//! │  │  - MsgPackRepository                 │   │
//! │  │  - InMemoryRepository (testing)      │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ implements                 │
//! │                 ▼                            │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Ports (ports)                │   │
//! │  │  - Environment, LearningDynamics     │   │
//! │  │  - Observer, RunRepository           │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ used by                    │
//! │                 ▼                            │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Logic                        │   │
//! │  │  - StrategyActorCritic               │   │
//! │  │  - POStrategyActorCritic             │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use crld::app::{App, EnvironmentSpec, ExperimentConfig, LearnerConfig, LearnerKind, RunSettings};
//! use crld::environments::SocialDilemmaPayoffs;
//!
//! let config = ExperimentConfig::new(
//!     EnvironmentSpec::SocialDilemma(SocialDilemmaPayoffs::new(1.0, 1.2, -0.5, 0.0)),
//!     LearnerConfig::new(LearnerKind::Strategy, 0.1, 0.9),
//! )
//! .with_run(RunSettings::default().with_max_steps(50));
//!
//! let run = App::new().run_experiment(&config, Vec::new())?;
//! assert!(run.trajectory.steps() <= 50);
//! # Ok::<(), crld::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::{
    EnvironmentSpec, ExperimentConfig, InitialPolicy, LearnerConfig, LearnerKind, RunSettings,
};
pub use container::{App, AppBuilder};
