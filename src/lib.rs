//! Deterministic collective reinforcement-learning dynamics
//!
//! This crate provides:
//! - Multi-agent Markov environments given by their transition, reward,
//!   observation and final-state tensors
//! - Fully and partially observable strategy actor-critic learners that
//!   compute the expected (infinite-batch) learning update in closed form
//! - Trajectory computation, run observers, persistence and CSV export
//! - JSON experiment configs and the `crld` command-line tool

pub mod adapters;
pub mod agents;
pub mod app;
pub mod cli;
pub mod environments;
pub mod error;
pub mod export;
pub mod parameters;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod trajectory;
pub mod types;
pub mod utils;

pub use agents::{POStrategyActorCritic, StrategyActorCritic};
pub use error::{Error, Result};
pub use parameters::AgentParameter;
pub use policy::Policy;
pub use ports::{Environment, LearningDynamics};
pub use trajectory::{Trajectory, TrajectoryConfig};
