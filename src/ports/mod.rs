//! Ports (trait boundaries) for external dependencies.
//!
//! This module defines the interfaces between the domain layer and infrastructure.
//! Environments supply tensors, learning dynamics consume them, observers watch
//! runs and repositories persist them.

pub mod dynamics;
pub mod environment;
pub mod observer;
pub mod repository;

pub use dynamics::LearningDynamics;
pub use environment::Environment;
pub use observer::Observer;
pub use repository::RunRepository;
