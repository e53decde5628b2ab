//! Deterministic multi-agent learners
//!
//! [`base`] and [`po_base`] compute expected rewards and values from an
//! environment's tensors; [`strategy`] and [`po_strategy`] turn those into
//! actor-critic updates in policy space.

pub mod base;
pub mod po_base;
pub mod po_strategy;
pub mod strategy;

pub use base::{DynamicsBase, StateValuation};
pub use po_base::{ObservationBase, ObservationValuation};
pub use po_strategy::POStrategyActorCritic;
pub use strategy::{StrategyActorCritic, StrategyRates};
