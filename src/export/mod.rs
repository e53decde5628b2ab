//! Export functionality for analysis
//!
//! Trajectories and per-step metrics are written as long-format CSV so they
//! load directly into data-frame tools.

mod trajectory_csv;

pub use trajectory_csv::{MetricsRecord, PolicyRecord, TrajectoryCsvExporter};
