//! Learning-run pipeline
//!
//! This module provides:
//! - A step-by-step driver for learning dynamics
//! - Observers recording what happens during a run
//! - The persistable record of a finished run

pub mod observers;
pub mod record;
pub mod run;

pub use observers::{JsonlObserver, MetricsObserver, ProgressObserver, StepRecord};
pub use record::{RunParameters, SavedRun};
pub use run::{LearningRun, RunResult, RunSummary, StepMetrics};

pub use crate::ports::Observer;
