//! Observer port - abstraction for watching learning runs
//!
//! This port defines the interface for observing learning steps,
//! allowing composable data collection without coupling the learning
//! loop to specific output formats or metrics.

use crate::{
    Result,
    pipeline::{RunSummary, StepMetrics},
    policy::Policy,
};

/// Observer trait for monitoring learning runs
///
/// Observers can be composed to collect different types of data:
/// - Progress bars for user feedback
/// - JSONL export for analysis
/// - In-memory metric histories for tests and plots
///
/// # Event Sequence
///
/// 1. `on_run_start(learner, max_steps)` - once at the beginning
/// 2. `on_step(metrics, policy)` - after every learning step
/// 3. `on_run_end(summary)` - once at the end
///
/// # Examples
///
/// ```no_run
/// use crld::{pipeline::StepMetrics, policy::Policy, ports::Observer};
///
/// struct StepCounter {
///     steps: usize,
/// }
///
/// impl Observer for StepCounter {
///     fn on_step(&mut self, _metrics: &StepMetrics, _policy: &Policy) -> crld::Result<()> {
///         self.steps += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when a run starts.
    ///
    /// # Parameters
    ///
    /// * `learner` - Name of the learning dynamics
    /// * `max_steps` - Upper bound on the number of steps
    fn on_run_start(&mut self, _learner: &str, _max_steps: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each learning step with the new joint policy.
    fn on_step(&mut self, _metrics: &StepMetrics, _policy: &Policy) -> Result<()> {
        Ok(())
    }

    /// Called when the run ends, converged or not.
    fn on_run_end(&mut self, _summary: &RunSummary) -> Result<()> {
        Ok(())
    }
}
