//! Observer implementations for learning runs
//!
//! Observers allow composable data collection during a run without coupling
//! the learning loop to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::run::{RunSummary, StepMetrics};
use crate::{Result, policy::Policy, ports::Observer};

/// Progress bar observer - Shows run progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self { progress_bar: None }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn format_rewards(rewards: &[f64]) -> String {
    rewards
        .iter()
        .map(|r| format!("{r:.3}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Observer for ProgressObserver {
    fn on_run_start(&mut self, _learner: &str, max_steps: usize) -> Result<()> {
        let pb = ProgressBar::new(max_steps as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} steps (R: {msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_step(&mut self, metrics: &StepMetrics, _policy: &Policy) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(metrics.step as u64);
            pb.set_message(format_rewards(&metrics.average_rewards));
        }
        Ok(())
    }

    fn on_run_end(&mut self, summary: &RunSummary) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            let status = if summary.converged {
                "converged"
            } else {
                "stopped"
            };
            pb.finish_with_message(format!(
                "{} [{status}]",
                format_rewards(&summary.final_rewards)
            ));
        }
        Ok(())
    }
}

/// One line of the JSONL step log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(flatten)]
    pub metrics: StepMetrics,
    /// Policy after the step, `[agent][situation][action]`
    pub policy: Vec<Vec<Vec<f64>>>,
}

impl StepRecord {
    pub fn new(metrics: &StepMetrics, policy: &Policy) -> Self {
        let policy = policy
            .values()
            .outer_iter()
            .map(|agent| agent.outer_iter().map(|row| row.to_vec()).collect())
            .collect();
        Self {
            metrics: metrics.clone(),
            policy,
        }
    }
}

/// JSONL observer - Writes one JSON object per learning step
pub struct JsonlObserver {
    writer: BufWriter<File>,
    include_policy: bool,
}

impl JsonlObserver {
    /// Create a new JSONL observer writing to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            include_policy: true,
        })
    }

    /// Only write metrics, not the full policy
    pub fn metrics_only(mut self) -> Self {
        self.include_policy = false;
        self
    }
}

impl Observer for JsonlObserver {
    fn on_step(&mut self, metrics: &StepMetrics, policy: &Policy) -> Result<()> {
        if self.include_policy {
            serde_json::to_writer(&mut self.writer, &StepRecord::new(metrics, policy))?;
        } else {
            serde_json::to_writer(&mut self.writer, metrics)?;
        }
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_run_end(&mut self, _summary: &RunSummary) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Metrics observer - Keeps the step metrics in memory
///
/// The history is shared, so a clone of the handle returned by
/// [`MetricsObserver::history`] stays readable after the observer has been
/// moved into a run.
#[derive(Clone, Default)]
pub struct MetricsObserver {
    history: Arc<Mutex<Vec<StepMetrics>>>,
    summary: Arc<Mutex<Option<RunSummary>>>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all step metrics recorded so far
    pub fn history(&self) -> Vec<StepMetrics> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Summary of the finished run, if any
    pub fn summary(&self) -> Option<RunSummary> {
        self.summary.lock().ok().and_then(|summary| summary.clone())
    }

    /// Average rewards of `agent` at every recorded step
    pub fn reward_series(&self, agent: usize) -> Vec<f64> {
        self.history()
            .iter()
            .filter_map(|m| m.average_rewards.get(agent).copied())
            .collect()
    }
}

impl Observer for MetricsObserver {
    fn on_run_start(&mut self, _learner: &str, _max_steps: usize) -> Result<()> {
        if let Ok(mut history) = self.history.lock() {
            history.clear();
        }
        Ok(())
    }

    fn on_step(&mut self, metrics: &StepMetrics, _policy: &Policy) -> Result<()> {
        if let Ok(mut history) = self.history.lock() {
            history.push(metrics.clone());
        }
        Ok(())
    }

    fn on_run_end(&mut self, summary: &RunSummary) -> Result<()> {
        if let Ok(mut slot) = self.summary.lock() {
            *slot = Some(summary.clone());
        }
        Ok(())
    }
}
