//! CSV export for learning trajectories

use std::{fs::File, io::Write, path::Path};

use serde::Serialize;

use crate::{Result, pipeline::StepMetrics, trajectory::Trajectory};

/// A single row of the policy CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRecord {
    pub step: usize,
    pub agent: usize,
    /// State or observation index, depending on the learner
    pub situation: usize,
    pub action: usize,
    pub probability: f64,
}

/// A single row of the metrics CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub step: usize,
    pub agent: usize,
    pub average_reward: f64,
    pub policy_change: f64,
    pub mean_entropy: f64,
}

/// Exporter for trajectory CSV files
pub struct TrajectoryCsvExporter;

impl TrajectoryCsvExporter {
    /// Flatten a trajectory into one record per step/agent/situation/action.
    ///
    /// Step 0 is the initial policy.
    pub fn policy_records(trajectory: &Trajectory) -> impl Iterator<Item = PolicyRecord> + '_ {
        trajectory
            .policies
            .iter()
            .enumerate()
            .flat_map(|(step, policy)| {
                policy
                    .values()
                    .indexed_iter()
                    .map(move |((agent, situation, action), &probability)| PolicyRecord {
                        step,
                        agent,
                        situation,
                        action,
                        probability,
                    })
            })
    }

    /// Flatten step metrics into one record per step and agent.
    pub fn metrics_records(metrics: &[StepMetrics]) -> impl Iterator<Item = MetricsRecord> + '_ {
        metrics.iter().flat_map(|m| {
            m.average_rewards
                .iter()
                .zip(&m.mean_entropy)
                .enumerate()
                .map(move |(agent, (&average_reward, &mean_entropy))| MetricsRecord {
                    step: m.step,
                    agent,
                    average_reward,
                    policy_change: m.policy_change,
                    mean_entropy,
                })
        })
    }

    /// Write the policy records of `trajectory` to `writer`.
    ///
    /// Returns the number of rows written, excluding the header.
    pub fn write_policies<W: Write>(trajectory: &Trajectory, writer: W) -> Result<usize> {
        Self::write_records(Self::policy_records(trajectory), writer)
    }

    /// Write the metrics records to `writer`.
    pub fn write_metrics<W: Write>(metrics: &[StepMetrics], writer: W) -> Result<usize> {
        Self::write_records(Self::metrics_records(metrics), writer)
    }

    /// Export the policy trajectory to a CSV file.
    pub fn export(trajectory: &Trajectory, path: &Path) -> Result<usize> {
        Self::write_policies(trajectory, File::create(path)?)
    }

    /// Export the step metrics to a CSV file.
    pub fn export_metrics(metrics: &[StepMetrics], path: &Path) -> Result<usize> {
        Self::write_metrics(metrics, File::create(path)?)
    }

    fn write_records<W, R>(records: impl Iterator<Item = R>, writer: W) -> Result<usize>
    where
        W: Write,
        R: Serialize,
    {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut count = 0;
        for record in records {
            csv_writer.serialize(record)?;
            count += 1;
        }
        csv_writer.flush()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::policy::Policy;

    fn trajectory() -> Trajectory {
        let first = Policy::uniform(2, 1, 2);
        let second = Policy::new(array![[[0.25, 0.75]], [[1.0, 0.0]]]).unwrap();
        Trajectory {
            policies: vec![first, second],
            converged: false,
        }
    }

    #[test]
    fn policy_export_has_one_row_per_entry() {
        let mut buffer = Vec::new();
        let rows = TrajectoryCsvExporter::write_policies(&trajectory(), &mut buffer).unwrap();
        assert_eq!(rows, 2 * 2 * 2);

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("step,agent,situation,action,probability")
        );
        assert_eq!(lines.next(), Some("0,0,0,0,0.5"));
        assert!(text.lines().any(|l| l == "1,0,0,1,0.75"));
        assert!(text.lines().any(|l| l == "1,1,0,1,0.0"));
    }

    #[test]
    fn metrics_export_has_one_row_per_agent_and_step() {
        let metrics = vec![StepMetrics {
            step: 1,
            average_rewards: vec![1.0, -0.5],
            policy_change: 0.1,
            mean_entropy: vec![0.6, 0.4],
        }];
        let records: Vec<_> = TrajectoryCsvExporter::metrics_records(&metrics).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].agent, 1);
        assert_eq!(records[1].average_reward, -0.5);
        assert_eq!(records[1].mean_entropy, 0.4);
    }

    #[test]
    fn export_writes_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("trajectory.csv");
        let rows = TrajectoryCsvExporter::export(&trajectory(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), rows + 1);
    }
}
