//! End-to-end experiment tests: config, run, persistence and export

use std::{fs, path::Path};

use crld::{
    adapters::{InMemoryRepository, MsgPackRepository},
    app::{App, ExperimentConfig, InitialPolicy, LearnerKind},
    cli::commands::{
        describe::{self, DescribeArgs},
        inspect::{self, InspectArgs},
        run::{RunArgs, execute},
    },
    pipeline::{MetricsObserver, StepRecord},
    ports::{Observer, RunRepository},
};
use tempfile::TempDir;

const UNCERTAIN_CONFIG: &str = r#"{
    "environment": {
        "kind": "uncertain_social_dilemma",
        "game_a": {"reward": 3.0, "temptation": 5.0, "sucker": 0.0, "punishment": 1.0},
        "game_b": {"reward": 5.0, "temptation": 3.0, "sucker": 0.0, "punishment": 1.0},
        "switch_prob": 0.1,
        "accuracy": 0.8
    },
    "learner": {
        "kind": "po_strategy",
        "learning_rates": 0.1,
        "discount_factors": [0.9, 0.8],
        "choice_intensities": 2.0
    },
    "run": {"max_steps": 25, "tolerance": null, "seed": 11, "initial_policy": "random"}
}"#;

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("experiment.json");
    fs::write(&path, UNCERTAIN_CONFIG).unwrap();
    path
}

#[test]
fn test_config_file_round_trip_through_app() {
    let dir = TempDir::new().unwrap();
    let config = ExperimentConfig::from_file(&write_config(dir.path())).unwrap();
    assert_eq!(config.learner.kind, LearnerKind::PoStrategy);
    assert_eq!(config.run.initial_policy, InitialPolicy::Random);

    let metrics = MetricsObserver::new();
    let observers: Vec<Box<dyn Observer>> = vec![Box::new(metrics.clone())];
    let app = App::for_testing()
        .with_repository(InMemoryRepository::new())
        .build();
    let run = app.run_experiment(&config, observers).unwrap();

    // Without a tolerance the full budget is used.
    assert_eq!(run.summary.steps, 25);
    assert!(!run.summary.converged);
    assert_eq!(run.seed, Some(11));
    assert_eq!(run.parameters.discount_factors, vec![0.9, 0.8]);
    assert_eq!(run.parameters.choice_intensities, vec![2.0, 2.0]);
    assert_eq!(metrics.history().len(), 25);
    assert_eq!(metrics.history(), run.metrics);

    app.save_run(&run, Path::new("uncertain")).unwrap();
    assert_eq!(app.load_run(Path::new("uncertain")).unwrap(), run);
}

#[test]
fn test_same_seed_reproduces_the_run() {
    let config = ExperimentConfig::from_json(UNCERTAIN_CONFIG).unwrap();
    let app = App::new();
    let first = app.run_experiment(&config, Vec::new()).unwrap();
    let second = app.run_experiment(&config, Vec::new()).unwrap();
    assert_eq!(first.trajectory, second.trajectory);
}

#[test]
fn test_run_command_writes_all_outputs() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("run.msgpack");
    let jsonl = dir.path().join("steps.jsonl");
    let csv = dir.path().join("trajectory.csv");
    let metrics_csv = dir.path().join("metrics.csv");

    execute(RunArgs {
        config: write_config(dir.path()),
        output: Some(output.clone()),
        jsonl: Some(jsonl.clone()),
        csv: Some(csv.clone()),
        metrics_csv: Some(metrics_csv.clone()),
        seed: None,
        quiet: true,
    })
    .unwrap();

    let run = MsgPackRepository::new().load(&output).unwrap();
    assert_eq!(run.learner, "POStrategyActorCritic");
    assert_eq!(run.trajectory.steps(), 25);
    assert_eq!(run.situation_labels, vec!["A", "B"]);
    assert_eq!(run.action_labels, vec!["c", "d"]);

    let steps: Vec<StepRecord> = fs::read_to_string(&jsonl)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(steps.len(), 25);
    assert_eq!(steps[24].metrics.step, 25);

    // 26 policies x 2 agents x 2 observations x 2 actions, plus header
    let csv_text = fs::read_to_string(&csv).unwrap();
    assert_eq!(csv_text.lines().count(), 26 * 8 + 1);
    assert!(csv_text.starts_with("step,agent,situation,action,probability"));

    // 25 steps x 2 agents, plus header
    assert_eq!(fs::read_to_string(&metrics_csv).unwrap().lines().count(), 51);
}

#[test]
fn test_run_command_seed_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("run.msgpack");

    execute(RunArgs {
        config: write_config(dir.path()),
        output: Some(output.clone()),
        jsonl: None,
        csv: None,
        metrics_csv: None,
        seed: Some(99),
        quiet: true,
    })
    .unwrap();

    assert_eq!(MsgPackRepository::new().load(&output).unwrap().seed, Some(99));
}

#[test]
fn test_run_command_reports_missing_config() {
    let dir = TempDir::new().unwrap();
    let result = execute(RunArgs {
        config: dir.path().join("missing.json"),
        output: None,
        jsonl: None,
        csv: None,
        metrics_csv: None,
        seed: None,
        quiet: true,
    });
    assert!(result.is_err());
}

#[test]
fn test_final_states_are_rejected_for_partial_observability() {
    let json = r#"{
        "environment": {
            "kind": "tensors",
            "id": "absorbing",
            "tensors": {
                "n_agents": 1,
                "n_actions": 2,
                "transitions": {"v": 1, "dim": [2, 2, 2], "data": [0.5, 0.5, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]},
                "rewards": {"v": 1, "dim": [1, 2, 2, 2], "data": [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]},
                "final_states": {"v": 1, "dim": [2], "data": [0.0, 1.0]}
            }
        },
        "learner": {"kind": "po_strategy", "learning_rates": 0.1, "discount_factors": 0.9}
    }"#;
    let config = ExperimentConfig::from_json(json).unwrap();
    let result = App::new().run_experiment(&config, Vec::new());
    assert!(matches!(result, Err(crld::Error::FinalStatesUnsupported)));
}

#[test]
fn test_describe_command_builds_the_configured_environment() {
    let dir = TempDir::new().unwrap();
    describe::execute(DescribeArgs {
        config: write_config(dir.path()),
    })
    .unwrap();

    let missing = describe::execute(DescribeArgs {
        config: dir.path().join("missing.json"),
    });
    assert!(missing.is_err());
}

#[test]
fn test_describe_command_rejects_oversized_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge.json");
    fs::write(
        &path,
        r#"{
            "environment": {"kind": "ecological_public_good", "n_agents": 64, "synergy": 1.2,
                            "cost": 5.0, "collapse_impact": -5.0, "collapse_prob": 0.02,
                            "recovery_prob": 0.0001},
            "learner": {"kind": "strategy", "learning_rates": 0.1, "discount_factors": 0.9}
        }"#,
    )
    .unwrap();
    assert!(describe::execute(DescribeArgs { config: path }).is_err());
}

#[test]
fn test_inspect_command_reads_a_saved_run() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("run.msgpack");
    execute(RunArgs {
        config: write_config(dir.path()),
        output: Some(output.clone()),
        jsonl: None,
        csv: None,
        metrics_csv: None,
        seed: None,
        quiet: true,
    })
    .unwrap();

    inspect::execute(InspectArgs {
        run: output.clone(),
        initial: true,
    })
    .unwrap();

    let missing = inspect::execute(InspectArgs {
        run: dir.path().join("missing.msgpack"),
        initial: false,
    });
    assert!(missing.is_err());
}
