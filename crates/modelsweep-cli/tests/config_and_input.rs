use std::fs;
use std::path::PathBuf;

use modelsweep::config::SweepConfig;
use modelsweep::data_handling::Table;
use modelsweep::sweep::{ModelStatus, RunParams, Trainer};
use modelsweep::target::ClassBins;
use modelsweep_cli::cli::build_cli;
use modelsweep_cli::sweep::input::{config_from_arguments, load_sweep_config};
use modelsweep_cli::sweep::runner::{execute, Outcome};
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    models: Vec<String>,
}

impl Trainer for Recorder {
    fn regress(&mut self, _: &Table, model: &str, _: &RunParams) -> anyhow::Result<()> {
        self.models.push(model.to_string());
        Ok(())
    }

    fn classify(&mut self, _: &Table, model: &str, _: &ClassBins, _: &RunParams) -> anyhow::Result<()> {
        self.models.push(model.to_string());
        Ok(())
    }
}

#[test]
fn flags_override_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("sweep.json");
    fs::write(
        &config_path,
        r#"{"data": "from_config.tsv", "models": ["KNN"], "cv": 5, "seed": 7}"#,
    )
    .unwrap();

    let matches = build_cli().get_matches_from([
        "modelsweep".into(),
        "--config".into(),
        config_path.clone().into_os_string(),
        "--cv".into(),
        "4".into(),
    ]);
    let config = config_from_arguments(&matches).unwrap();
    assert_eq!(config.data, PathBuf::from("from_config.tsv"));
    assert_eq!(config.models, vec!["KNN"]);
    assert_eq!(config.cv, 4);
    assert_eq!(config.seed, 7);
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("sweep.json");
    fs::write(&config_path, "{ not json").unwrap();
    assert!(load_sweep_config(&config_path).is_err());
}

#[test]
fn execute_encodes_and_dispatches() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("cells.tsv");
    fs::write(
        &data,
        "CELL\tAUC\nA\t0.1\nB\t0.2\nA\t0.3\nC\t0.9\nB\t0.8\nC\t0.7\n",
    )
    .unwrap();

    let config = SweepConfig {
        data,
        ycol: "AUC".into(),
        models: vec!["A".into(), "B".into()],
        ..SweepConfig::default()
    };
    let mut trainer = Recorder::default();
    let outcome = execute(&config, &mut trainer).unwrap();
    assert_eq!(
        outcome,
        Outcome::Completed(vec![
            ("A".into(), ModelStatus::Completed),
            ("B".into(), ModelStatus::Completed),
        ])
    );
    assert_eq!(trainer.models, vec!["A", "B"]);
}

#[test]
fn execute_reports_not_enough_classes() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("flat.tsv");
    fs::write(&data, "AUC\tX\n1\t1\n1\t2\n1\t3\n1\t4\n").unwrap();

    let config = SweepConfig {
        data,
        classify: true,
        models: vec!["KNN".into()],
        ..SweepConfig::default()
    };
    let mut trainer = Recorder::default();
    let outcome = execute(&config, &mut trainer).unwrap();
    assert_eq!(outcome, Outcome::NotEnoughClasses { good_bins: 1 });
    assert!(trainer.models.is_empty());
}

#[test]
fn execute_rejects_unknown_group_column() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("t.tsv");
    fs::write(&data, "AUC\tX\n1\t1\n2\t2\n3\t3\n").unwrap();

    let config = SweepConfig {
        data,
        groupcols: vec!["CELL".into()],
        ..SweepConfig::default()
    };
    let err = execute(&config, &mut Recorder::default()).unwrap_err();
    assert!(err.to_string().contains("CELL"));
}
