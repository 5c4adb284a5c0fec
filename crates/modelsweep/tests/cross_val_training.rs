use std::fs;
use std::path::Path;

use modelsweep::config::SweepConfig;
use modelsweep::io::read_table;
use modelsweep::preprocessing::encode_categoricals;
use modelsweep::sweep::{run, ModelStatus};
use modelsweep::target::resolve;
use modelsweep::trainer::CrossValTrainer;
use tempfile::tempdir;

/// y = 2 * x + group offset, with a categorical cell line column.
fn write_dataset(path: &Path) {
    let mut text = String::from("AUC\tCELL\tX\tNOISE\n");
    for i in 0..30 {
        let cell = ["A549", "HeLa", "MCF7"][i % 3];
        let x = i as f64 / 3.0;
        let offset = (i % 3) as f64;
        let noise = if i % 7 == 0 { "NA".to_string() } else { format!("{}", (i % 5) as f64 * 0.01) };
        text.push_str(&format!("{}\t{}\t{}\t{}\n", 2.0 * x + offset, cell, x, noise));
    }
    fs::write(path, text).unwrap();
}

#[test]
fn regression_sweep_writes_artifacts() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("train.tsv");
    write_dataset(&data);

    let mut table = read_table(&data).unwrap();
    assert_eq!(encode_categoricals(&mut table), vec!["CELL"]);

    let config = SweepConfig {
        data: data.clone(),
        ycol: "AUC".into(),
        models: vec!["Linear".into(), "KNN".into(), "AdaBoost".into()],
        threads: 2,
        out_dir: dir.path().join("out"),
        ..SweepConfig::default()
    };
    let resolved = resolve(&table, &config.target(), false, 0, None, config.cv).unwrap();
    let statuses = run(&table, &resolved, &config, &mut CrossValTrainer::new()).unwrap();
    assert!(statuses.iter().all(|(_, s)| *s == ModelStatus::Completed));

    for model in ["Linear", "KNN", "AdaBoost"] {
        let predictions = dir.path().join(format!("out/train.tsv.{}.predictions.tsv", model));
        let lines = fs::read_to_string(&predictions).unwrap();
        // header plus one line per row
        assert_eq!(lines.lines().count(), 31);
        assert!(lines.starts_with("row\tfold\tobserved\tpredicted"));

        let metrics = dir.path().join(format!("out/train.tsv.{}.metrics.json", model));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&metrics).unwrap()).unwrap();
        assert_eq!(json["task"], "regression");
        assert_eq!(json["per_fold"].as_array().unwrap().len(), 3);
        assert_eq!(json["target"]["name"], "AUC");
        assert_eq!(json["target"]["rows"], 30);
    }

    let linear: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("out/train.tsv.Linear.metrics.json")).unwrap(),
    )
    .unwrap();
    assert!(linear["overall"]["r2"].as_f64().unwrap() > 0.9);
}

#[test]
fn grouped_classification_sweep() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("train.tsv");
    write_dataset(&data);

    let mut table = read_table(&data).unwrap();
    encode_categoricals(&mut table);

    let config = SweepConfig {
        data: data.clone(),
        ycol: "0".into(),
        classify: true,
        cutoffs: Some(vec![10.0]),
        models: vec!["Logistic".into(), "Bayes".into(), "SVM".into(), "AdaBoost".into()],
        groupcols: vec!["CELL".into()],
        out_dir: dir.path().join("out"),
        prefix: Some("grouped".into()),
        ..SweepConfig::default()
    };
    let resolved = resolve(&table, &config.target(), true, 0, config.cutoffs(), config.cv).unwrap();
    run(&table, &resolved, &config, &mut CrossValTrainer::new()).unwrap();

    let metrics: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("out/grouped.Logistic.metrics.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(metrics["task"], "classification");
    assert_eq!(metrics["features"], serde_json::json!(["X", "NOISE"]));
    assert_eq!(metrics["target"]["bin_counts"].as_array().unwrap().len(), 2);
    assert_eq!(metrics["target"]["good_bins"], 2);
    for model in ["Bayes", "SVM", "AdaBoost"] {
        assert!(dir.path().join(format!("out/grouped.{}.predictions.tsv", model)).exists());
    }
}

#[test]
fn regression_only_model_fails_in_classification() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("train.tsv");
    write_dataset(&data);
    let mut table = read_table(&data).unwrap();
    encode_categoricals(&mut table);

    let config = SweepConfig {
        data,
        classify: true,
        cutoffs: Some(vec![10.0]),
        models: vec!["Lasso".into()],
        out_dir: dir.path().join("out"),
        ..SweepConfig::default()
    };
    let resolved = resolve(&table, &config.target(), true, 0, config.cutoffs(), config.cv).unwrap();
    assert!(run(&table, &resolved, &config, &mut CrossValTrainer::new()).is_err());
}
