//! Cross-validated training and scoring behind the sweep.
//!
//! `CrossValTrainer` is the production `Trainer`: for one model it builds
//! the feature matrix, splits folds, fits one model per fold on a rayon
//! pool sized by the thread budget, and writes out-of-fold predictions and
//! metrics next to the sweep prefix.
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::cross_validation::{group_kfold, kfold, stratified_kfold, CvSplit};
use crate::data_handling::Table;
use crate::io::artifacts::{artifact_path, write_metrics, write_predictions, PredictionRecord};
use crate::math::Array2;
use crate::models::{build_classifier, build_regressor, ModelKind};
use crate::preprocessing::{fit_imputer, impute};
use crate::stats::{classification_metrics, regression_metrics};
use crate::sweep::{group_columns, RunParams, Trainer};
use crate::target::{ClassBins, TargetSummary};

#[derive(Debug, Serialize)]
struct MetricsReport<'a, M> {
    model: &'a str,
    task: &'static str,
    rows: usize,
    features: Vec<String>,
    folds: usize,
    created: String,
    target: &'a TargetSummary,
    overall: M,
    per_fold: Vec<M>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classes: Option<&'a ClassBins>,
}

/// Rows kept for modelling together with their features and folds.
struct Prepared {
    rows: Vec<usize>,
    x: Array2<f32>,
    features: Vec<String>,
    splits: Vec<CvSplit>,
}

/// Out-of-fold predictions of one fold.
struct FoldOutput<T> {
    fold: usize,
    test: Vec<usize>,
    predicted: Vec<T>,
}

/// Trainer fitting every model with k-fold cross-validation.
#[derive(Debug, Default, Clone)]
pub struct CrossValTrainer;

impl CrossValTrainer {
    pub fn new() -> Self {
        CrossValTrainer
    }
}

/// rayon treats 0 as "one thread per core".
fn pool_size(threads: i32) -> usize {
    if threads <= 0 {
        0
    } else {
        threads as usize
    }
}

fn parse_model(model: &str) -> Result<ModelKind> {
    ModelKind::from_str(model).map_err(anyhow::Error::msg)
}

fn target_values<'a>(table: &'a Table, params: &RunParams) -> Result<&'a [f64]> {
    table
        .column(params.target)
        .and_then(|c| c.as_numeric())
        .ok_or_else(|| anyhow!("Target column {} is missing or not numeric", params.target))
}

/// Select `rows`, build features without target and group columns, and
/// split folds. Classification labels switch on stratification.
fn prepare(
    table: &Table,
    params: &RunParams,
    rows: Vec<usize>,
    labels: Option<&[usize]>,
) -> Result<Prepared> {
    let groups = group_columns(table, &params.groupcols)?;
    let mut exclude = groups.clone();
    exclude.push(params.target);
    let (x_all, features) = table.feature_matrix(&exclude)?;
    if features.is_empty() {
        bail!("No feature columns left after removing target and group columns");
    }
    let x = x_all.select_rows(&rows);

    let splits = if !groups.is_empty() {
        let keys = table.group_keys(&groups);
        let keys: Vec<String> = rows.iter().map(|&r| keys[r].clone()).collect();
        group_kfold(&keys, params.cv)?
    } else if let Some(labels) = labels {
        stratified_kfold(labels, params.cv, params.seed)?
    } else {
        kfold(rows.len(), params.cv, params.seed)?
    };

    Ok(Prepared {
        rows,
        x,
        features,
        splits,
    })
}

/// Train and test matrices of one split, NaNs filled from training means.
fn fold_matrices(x: &Array2<f32>, split: &CvSplit) -> (Array2<f32>, Array2<f32>) {
    let train = x.select_rows(&split.train);
    let fill = fit_imputer(&train);
    (impute(&train, &fill), impute(&x.select_rows(&split.test), &fill))
}

fn run_folds<T, F>(threads: i32, splits: &[CvSplit], fit_fold: F) -> Result<Vec<FoldOutput<T>>>
where
    T: Send,
    F: Fn(&CvSplit) -> Result<Vec<T>> + Sync + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(pool_size(threads))
        .build()
        .context("Failed to build training thread pool")?;

    pool.install(|| {
        splits
            .par_iter()
            .map(|split| {
                let predicted = fit_fold(split)
                    .with_context(|| format!("Fold {} failed", split.fold + 1))?;
                Ok::<_, anyhow::Error>(FoldOutput {
                    fold: split.fold,
                    test: split.test.clone(),
                    predicted,
                })
            })
            .collect()
    })
}

impl Trainer for CrossValTrainer {
    fn regress(&mut self, table: &Table, model: &str, params: &RunParams) -> Result<()> {
        let kind = parse_model(model)?;
        if !kind.supports_regression() {
            bail!("Model '{}' does not support regression", model);
        }

        let values = target_values(table, params)?;
        let rows: Vec<usize> = (0..table.nrows()).filter(|&r| !values[r].is_nan()).collect();
        let y: Vec<f32> = rows.iter().map(|&r| values[r] as f32).collect();
        let prepared = prepare(table, params, rows, None)?;
        log::debug!(
            "{}: {} rows, {} features, {} folds",
            model,
            prepared.rows.len(),
            prepared.features.len(),
            prepared.splits.len()
        );

        let outputs = run_folds(params.threads, &prepared.splits, |split| {
            let (x_train, x_test) = fold_matrices(&prepared.x, split);
            let y_train: Vec<f32> = split.train.iter().map(|&i| y[i]).collect();
            let mut regressor = build_regressor(&kind, params.seed.wrapping_add(split.fold as u64))?;
            regressor.fit(&x_train, &y_train)?;
            Ok(regressor.predict(&x_test))
        })?;

        let mut records = Vec::with_capacity(prepared.rows.len());
        let mut per_fold = Vec::with_capacity(outputs.len());
        for out in &outputs {
            let observed: Vec<f64> = out.test.iter().map(|&i| y[i] as f64).collect();
            let predicted: Vec<f64> = out.predicted.iter().map(|&p| p as f64).collect();
            per_fold.push(regression_metrics(&observed, &predicted));
            for (k, &i) in out.test.iter().enumerate() {
                records.push(PredictionRecord {
                    row: prepared.rows[i],
                    fold: out.fold,
                    observed: observed[k],
                    predicted: predicted[k],
                });
            }
        }
        records.sort_by_key(|r| r.row);

        let observed: Vec<f64> = records.iter().map(|r| r.observed).collect();
        let predicted: Vec<f64> = records.iter().map(|r| r.predicted).collect();
        let overall = regression_metrics(&observed, &predicted);
        log::info!(
            "{}: R2 {:.4}, MAE {:.4}, Pearson {:.4} over {} rows",
            model,
            overall.r2,
            overall.mae,
            overall.pearson,
            overall.n
        );

        write_predictions(&artifact_path(&params.prefix, model, "predictions.tsv"), &records)?;
        write_metrics(
            &artifact_path(&params.prefix, model, "metrics.json"),
            &MetricsReport {
                model,
                task: "regression",
                rows: prepared.rows.len(),
                features: prepared.features,
                folds: params.cv,
                created: chrono::Utc::now().to_rfc3339(),
                target: &params.target_summary,
                overall,
                per_fold,
                classes: None,
            },
        )?;
        Ok(())
    }

    fn classify(
        &mut self,
        table: &Table,
        model: &str,
        bins: &ClassBins,
        params: &RunParams,
    ) -> Result<()> {
        let kind = parse_model(model)?;
        if !kind.supports_classification() {
            bail!("Model '{}' does not support classification", model);
        }

        let values = target_values(table, params)?;
        let (rows, labels): (Vec<usize>, Vec<usize>) = (0..table.nrows())
            .filter_map(|r| bins.label(values[r]).map(|label| (r, label)))
            .unzip();
        let dropped = table.nrows() - rows.len();
        if dropped > 0 {
            log::warn!(
                "{}: {} row(s) outside the usable classes were left out",
                model,
                dropped
            );
        }
        let n_classes = bins.n_classes();
        let prepared = prepare(table, params, rows, Some(labels.as_slice()))?;

        let outputs = run_folds(params.threads, &prepared.splits, |split| {
            let (x_train, x_test) = fold_matrices(&prepared.x, split);
            let y_train: Vec<usize> = split.train.iter().map(|&i| labels[i]).collect();
            let mut classifier =
                build_classifier(&kind, params.seed.wrapping_add(split.fold as u64))?;
            classifier.fit(&x_train, &y_train, n_classes)?;
            Ok(classifier.predict(&x_test))
        })?;

        let mut records = Vec::with_capacity(prepared.rows.len());
        let mut per_fold = Vec::with_capacity(outputs.len());
        for out in &outputs {
            let observed: Vec<usize> = out.test.iter().map(|&i| labels[i]).collect();
            per_fold.push(classification_metrics(&observed, &out.predicted, n_classes));
            for (k, &i) in out.test.iter().enumerate() {
                records.push(PredictionRecord {
                    row: prepared.rows[i],
                    fold: out.fold,
                    observed: observed[k] as f64,
                    predicted: out.predicted[k] as f64,
                });
            }
        }
        records.sort_by_key(|r| r.row);

        let observed: Vec<usize> = records.iter().map(|r| r.observed as usize).collect();
        let predicted: Vec<usize> = records.iter().map(|r| r.predicted as usize).collect();
        let overall = classification_metrics(&observed, &predicted, n_classes);
        log::info!(
            "{}: accuracy {:.4}, balanced accuracy {:.4}, macro F1 {:.4} over {} rows",
            model,
            overall.accuracy,
            overall.balanced_accuracy,
            overall.macro_f1,
            overall.n
        );

        write_predictions(&artifact_path(&params.prefix, model, "predictions.tsv"), &records)?;
        write_metrics(
            &artifact_path(&params.prefix, model, "metrics.json"),
            &MetricsReport {
                model,
                task: "classification",
                rows: prepared.rows.len(),
                features: prepared.features,
                folds: params.cv,
                created: chrono::Utc::now().to_rfc3339(),
                target: &params.target_summary,
                overall,
                per_fold,
                classes: Some(bins),
            },
        )?;
        Ok(())
    }
}
