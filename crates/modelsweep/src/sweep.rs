//! The sweep loop: one training call per configured model.
//!
//! The orchestrator owns no model state. It computes the shared output
//! prefix, then hands the table to a [`Trainer`] once per model, in the
//! configured order, waiting for each call to return before the next.
use std::path::{Path, PathBuf};

use crate::config::SweepConfig;
use crate::data_handling::Table;
use crate::error::SweepError;
use crate::target::{ClassBins, Mode, ResolvedMode, TargetSummary};

/// Parameters shared by every model of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    /// Index of the target column in the table.
    pub target: usize,
    pub cv: usize,
    pub groupcols: Vec<String>,
    pub threads: i32,
    /// `out_dir/stem`; the trainer appends the model name.
    pub prefix: PathBuf,
    pub seed: u64,
    /// Target statistics copied into every metrics report.
    pub target_summary: TargetSummary,
}

/// Training and scoring entry points a sweep dispatches to.
///
/// Model names are opaque here; implementations decide which names they
/// accept and fail on the rest.
pub trait Trainer {
    fn regress(&mut self, table: &Table, model: &str, params: &RunParams) -> anyhow::Result<()>;

    fn classify(
        &mut self,
        table: &Table,
        model: &str,
        bins: &ClassBins,
        params: &RunParams,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Completed,
    Failed(String),
}

/// `out_dir` joined with the explicit prefix, or with the data file's
/// base name when no prefix is set.
pub fn output_prefix(data: &Path, prefix: Option<&str>, out_dir: &Path) -> PathBuf {
    let stem = match prefix {
        Some(p) => PathBuf::from(p),
        None => data.file_name().map(PathBuf::from).unwrap_or_default(),
    };
    out_dir.join(stem)
}

/// Column indices of the grouping columns, in the given order.
pub fn group_columns(table: &Table, names: &[String]) -> Result<Vec<usize>, SweepError> {
    names
        .iter()
        .map(|name| {
            table
                .position(name)
                .ok_or_else(|| SweepError::UnknownColumn(name.clone()))
        })
        .collect()
}

/// Dispatch every configured model to `trainer`.
///
/// The first failing model aborts the sweep with
/// `SweepError::ModelDispatch` unless `config.keep_going` is set, in which
/// case the failure is logged, recorded and the next model runs.
pub fn run<T: Trainer + ?Sized>(
    table: &Table,
    resolved: &ResolvedMode,
    config: &SweepConfig,
    trainer: &mut T,
) -> Result<Vec<(String, ModelStatus)>, SweepError> {
    let params = RunParams {
        target: resolved.target,
        cv: config.cv,
        groupcols: config.groupcols.clone(),
        threads: config.threads,
        prefix: output_prefix(&config.data, config.prefix.as_deref(), &config.out_dir),
        seed: config.seed,
        target_summary: resolved.summary.clone(),
    };
    log::info!(
        "Sweeping {} model(s) in {} mode, writing to {}",
        config.models.len(),
        if resolved.mode.is_classification() {
            "classification"
        } else {
            "regression"
        },
        params.prefix.display()
    );

    let mut statuses = Vec::with_capacity(config.models.len());
    for (i, model) in config.models.iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, config.models.len(), model);

        let outcome = match &resolved.mode {
            Mode::Classification(bins) => trainer.classify(table, model, bins, &params),
            Mode::Regression => trainer.regress(table, model, &params),
        };

        match outcome {
            Ok(()) => statuses.push((model.clone(), ModelStatus::Completed)),
            Err(e) if config.keep_going => {
                log::error!("Model '{}' failed, continuing: {:#}", model, e);
                statuses.push((model.clone(), ModelStatus::Failed(format!("{:#}", e))));
            }
            Err(e) => {
                return Err(SweepError::ModelDispatch {
                    model: model.clone(),
                    message: format!("{:#}", e),
                })
            }
        }
    }
    Ok(statuses)
}
