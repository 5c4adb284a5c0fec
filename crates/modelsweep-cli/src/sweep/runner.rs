//! Load, encode, resolve and sweep: the whole run behind the binary.
use modelsweep::config::SweepConfig;
use modelsweep::error::SweepError;
use modelsweep::io::read_table;
use modelsweep::preprocessing::encode_categoricals;
use modelsweep::sweep::{self, group_columns, ModelStatus, Trainer};
use modelsweep::target::resolve;

/// How a run ended when nothing fatal happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every model was dispatched; per-model statuses in sweep order.
    Completed(Vec<(String, ModelStatus)>),
    /// Classification was requested but fewer than two bins were usable.
    /// No model ran.
    NotEnoughClasses { good_bins: usize },
}

impl Outcome {
    /// Models that failed under `keep_going`.
    pub fn failures(&self) -> Vec<&str> {
        match self {
            Outcome::Completed(statuses) => statuses
                .iter()
                .filter(|(_, status)| matches!(status, ModelStatus::Failed(_)))
                .map(|(model, _)| model.as_str())
                .collect(),
            Outcome::NotEnoughClasses { .. } => Vec::new(),
        }
    }
}

pub fn execute<T: Trainer + ?Sized>(
    config: &SweepConfig,
    trainer: &mut T,
) -> Result<Outcome, SweepError> {
    let mut table = read_table(&config.data).map_err(|e| SweepError::DataLoad {
        path: config.data.clone(),
        message: format!("{:#}", e),
    })?;
    log::info!(
        "[modelsweep::runner] Loaded {} rows x {} columns from {:?}",
        table.nrows(),
        table.ncols(),
        config.data
    );
    log::debug!("[modelsweep::runner] Columns: {:?}", table.names());

    let encoded = encode_categoricals(&mut table);
    if !encoded.is_empty() {
        log::info!("[modelsweep::runner] Encoded categorical columns: {}", encoded.join(", "));
    }

    group_columns(&table, &config.groupcols)?;

    let resolved = match resolve(
        &table,
        &config.target(),
        config.classify,
        config.bins,
        config.cutoffs(),
        config.cv,
    ) {
        Ok(resolved) => resolved,
        Err(SweepError::InsufficientClasses { good_bins }) => {
            return Ok(Outcome::NotEnoughClasses { good_bins })
        }
        Err(e) => return Err(e),
    };

    sweep::run(&table, &resolved, config, trainer).map(Outcome::Completed)
}
