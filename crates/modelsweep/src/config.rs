use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::target::TargetSpec;

/// Models swept when none are requested: one boosting preset, one forest
/// and one large boosting run.
pub const DEFAULT_MODELS: [&str; 3] = ["LightGBM", "RandomForest", "XGB.1K"];

/// Immutable configuration of one sweep.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    /// Input table.
    pub data: PathBuf,
    /// Target column, as a 0-based index or a name.
    pub ycol: String,
    pub classify: bool,
    /// Equal-width bin count for classification; 0 infers it.
    pub bins: usize,
    /// Explicit bin boundaries; take precedence over `bins`.
    pub cutoffs: Option<Vec<f64>>,
    /// Models in processing order. Duplicates are kept.
    pub models: Vec<String>,
    /// Cross-validation folds, also the minimum rows per class.
    pub cv: usize,
    /// Threads per training job; -1 (or any value <= 0) uses every core.
    pub threads: i32,
    /// Columns whose values must not be split across folds.
    pub groupcols: Vec<String>,
    pub out_dir: PathBuf,
    /// Overrides the input file name as the artifact stem.
    pub prefix: Option<String>,
    /// Seed for fold shuffling and bagging.
    pub seed: u64,
    /// Log and skip failing models instead of aborting the sweep.
    pub keep_going: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            data: PathBuf::new(),
            ycol: "0".to_string(),
            classify: false,
            bins: 0,
            cutoffs: None,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            cv: 3,
            threads: 4,
            groupcols: Vec::new(),
            out_dir: PathBuf::from("p1save"),
            prefix: None,
            seed: 2017,
            keep_going: false,
        }
    }
}

impl SweepConfig {
    pub fn target(&self) -> TargetSpec {
        TargetSpec::parse(&self.ycol)
    }

    pub fn cutoffs(&self) -> Option<&[f64]> {
        self.cutoffs.as_deref().filter(|c| !c.is_empty())
    }

    /// Check the values clap cannot check on its own, e.g. after loading
    /// from JSON.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.data.as_os_str().is_empty() {
            anyhow::bail!("No data file given");
        }
        if self.cv < 2 {
            anyhow::bail!("Cross-validation needs at least 2 folds, got {}", self.cv);
        }
        if self.models.is_empty() {
            anyhow::bail!("No models to sweep");
        }
        Ok(())
    }
}
