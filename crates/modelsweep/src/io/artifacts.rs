//! Per-model output files written by the trainer.
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// One out-of-fold prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub row: usize,
    pub fold: usize,
    pub observed: f64,
    pub predicted: f64,
}

/// `{prefix}.{model}.{suffix}`, with path separators in the model name
/// replaced so every artifact stays next to the prefix.
pub fn artifact_path(prefix: &Path, model: &str, suffix: &str) -> PathBuf {
    let model = model.replace(['/', '\\'], "_");
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!(".{}.{}", model, suffix));
    PathBuf::from(name)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn write_predictions(path: &Path, records: &[PredictionRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_metrics<T: Serialize>(path: &Path, metrics: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(metrics)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
