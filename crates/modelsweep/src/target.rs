//! Target column resolution and classification binning.
//!
//! `resolve` is the gate between an encoded table and the sweep: it finds
//! the target column and, in classification mode, decides the bins and
//! refuses runs where fewer than two bins hold enough rows to be split
//! across the cross-validation folds.
use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::data_handling::Table;
use crate::error::SweepError;

/// Largest number of distinct target values treated as ready-made classes
/// when no bin count is given.
pub const MAX_AUTO_CLASSES: usize = 10;

/// Target column given by 0-based index or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    Index(usize),
    Name(String),
}

impl TargetSpec {
    /// Strings holding an unsigned integer are indices, anything else a name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.parse::<usize>() {
            Ok(idx) => TargetSpec::Index(idx),
            Err(_) => TargetSpec::Name(value.to_string()),
        }
    }

    pub fn column_index(&self, table: &Table) -> Result<usize, SweepError> {
        match self {
            TargetSpec::Index(idx) if *idx < table.ncols() => Ok(*idx),
            TargetSpec::Index(idx) => Err(SweepError::InvalidTarget(format!(
                "index {} is out of range for a table with {} columns",
                idx,
                table.ncols()
            ))),
            TargetSpec::Name(name) => table
                .position(name)
                .ok_or_else(|| SweepError::InvalidTarget(format!("no column named '{}'", name))),
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TargetSpec::Index(idx) => write!(f, "#{}", idx),
            TargetSpec::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// How target values map to classification bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Binning {
    /// Sorted boundaries; `k` thresholds give `k + 1` bins and a value lands
    /// in the bin equal to the number of thresholds `<=` it.
    Thresholds(Vec<f64>),
    /// One bin per listed value (sorted, unique).
    Distinct(Vec<f64>),
}

impl Binning {
    /// Explicit cutoffs, sorted and de-duplicated. NaN cutoffs are dropped.
    pub fn from_cutoffs(cutoffs: &[f64]) -> Self {
        let mut sorted: Vec<f64> = cutoffs.iter().copied().filter(|c| !c.is_nan()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        sorted.dedup();
        Binning::Thresholds(sorted)
    }

    /// `bins` equal-width bins over the observed range of `values`.
    pub fn equal_width(values: &[f64], bins: usize) -> Self {
        let (min, max) = finite_range(values);
        if bins <= 1 || !min.is_finite() {
            return Binning::Thresholds(Vec::new());
        }
        let width = (max - min) / bins as f64;
        Binning::Thresholds((1..bins).map(|i| min + i as f64 * width).collect())
    }

    /// Few distinct values become classes as-is; otherwise equal-width bins
    /// with Sturges' count, capped at `MAX_AUTO_CLASSES`.
    pub fn infer(values: &[f64]) -> Self {
        let distinct = distinct_sorted(values);
        if distinct.len() <= MAX_AUTO_CLASSES {
            return Binning::Distinct(distinct);
        }
        let present = values.iter().filter(|v| !v.is_nan()).count();
        let sturges = (present as f64).log2().ceil() as usize + 1;
        Binning::equal_width(values, sturges.min(MAX_AUTO_CLASSES))
    }

    /// Cutoffs win over `bins`; `bins == 0` infers the binning from data.
    pub fn build(values: &[f64], bins: usize, cutoffs: Option<&[f64]>) -> Self {
        match cutoffs {
            Some(c) if !c.is_empty() => Binning::from_cutoffs(c),
            _ if bins > 0 => Binning::equal_width(values, bins),
            _ => Binning::infer(values),
        }
    }

    pub fn n_bins(&self) -> usize {
        match self {
            Binning::Thresholds(t) => t.len() + 1,
            Binning::Distinct(d) => d.len(),
        }
    }

    /// Bin of `value`; `None` for NaN or values outside a distinct set.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        match self {
            Binning::Thresholds(t) => Some(t.partition_point(|&c| c <= value)),
            Binning::Distinct(d) => d
                .binary_search_by(|bound| bound.partial_cmp(&value).unwrap_or(Ordering::Less))
                .ok(),
        }
    }

    pub fn counts(&self, values: &[f64]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_bins()];
        for bin in values.iter().filter_map(|&v| self.assign(v)) {
            counts[bin] += 1;
        }
        counts
    }
}

/// Resolved classification bins: which bins are populated enough to be used
/// as classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassBins {
    pub binning: Binning,
    pub counts: Vec<usize>,
    /// Indices of bins holding at least `min_count` rows, ascending.
    pub good: Vec<usize>,
    pub min_count: usize,
}

impl ClassBins {
    pub fn new(binning: Binning, values: &[f64], min_count: usize) -> Self {
        let counts = binning.counts(values);
        let good = counts
            .iter()
            .enumerate()
            .filter(|(_, &n)| n >= min_count)
            .map(|(bin, _)| bin)
            .collect();
        Self {
            binning,
            counts,
            good,
            min_count,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.good.len()
    }

    /// Class label of `value`: the position of its bin among the good bins.
    pub fn label(&self, value: f64) -> Option<usize> {
        let bin = self.binning.assign(value)?;
        self.good.binary_search(&bin).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Mode {
    Regression,
    Classification(ClassBins),
}

impl Mode {
    pub fn is_classification(&self) -> bool {
        matches!(self, Mode::Classification(_))
    }
}

/// Target column plus the mode it will be modelled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMode {
    pub target: usize,
    pub mode: Mode,
    /// Reported alongside every model's metrics.
    pub summary: TargetSummary,
}

/// Descriptive statistics of the target column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub name: String,
    pub rows: usize,
    pub missing: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub bin_counts: Option<Vec<usize>>,
    pub good_bins: Option<usize>,
}

/// Summarize a target column, counting good bins when `bins` is given.
pub fn summarize(name: &str, values: &[f64], bins: Option<&ClassBins>) -> TargetSummary {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let (min, max) = finite_range(&present);
    let summary = TargetSummary {
        name: name.to_string(),
        rows: values.len(),
        missing: values.len() - present.len(),
        mean: present.iter().mean(),
        std_dev: present.iter().std_dev(),
        min,
        max,
        bin_counts: bins.map(|b| b.counts.clone()),
        good_bins: bins.map(ClassBins::n_classes),
    };

    log::info!(
        "Target '{}': {} rows ({} missing), mean {:.4}, std {:.4}, range [{}, {}]",
        summary.name,
        summary.rows,
        summary.missing,
        summary.mean,
        summary.std_dev,
        summary.min,
        summary.max
    );
    if let Some(b) = bins {
        log::info!(
            "Bin counts {:?}; {} bin(s) with at least {} rows",
            b.counts,
            b.n_classes(),
            b.min_count
        );
    }
    summary
}

/// Resolve the target column and decide the modelling mode.
///
/// In classification mode every bin needs `min_count` rows to be usable;
/// fewer than two usable bins yields `SweepError::InsufficientClasses`.
pub fn resolve(
    table: &Table,
    target: &TargetSpec,
    classify: bool,
    bins: usize,
    cutoffs: Option<&[f64]>,
    min_count: usize,
) -> Result<ResolvedMode, SweepError> {
    let idx = target.column_index(table)?;
    let column = table.column(idx).ok_or_else(|| {
        SweepError::InvalidTarget(format!("{} is not in the table", target))
    })?;
    let values = column.as_numeric().ok_or_else(|| {
        SweepError::InvalidTarget(format!("'{}' is not numeric", column.name))
    })?;

    if !classify {
        let summary = summarize(&column.name, values, None);
        return Ok(ResolvedMode {
            target: idx,
            mode: Mode::Regression,
            summary,
        });
    }

    let class_bins = ClassBins::new(Binning::build(values, bins, cutoffs), values, min_count);
    let summary = summarize(&column.name, values, Some(&class_bins));

    if class_bins.n_classes() < 2 {
        return Err(SweepError::InsufficientClasses {
            good_bins: class_bins.n_classes(),
        });
    }

    Ok(ResolvedMode {
        target: idx,
        mode: Mode::Classification(class_bins),
        summary,
    })
}

fn finite_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::NAN, f64::NAN), |(lo, hi), &v| {
            (if lo.is_nan() { v } else { lo.min(v) }, if hi.is_nan() { v } else { hi.max(v) })
        })
}

fn distinct_sorted(values: &[f64]) -> Vec<f64> {
    let mut distinct: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    distinct.dedup();
    distinct
}
