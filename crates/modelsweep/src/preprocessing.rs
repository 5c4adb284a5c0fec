//! Table and feature preprocessing.
//!
//! Categorical encoding works on the loaded `Table`; imputation and
//! standardization work on fold-local `Array2<f32>` feature matrices so
//! statistics are always fitted on training rows only.
use std::collections::BTreeSet;

use crate::data_handling::{ColumnData, Table};
use crate::math::Array2;

/// Code assigned to missing categorical cells.
pub const MISSING_CODE: f64 = -1.0;

/// Replace every categorical column by integer codes, in place.
///
/// Distinct values are sorted and numbered from 0, so the encoding only
/// depends on the set of values present. Returns the names of the columns
/// that were encoded.
pub fn encode_categoricals(table: &mut Table) -> Vec<String> {
    let mut encoded = Vec::new();
    for column in table.columns_mut() {
        let ColumnData::Categorical(values) = &column.data else {
            continue;
        };

        let levels: Vec<&str> = values
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let codes = values
            .iter()
            .map(|value| match value {
                Some(v) => levels
                    .binary_search(&v.as_str())
                    .map(|code| code as f64)
                    .unwrap_or(MISSING_CODE),
                None => MISSING_CODE,
            })
            .collect();

        log::debug!(
            "Encoded categorical column '{}' with {} levels",
            column.name,
            levels.len()
        );
        encoded.push(column.name.clone());
        column.data = ColumnData::Numeric(codes);
    }
    encoded
}

/// Per-column means over non-missing cells (0 for all-missing columns).
pub fn fit_imputer(x: &Array2<f32>) -> Vec<f32> {
    let (nrows, ncols) = x.shape();
    let mut sums = vec![0.0f64; ncols];
    let mut counts = vec![0usize; ncols];
    for r in 0..nrows {
        for c in 0..ncols {
            let v = x[(r, c)];
            if !v.is_nan() {
                sums[c] += v as f64;
                counts[c] += 1;
            }
        }
    }
    sums.iter()
        .zip(&counts)
        .map(|(&s, &n)| if n == 0 { 0.0 } else { (s / n as f64) as f32 })
        .collect()
}

/// Fill NaN cells with the matching column fill value.
pub fn impute(x: &Array2<f32>, fill: &[f32]) -> Array2<f32> {
    let mut out = x.clone();
    let (nrows, ncols) = x.shape();
    for r in 0..nrows {
        for c in 0..ncols {
            if out[(r, c)].is_nan() {
                out[(r, c)] = fill[c];
            }
        }
    }
    out
}

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug)]
pub struct Scaler {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f32 = 1e-6;
}

/// Fit a `Scaler` from an `Array2<f32>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f32>) -> Scaler {
    let (nrows, ncols) = x.shape();
    if nrows == 0 {
        return Scaler {
            mean: vec![0.0; ncols],
            std: vec![1.0; ncols],
        };
    }

    let mut mean = vec![0.0f32; ncols];
    for row in x.rows() {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    let nrows_f = nrows as f32;
    for v in mean.iter_mut() {
        *v /= nrows_f;
    }

    let mut var = vec![0.0f32; ncols];
    for row in x.rows() {
        for c in 0..ncols {
            let d = row[c] - mean[c];
            var[c] += d * d;
        }
    }
    for v in var.iter_mut() {
        *v = (*v / nrows_f).sqrt().max(Scaler::MIN_STD);
    }

    Scaler { mean, std: var }
}

/// Transform all rows using the provided `Scaler` and return a new `Array2<f32>`.
pub fn transform_all(x: &Array2<f32>, sc: &Scaler) -> Array2<f32> {
    let mut out = x.clone();
    let (nrows, ncols) = x.shape();
    for r in 0..nrows {
        for c in 0..ncols {
            out[(r, c)] = (x[(r, c)] - sc.mean[c]) / sc.std[c];
        }
    }
    out
}
