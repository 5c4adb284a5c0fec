//! Evaluation metrics for out-of-fold predictions.
use serde::Serialize;
use statrs::statistics::Statistics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub n: usize,
    pub r2: f64,
    pub mae: f64,
    pub mse: f64,
    pub pearson: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub n: usize,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub macro_f1: f64,
    /// `confusion[observed][predicted]`
    pub confusion: Vec<Vec<usize>>,
}

/// Regression scores of `predicted` against `observed`.
///
/// R² is `1 - SSE/SST`; for a constant target it is NaN, as is Pearson's r
/// when either side has no variance.
pub fn regression_metrics(observed: &[f64], predicted: &[f64]) -> RegressionMetrics {
    assert_eq!(observed.len(), predicted.len(), "length mismatch");
    let n = observed.len();
    if n == 0 {
        return RegressionMetrics {
            n,
            r2: f64::NAN,
            mae: f64::NAN,
            mse: f64::NAN,
            pearson: f64::NAN,
        };
    }

    let mean = observed.iter().mean();
    let (mut sse, mut sst, mut abs) = (0.0, 0.0, 0.0);
    for (&y, &p) in observed.iter().zip(predicted) {
        sse += (y - p).powi(2);
        sst += (y - mean).powi(2);
        abs += (y - p).abs();
    }

    let r2 = if sst > 0.0 { 1.0 - sse / sst } else { f64::NAN };
    let denom = observed.iter().std_dev() * predicted.iter().std_dev();
    let pearson = if denom > 0.0 {
        observed.iter().covariance(predicted.iter()) / denom
    } else {
        f64::NAN
    };

    RegressionMetrics {
        n,
        r2,
        mae: abs / n as f64,
        mse: sse / n as f64,
        pearson,
    }
}

pub fn classification_metrics(
    observed: &[usize],
    predicted: &[usize],
    n_classes: usize,
) -> ClassificationMetrics {
    assert_eq!(observed.len(), predicted.len(), "length mismatch");
    let mut confusion = vec![vec![0usize; n_classes]; n_classes];
    for (&y, &p) in observed.iter().zip(predicted) {
        confusion[y][p] += 1;
    }

    let n = observed.len();
    let correct: usize = (0..n_classes).map(|c| confusion[c][c]).sum();

    let mut recalls = Vec::new();
    let mut f1s = Vec::with_capacity(n_classes);
    for c in 0..n_classes {
        let tp = confusion[c][c] as f64;
        let actual: usize = confusion[c].iter().sum();
        let called: usize = confusion.iter().map(|row| row[c]).sum();
        if actual > 0 {
            recalls.push(tp / actual as f64);
        }
        let denom = (actual + called) as f64;
        f1s.push(if denom > 0.0 { 2.0 * tp / denom } else { 0.0 });
    }

    ClassificationMetrics {
        n,
        accuracy: if n > 0 { correct as f64 / n as f64 } else { f64::NAN },
        balanced_accuracy: if recalls.is_empty() {
            f64::NAN
        } else {
            recalls.iter().mean()
        },
        macro_f1: if f1s.is_empty() { f64::NAN } else { f1s.iter().mean() },
        confusion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_regression() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let m = regression_metrics(&y, &y);
        assert!((m.r2 - 1.0).abs() < 1e-12);
        assert_eq!(m.mae, 0.0);
        assert!((m.pearson - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mean_prediction_has_zero_r2() {
        let y = [1.0, 2.0, 3.0];
        let m = regression_metrics(&y, &[2.0, 2.0, 2.0]);
        assert!(m.r2.abs() < 1e-12);
        assert!(m.pearson.is_nan());
        assert!((m.mse - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn confusion_and_accuracy() {
        let m = classification_metrics(&[0, 0, 1, 1], &[0, 1, 1, 1], 2);
        assert_eq!(m.confusion, vec![vec![1, 1], vec![0, 2]]);
        assert!((m.accuracy - 0.75).abs() < 1e-12);
        assert!((m.balanced_accuracy - 0.75).abs() < 1e-12);
        // f1: class0 = 2/3, class1 = 0.8
        assert!((m.macro_f1 - (2.0 / 3.0 + 0.8) / 2.0).abs() < 1e-12);
    }
}
