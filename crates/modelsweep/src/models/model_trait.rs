use anyhow::Result;

use crate::math::Array2;

/// A model predicting a continuous target.
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()>;

    fn predict(&self, x: &Array2<f32>) -> Vec<f32>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "regressor"
    }
}

/// A model predicting one of `n_classes` labels `0..n_classes`.
pub trait Classifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[usize], n_classes: usize) -> Result<()>;

    /// One row per sample, one column per class; rows sum to 1.
    fn predict_proba(&self, x: &Array2<f32>) -> Array2<f32>;

    /// Most probable class per row; ties go to the lower label.
    fn predict(&self, x: &Array2<f32>) -> Vec<usize> {
        let proba = self.predict_proba(x);
        proba
            .rows()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0usize, f32::NEG_INFINITY), |best, (c, &p)| {
                        if p > best.1 {
                            (c, p)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect()
    }

    fn name(&self) -> &str {
        "classifier"
    }
}
