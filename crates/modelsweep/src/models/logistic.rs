use anyhow::{bail, Result};

use crate::math::Array2;
use crate::models::model_trait::Classifier;
use crate::preprocessing::{fit_scaler, transform_all, Scaler};

const LEARNING_RATE: f64 = 0.5;

/// Multinomial logistic regression fitted by full-batch gradient descent
/// on standardized features, with an L2 penalty on the weights.
pub struct LogisticRegression {
    l2: f64,
    iterations: usize,
    scaler: Option<Scaler>,
    /// `n_classes x (n_features + 1)`, bias in the last column.
    weights: Vec<Vec<f64>>,
}

impl LogisticRegression {
    pub fn new(l2: f64, iterations: usize) -> Self {
        Self {
            l2,
            iterations,
            scaler: None,
            weights: Vec::new(),
        }
    }

    fn softmax(&self, row: &[f32]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .weights
            .iter()
            .map(|w| {
                let bias = w[row.len()];
                bias + row.iter().zip(w).map(|(&x, w)| x as f64 * w).sum::<f64>()
            })
            .collect();
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / total).collect()
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f32>, y: &[usize], n_classes: usize) -> Result<()> {
        let (n, d) = x.shape();
        if n == 0 || n_classes == 0 {
            bail!("Cannot fit logistic regression on an empty training set");
        }
        let scaler = fit_scaler(x);
        let xs = transform_all(x, &scaler);
        self.weights = vec![vec![0.0; d + 1]; n_classes];

        let n_f = n as f64;
        for _ in 0..self.iterations {
            let mut grad = vec![vec![0.0f64; d + 1]; n_classes];
            for (row, &label) in xs.rows().zip(y) {
                let p = self.softmax(row);
                for (c, g) in grad.iter_mut().enumerate() {
                    let err = p[c] - if c == label { 1.0 } else { 0.0 };
                    for (gj, &xj) in g.iter_mut().zip(row) {
                        *gj += err * xj as f64;
                    }
                    g[d] += err;
                }
            }
            for (w, g) in self.weights.iter_mut().zip(&grad) {
                for j in 0..=d {
                    let penalty = if j < d { self.l2 * w[j] } else { 0.0 };
                    w[j] -= LEARNING_RATE * (g[j] / n_f + penalty);
                }
            }
        }

        self.scaler = Some(scaler);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Array2<f32> {
        let n_classes = self.weights.len();
        let mut proba = Array2::from_elem(x.nrows(), n_classes, 0.0f32);
        let Some(scaler) = &self.scaler else {
            return proba;
        };
        for (r, row) in transform_all(x, scaler).rows().enumerate() {
            for (c, p) in self.softmax(row).into_iter().enumerate() {
                proba[(r, c)] = p as f32;
            }
        }
        proba
    }

    fn name(&self) -> &str {
        "logistic"
    }
}
