//! Penalized least squares by coordinate descent.
//!
//! Minimizes `1/(2n) |y - Xw|^2 + alpha * (l1_ratio |w|_1 + (1 - l1_ratio)/2 |w|^2)`
//! on standardized features with a centered target. `alpha = 0` is ordinary
//! least squares, `l1_ratio = 0` ridge and `l1_ratio = 1` lasso.
use anyhow::{bail, Result};

use crate::math::Array2;
use crate::models::model_trait::Regressor;
use crate::preprocessing::{fit_scaler, transform_all, Scaler};

const MAX_ITER: usize = 1_000;
const TOL: f64 = 1e-6;

pub struct ElasticNet {
    alpha: f64,
    l1_ratio: f64,
    scaler: Option<Scaler>,
    weights: Vec<f64>,
    intercept: f64,
}

impl ElasticNet {
    pub fn new(alpha: f64, l1_ratio: f64) -> Self {
        Self {
            alpha,
            l1_ratio: l1_ratio.clamp(0.0, 1.0),
            scaler: None,
            weights: Vec::new(),
            intercept: 0.0,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl Regressor for ElasticNet {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        let (n, d) = x.shape();
        if n == 0 {
            bail!("Cannot fit a linear model on an empty training set");
        }
        let scaler = fit_scaler(x);
        let xs = transform_all(x, &scaler);
        let columns: Vec<Vec<f64>> = (0..d)
            .map(|c| xs.column(c).into_iter().map(f64::from).collect())
            .collect();

        let n_f = n as f64;
        let mean_y = y.iter().map(|&v| v as f64).sum::<f64>() / n_f;
        let mut residual: Vec<f64> = y.iter().map(|&v| v as f64 - mean_y).collect();
        let mut w = vec![0.0f64; d];
        let l1 = self.alpha * self.l1_ratio;
        let l2 = self.alpha * (1.0 - self.l1_ratio);
        let norms: Vec<f64> = columns
            .iter()
            .map(|col| col.iter().map(|v| v * v).sum::<f64>() / n_f)
            .collect();

        for iter in 0..MAX_ITER {
            let mut max_delta = 0.0f64;
            for j in 0..d {
                let denom = norms[j] + l2;
                if denom <= f64::EPSILON {
                    continue;
                }
                let col = &columns[j];
                let rho = col
                    .iter()
                    .zip(&residual)
                    .map(|(xij, r)| xij * (r + xij * w[j]))
                    .sum::<f64>()
                    / n_f;
                let updated = soft_threshold(rho, l1) / denom;
                let delta = updated - w[j];
                if delta != 0.0 {
                    for (r, xij) in residual.iter_mut().zip(col) {
                        *r -= xij * delta;
                    }
                    w[j] = updated;
                }
                max_delta = max_delta.max(delta.abs());
            }
            if max_delta < TOL {
                log::trace!("Coordinate descent converged after {} sweeps", iter + 1);
                break;
            }
        }

        self.weights = w;
        self.intercept = mean_y;
        self.scaler = Some(scaler);
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Vec<f32> {
        let Some(scaler) = &self.scaler else {
            return vec![0.0; x.nrows()];
        };
        transform_all(x, scaler)
            .rows()
            .map(|row| {
                let dot: f64 = row.iter().zip(&self.weights).map(|(&v, w)| v as f64 * w).sum();
                (self.intercept + dot) as f32
            })
            .collect()
    }

    fn name(&self) -> &str {
        "elastic_net"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data() -> (Array2<f32>, Vec<f32>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let a = i as f32;
            let b = ((i * 7) % 5) as f32;
            data.extend_from_slice(&[a, b]);
            y.push(3.0 * a - 2.0 * b + 1.0);
        }
        (Array2::from_shape_vec((20, 2), data).unwrap(), y)
    }

    #[test]
    fn ordinary_least_squares_recovers_line() {
        let (x, y) = linear_data();
        let mut model = ElasticNet::new(0.0, 0.0);
        model.fit(&x, &y).unwrap();
        for (p, t) in model.predict(&x).iter().zip(&y) {
            assert!((p - t).abs() < 1e-2, "{} vs {}", p, t);
        }
    }

    #[test]
    fn heavy_lasso_zeroes_weights() {
        let (x, y) = linear_data();
        let mut model = ElasticNet::new(1e6, 1.0);
        model.fit(&x, &y).unwrap();
        assert!(model.weights().iter().all(|&w| w == 0.0));
    }
}
