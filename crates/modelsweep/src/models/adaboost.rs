//! AdaBoost.R2 over shallow gbdt trees.
//!
//! Each round draws a weighted bootstrap of the rows, fits one tree on it
//! and reweights the rows by their linear loss on the full training set.
//! Predictions are the weighted median of the stage predictions.
use anyhow::{bail, Context, Result};
use gbdt::gradient_boost::GBDT;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::math::Array2;
use crate::models::factory::ModelKind;
use crate::models::gbdt::{fit_single_tree, to_datavec};
use crate::models::model_trait::Regressor;

struct Stage {
    model: GBDT,
    weight: f64,
}

pub struct AdaBoost {
    stages: Vec<Stage>,
    params: ModelKind,
    seed: u64,
}

impl AdaBoost {
    pub fn new(params: ModelKind, seed: u64) -> Self {
        AdaBoost {
            stages: Vec::new(),
            params,
            seed,
        }
    }
}

/// Value at which the cumulative stage weight reaches half the total.
fn weighted_median(mut votes: Vec<(f32, f64)>) -> f32 {
    votes.sort_by(|a, b| a.0.total_cmp(&b.0));
    let half = votes.iter().map(|v| v.1).sum::<f64>() / 2.0;
    let mut acc = 0.0;
    for &(value, weight) in &votes {
        acc += weight;
        if acc >= half {
            return value;
        }
    }
    votes.last().map(|v| v.0).unwrap_or(0.0)
}

impl Regressor for AdaBoost {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        let ModelKind::AdaBoost { rounds, max_depth } = &self.params else {
            bail!("Expected AdaBoost parameters, got {:?}", self.params);
        };
        let n = x.nrows();
        if n == 0 {
            bail!("Cannot fit AdaBoost on an empty training set");
        }

        let all_rows = to_datavec(x, None);
        let mut weights = vec![1.0 / n as f64; n];
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut stages: Vec<Stage> = Vec::with_capacity(*rounds);

        for round in 0..*rounds {
            let sampler =
                WeightedIndex::new(&weights).context("Invalid AdaBoost sample weights")?;
            let rows: Vec<usize> = (0..n).map(|_| sampler.sample(&mut rng)).collect();
            let tree_y: Vec<f32> = rows.iter().map(|&r| y[r]).collect();
            let model = fit_single_tree(&x.select_rows(&rows), &tree_y, *max_depth);

            let errors: Vec<f64> = model
                .predict(&all_rows)
                .iter()
                .zip(y)
                .map(|(p, t)| (p - t).abs() as f64)
                .collect();
            let max_error = errors.iter().copied().fold(0.0f64, f64::max);
            let avg_loss: f64 = if max_error > 0.0 {
                weights
                    .iter()
                    .zip(&errors)
                    .map(|(w, e)| w * e / max_error)
                    .sum()
            } else {
                0.0
            };

            if avg_loss <= f64::EPSILON {
                // perfect fit
                stages.push(Stage { model, weight: 1.0 });
                break;
            }
            if avg_loss >= 0.5 {
                if stages.is_empty() {
                    stages.push(Stage { model, weight: 1.0 });
                }
                log::debug!(
                    "AdaBoost stopped after {} round(s), average loss {:.3}",
                    round + 1,
                    avg_loss
                );
                break;
            }

            let beta = avg_loss / (1.0 - avg_loss);
            for (w, e) in weights.iter_mut().zip(&errors) {
                *w *= beta.powf(1.0 - e / max_error);
            }
            let total: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= total);
            stages.push(Stage {
                model,
                weight: (1.0 / beta).ln(),
            });
        }

        self.stages = stages;
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Vec<f32> {
        if self.stages.is_empty() {
            return vec![0.0; x.nrows()];
        }
        let data = to_datavec(x, None);
        let predictions: Vec<Vec<f32>> = self.stages.iter().map(|s| s.model.predict(&data)).collect();

        (0..x.nrows())
            .map(|r| {
                weighted_median(
                    self.stages
                        .iter()
                        .zip(&predictions)
                        .map(|(stage, p)| (p[r], stage.weight))
                        .collect(),
                )
            })
            .collect()
    }

    fn name(&self) -> &str {
        "adaboost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind() -> ModelKind {
        ModelKind::AdaBoost {
            rounds: 20,
            max_depth: 3,
        }
    }

    fn ramp(n: usize) -> (Array2<f32>, Vec<f32>) {
        let mut data = Vec::with_capacity(n * 2);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a = i as f32 / n as f32;
            data.extend_from_slice(&[a, (i % 4) as f32]);
            y.push(10.0 * a);
        }
        (Array2::from_shape_vec((n, 2), data).unwrap(), y)
    }

    #[test]
    fn follows_a_ramp() {
        let (x, y) = ramp(40);
        let mut model = AdaBoost::new(kind(), 3);
        model.fit(&x, &y).unwrap();
        let predictions = model.predict(&x);

        assert_eq!(predictions.len(), 40);
        assert!(predictions[0] < predictions[39]);
        assert!(!model.stages.is_empty() && model.stages.len() <= 20);
    }

    #[test]
    fn same_seed_same_ensemble() {
        let (x, y) = ramp(30);
        let mut a = AdaBoost::new(kind(), 9);
        let mut b = AdaBoost::new(kind(), 9);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x), b.predict(&x));
    }

    #[test]
    fn median_ignores_light_outliers() {
        let votes = vec![(1.0, 0.2), (2.0, 0.5), (100.0, 0.3)];
        assert_eq!(weighted_median(votes), 2.0);
    }

    #[test]
    fn rejects_wrong_parameters() {
        let x = Array2::from_shape_vec((1, 1), vec![0.0]).unwrap();
        let mut model = AdaBoost::new(ModelKind::Knn { k: 1 }, 0);
        assert!(model.fit(&x, &[1.0]).is_err());
    }
}
