//! Random forest built from single gbdt trees.
//!
//! Each tree is a one-round, unshrunk gbdt fit on a bootstrap sample of
//! the rows and a random subset of the features. Sampling is done here
//! with a seeded generator so forests are reproducible.
use anyhow::{bail, Result};
use gbdt::gradient_boost::GBDT;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use crate::math::Array2;
use crate::models::factory::ModelKind;
use crate::models::gbdt::{fit_single_tree, to_datavec};
use crate::models::model_trait::Regressor;

struct Tree {
    model: GBDT,
    features: Vec<usize>,
}

pub struct RandomForest {
    trees: Vec<Tree>,
    params: ModelKind,
    seed: u64,
}

impl RandomForest {
    pub fn new(params: ModelKind, seed: u64) -> Self {
        RandomForest {
            trees: Vec::new(),
            params,
            seed,
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        let ModelKind::RandomForest {
            trees,
            max_depth,
            feature_fraction,
        } = &self.params
        else {
            bail!("Expected random forest parameters, got {:?}", self.params);
        };
        let (n, d) = x.shape();
        if n == 0 || d == 0 {
            bail!("Cannot fit a forest on a {}x{} training set", n, d);
        }

        let n_features = ((d as f64 * feature_fraction).round() as usize).clamp(1, d);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut fitted = Vec::with_capacity(*trees);

        for _ in 0..*trees {
            let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut features = sample(&mut rng, d, n_features).into_vec();
            features.sort_unstable();

            let tree_x = x.select_rows(&rows).select_columns(&features);
            let tree_y: Vec<f32> = rows.iter().map(|&r| y[r]).collect();

            let model = fit_single_tree(&tree_x, &tree_y, *max_depth);
            fitted.push(Tree { model, features });
        }

        self.trees = fitted;
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Vec<f32> {
        let mut sums = vec![0.0f32; x.nrows()];
        if self.trees.is_empty() {
            return sums;
        }
        for tree in &self.trees {
            let data = to_datavec(&x.select_columns(&tree.features), None);
            for (s, p) in sums.iter_mut().zip(tree.model.predict(&data)) {
                *s += p;
            }
        }
        let n_trees = self.trees.len() as f32;
        sums.iter().map(|s| s / n_trees).collect()
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data(n: usize) -> (Array2<f32>, Vec<f32>) {
        let mut data = Vec::with_capacity(n * 3);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a = i as f32 / n as f32;
            data.extend_from_slice(&[a, a * 2.0, (i % 3) as f32]);
            y.push(if a < 0.5 { 1.0 } else { 5.0 });
        }
        (Array2::from_shape_vec((n, 3), data).unwrap(), y)
    }

    fn forest() -> ModelKind {
        ModelKind::RandomForest {
            trees: 15,
            max_depth: 4,
            feature_fraction: 0.67,
        }
    }

    #[test]
    fn predicts_one_value_per_row() {
        let (x, y) = step_data(30);
        let mut model = RandomForest::new(forest(), 11);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).len(), 30);
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = step_data(30);
        let mut a = RandomForest::new(forest(), 5);
        let mut b = RandomForest::new(forest(), 5);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x), b.predict(&x));
    }
}
