//! k-nearest-neighbour models on standardized features.
use anyhow::{bail, Result};

use crate::math::Array2;
use crate::models::model_trait::{Classifier, Regressor};
use crate::preprocessing::{fit_scaler, transform_all, Scaler};

/// Stored training rows plus the scaler fitted on them.
struct Neighbours {
    k: usize,
    scaler: Option<Scaler>,
    x: Array2<f32>,
}

impl Neighbours {
    fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            scaler: None,
            x: Array2::from_elem(0, 0, 0.0),
        }
    }

    fn fit(&mut self, x: &Array2<f32>) -> Result<()> {
        if x.nrows() == 0 {
            bail!("Cannot fit nearest neighbours on an empty training set");
        }
        let scaler = fit_scaler(x);
        self.x = transform_all(x, &scaler);
        self.scaler = Some(scaler);
        Ok(())
    }

    /// Training row indices of the `k` nearest rows for every row of `x`.
    /// Equal distances are broken by training row order.
    fn query(&self, x: &Array2<f32>) -> Vec<Vec<usize>> {
        let Some(scaler) = &self.scaler else {
            return vec![Vec::new(); x.nrows()];
        };
        let x = transform_all(x, scaler);
        let k = self.k.min(self.x.nrows());

        x.rows()
            .map(|query| {
                let mut dists: Vec<(f32, usize)> = self
                    .x
                    .rows()
                    .enumerate()
                    .map(|(i, row)| {
                        let d: f32 = row.iter().zip(query).map(|(a, b)| (a - b) * (a - b)).sum();
                        (d, i)
                    })
                    .collect();
                dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                dists.into_iter().take(k).map(|(_, i)| i).collect()
            })
            .collect()
    }
}

pub struct KnnRegressor {
    inner: Neighbours,
    y: Vec<f32>,
}

impl KnnRegressor {
    pub fn new(k: usize) -> Self {
        Self {
            inner: Neighbours::new(k),
            y: Vec::new(),
        }
    }
}

impl Regressor for KnnRegressor {
    fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        self.inner.fit(x)?;
        self.y = y.to_vec();
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Vec<f32> {
        self.inner
            .query(x)
            .into_iter()
            .map(|nn| {
                if nn.is_empty() {
                    0.0
                } else {
                    nn.iter().map(|&i| self.y[i]).sum::<f32>() / nn.len() as f32
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "knn"
    }
}

pub struct KnnClassifier {
    inner: Neighbours,
    y: Vec<usize>,
    n_classes: usize,
}

impl KnnClassifier {
    pub fn new(k: usize) -> Self {
        Self {
            inner: Neighbours::new(k),
            y: Vec::new(),
            n_classes: 0,
        }
    }
}

impl Classifier for KnnClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[usize], n_classes: usize) -> Result<()> {
        self.inner.fit(x)?;
        self.y = y.to_vec();
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Array2<f32> {
        let mut proba = Array2::from_elem(x.nrows(), self.n_classes, 0.0f32);
        for (row, nn) in self.inner.query(x).into_iter().enumerate() {
            for &i in &nn {
                proba[(row, self.y[i])] += 1.0 / nn.len() as f32;
            }
        }
        proba
    }

    fn name(&self) -> &str {
        "knn"
    }
}
