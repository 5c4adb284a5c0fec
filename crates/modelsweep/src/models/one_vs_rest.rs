use anyhow::Result;

use crate::math::Array2;
use crate::models::factory::{build_regressor, ModelKind};
use crate::models::model_trait::{Classifier, Regressor};

/// Classifier built from one regressor per class, each fitted on a 0/1
/// indicator of that class. Scores are clipped at 0 and normalized per row.
pub struct OneVsRest {
    kind: ModelKind,
    seed: u64,
    models: Vec<Box<dyn Regressor>>,
}

impl OneVsRest {
    pub fn new(kind: ModelKind, seed: u64) -> Self {
        Self {
            kind,
            seed,
            models: Vec::new(),
        }
    }
}

impl Classifier for OneVsRest {
    fn fit(&mut self, x: &Array2<f32>, y: &[usize], n_classes: usize) -> Result<()> {
        let mut models = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let indicator: Vec<f32> = y
                .iter()
                .map(|&label| if label == class { 1.0 } else { 0.0 })
                .collect();
            let mut model = build_regressor(&self.kind, self.seed.wrapping_add(class as u64))?;
            model.fit(x, &indicator)?;
            models.push(model);
        }
        self.models = models;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Array2<f32> {
        let n_classes = self.models.len();
        let mut proba = Array2::from_elem(x.nrows(), n_classes, 0.0f32);
        for (c, model) in self.models.iter().enumerate() {
            for (r, score) in model.predict(x).into_iter().enumerate() {
                proba[(r, c)] = score.max(0.0);
            }
        }
        for r in 0..x.nrows() {
            let total: f32 = (0..n_classes).map(|c| proba[(r, c)]).sum();
            for c in 0..n_classes {
                proba[(r, c)] = if total > 0.0 {
                    proba[(r, c)] / total
                } else {
                    1.0 / n_classes as f32
                };
            }
        }
        proba
    }

    fn name(&self) -> &str {
        "one_vs_rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_normalized() {
        let x = Array2::from_shape_vec((6, 1), vec![0.0, 0.1, 0.2, 5.0, 5.1, 5.2]).unwrap();
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut model = OneVsRest::new(ModelKind::Knn { k: 3 }, 0);
        model.fit(&x, &y, 2).unwrap();

        let proba = model.predict_proba(&x);
        for r in 0..6 {
            let total = proba[(r, 0)] + proba[(r, 1)];
            assert!((total - 1.0).abs() < 1e-5);
        }
        assert_eq!(model.predict(&x), y);
    }
}
