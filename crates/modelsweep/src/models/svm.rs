//! Support vector classification on linfa-svm.
//!
//! Two classes share one probabilistic machine. More classes are fitted
//! one-vs-rest and the per-class probabilities normalized per row.
use anyhow::{anyhow, bail, Result};
use linfa::dataset::Pr;
use linfa::traits::Predict;
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::Array1;

use crate::math::Array2;
use crate::models::model_trait::Classifier;
use crate::preprocessing::{fit_scaler, transform_all, Scaler};

/// One binary problem: a fitted machine, or a fixed probability when the
/// training fold holds only one side of it.
enum Machine {
    Fitted(Svm<f64, Pr>),
    Constant(f32),
}

impl Machine {
    fn scores(&self, records: &ndarray::Array2<f64>) -> Vec<f32> {
        match self {
            Machine::Fitted(model) => {
                let predicted: Array1<Pr> = model.predict(records);
                predicted.iter().map(|p| **p).collect()
            }
            Machine::Constant(p) => vec![*p; records.nrows()],
        }
    }
}

pub struct SvmClassifier {
    c: f64,
    eps: f64,
    scaler: Option<Scaler>,
    n_classes: usize,
    machines: Vec<Machine>,
}

impl SvmClassifier {
    pub fn new(c: f64, eps: f64) -> Self {
        Self {
            c,
            eps,
            scaler: None,
            n_classes: 0,
            machines: Vec::new(),
        }
    }

    fn fit_machine(&self, records: &ndarray::Array2<f64>, positive: Vec<bool>) -> Result<Machine> {
        let n_positive = positive.iter().filter(|&&p| p).count();
        if n_positive == 0 || n_positive == positive.len() {
            return Ok(Machine::Constant(if n_positive == 0 { 0.0 } else { 1.0 }));
        }

        // Gaussian kernel width equal to the feature count on standardized inputs.
        let width = records.ncols().max(1) as f64;
        let params: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
            .eps(self.eps)
            .pos_neg_weights(self.c, self.c)
            .gaussian_kernel(width);

        let dataset = Dataset::new(records.clone(), Array1::from_vec(positive));
        let model = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&params, &dataset)
            .map_err(|e| anyhow!("SVM training failed: {}", e))?;
        Ok(Machine::Fitted(model))
    }
}

fn to_records(x: &Array2<f32>) -> ndarray::Array2<f64> {
    ndarray::Array2::from_shape_fn(x.shape(), |(r, c)| x[(r, c)] as f64)
}

impl Classifier for SvmClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[usize], n_classes: usize) -> Result<()> {
        if x.nrows() == 0 || n_classes < 2 {
            bail!(
                "Cannot fit an SVM on {} rows and {} classes",
                x.nrows(),
                n_classes
            );
        }
        let scaler = fit_scaler(x);
        let records = to_records(&transform_all(x, &scaler));

        let machines = if n_classes == 2 {
            vec![self.fit_machine(&records, y.iter().map(|&l| l == 1).collect())?]
        } else {
            (0..n_classes)
                .map(|class| self.fit_machine(&records, y.iter().map(|&l| l == class).collect()))
                .collect::<Result<Vec<_>>>()?
        };

        self.scaler = Some(scaler);
        self.n_classes = n_classes;
        self.machines = machines;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Array2<f32> {
        let mut proba = Array2::from_elem(x.nrows(), self.n_classes, 0.0f32);
        let Some(scaler) = &self.scaler else {
            return proba;
        };
        let records = to_records(&transform_all(x, scaler));

        if let [machine] = self.machines.as_slice() {
            for (r, p) in machine.scores(&records).into_iter().enumerate() {
                let p = p.clamp(0.0, 1.0);
                proba[(r, 0)] = 1.0 - p;
                proba[(r, 1)] = p;
            }
            return proba;
        }

        for (c, machine) in self.machines.iter().enumerate() {
            for (r, p) in machine.scores(&records).into_iter().enumerate() {
                proba[(r, c)] = p.max(0.0);
            }
        }
        for r in 0..x.nrows() {
            let total: f32 = (0..self.n_classes).map(|c| proba[(r, c)]).sum();
            for c in 0..self.n_classes {
                proba[(r, c)] = if total > 0.0 {
                    proba[(r, c)] / total
                } else {
                    1.0 / self.n_classes as f32
                };
            }
        }
        proba
    }

    fn name(&self) -> &str {
        "svm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs(centers: &[(f32, f32)], per_class: usize) -> (Array2<f32>, Vec<usize>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for (label, &(cx, cy)) in centers.iter().enumerate() {
            for k in 0..per_class {
                let jitter = (k % 4) as f32 * 0.1;
                data.extend_from_slice(&[cx + jitter, cy - jitter]);
                y.push(label);
            }
        }
        (Array2::from_shape_vec((y.len(), 2), data).unwrap(), y)
    }

    #[test]
    fn separates_two_blobs() {
        let (x, y) = blobs(&[(0.0, 0.0), (6.0, 6.0)], 10);
        let mut model = SvmClassifier::new(1.0, 1e-3);
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.machines.len(), 1);
        assert_eq!(model.predict(&x), y);
    }

    #[test]
    fn three_classes_go_one_vs_rest() {
        let (x, y) = blobs(&[(0.0, 0.0), (6.0, 0.0), (0.0, 6.0)], 10);
        let mut model = SvmClassifier::new(1.0, 1e-3);
        model.fit(&x, &y, 3).unwrap();
        assert_eq!(model.machines.len(), 3);

        let proba = model.predict_proba(&x);
        for r in 0..x.nrows() {
            let total: f32 = (0..3).map(|c| proba[(r, c)]).sum();
            assert!((total - 1.0).abs() < 1e-4);
        }
        assert_eq!(model.predict(&x), y);
    }

    #[test]
    fn absent_class_has_zero_probability() {
        let (x, y) = blobs(&[(0.0, 0.0), (6.0, 6.0)], 8);
        let mut model = SvmClassifier::new(1.0, 1e-3);
        model.fit(&x, &y, 3).unwrap();
        assert!(matches!(model.machines[2], Machine::Constant(p) if p == 0.0));
        let proba = model.predict_proba(&x);
        assert_eq!(proba[(0, 2)], 0.0);
    }

    #[test]
    fn single_class_is_rejected() {
        let (x, y) = blobs(&[(0.0, 0.0)], 4);
        assert!(SvmClassifier::new(1.0, 1e-3).fit(&x, &y, 1).is_err());
    }
}
