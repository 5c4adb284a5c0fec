use anyhow::{bail, Context, Result};
use statrs::distribution::{Continuous, Normal};

use crate::math::Array2;
use crate::models::model_trait::Classifier;

/// Fraction of the largest feature variance added to every variance.
const VAR_SMOOTHING: f64 = 1e-9;

struct ClassModel {
    log_prior: f64,
    features: Vec<Normal>,
}

/// Gaussian naive Bayes. Classes absent from the training fold get zero
/// probability.
pub struct GaussianNb {
    classes: Vec<Option<ClassModel>>,
}

impl GaussianNb {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
        }
    }
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new()
    }
}

fn mean_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

impl Classifier for GaussianNb {
    fn fit(&mut self, x: &Array2<f32>, y: &[usize], n_classes: usize) -> Result<()> {
        let (n, d) = x.shape();
        if n == 0 {
            bail!("Cannot fit naive Bayes on an empty training set");
        }

        let columns: Vec<Vec<f64>> = (0..d)
            .map(|c| x.column(c).into_iter().map(f64::from).collect())
            .collect();
        let max_var = columns
            .iter()
            .map(|col| mean_var(col).1)
            .fold(0.0f64, f64::max);
        let epsilon = (VAR_SMOOTHING * max_var).max(1e-12);

        let mut classes = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let rows: Vec<usize> = (0..n).filter(|&i| y[i] == class).collect();
            if rows.is_empty() {
                classes.push(None);
                continue;
            }
            let mut features = Vec::with_capacity(d);
            for col in &columns {
                let values: Vec<f64> = rows.iter().map(|&i| col[i]).collect();
                let (mean, var) = mean_var(&values);
                let normal = Normal::new(mean, (var + epsilon).sqrt()).with_context(|| {
                    format!("Invalid Gaussian for class {} (mean {}, var {})", class, mean, var)
                })?;
                features.push(normal);
            }
            classes.push(Some(ClassModel {
                log_prior: (rows.len() as f64 / n as f64).ln(),
                features,
            }));
        }

        self.classes = classes;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Array2<f32> {
        let mut proba = Array2::from_elem(x.nrows(), self.classes.len(), 0.0f32);
        for (r, row) in x.rows().enumerate() {
            let log_joint: Vec<Option<f64>> = self
                .classes
                .iter()
                .map(|model| {
                    model.as_ref().map(|m| {
                        m.log_prior
                            + m.features
                                .iter()
                                .zip(row)
                                .map(|(normal, &v)| normal.ln_pdf(v as f64))
                                .sum::<f64>()
                    })
                })
                .collect();

            let max = log_joint
                .iter()
                .flatten()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let total: f64 = log_joint.iter().flatten().map(|l| (l - max).exp()).sum();
            for (c, l) in log_joint.iter().enumerate() {
                if let Some(l) = l {
                    proba[(r, c)] = ((l - max).exp() / total) as f32;
                }
            }
        }
        proba
    }

    fn name(&self) -> &str {
        "gaussian_nb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_gaussian_blobs() {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![
                0.0, 0.1, // class 0
                0.2, 0.0,
                0.1, 0.2,
                5.0, 5.1, // class 1
                5.2, 4.9,
                4.9, 5.0,
            ],
        )
        .unwrap();
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut model = GaussianNb::new();
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.predict(&x), y);
    }

    #[test]
    fn absent_class_has_zero_probability() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let mut model = GaussianNb::new();
        model.fit(&x, &[0, 2], 3).unwrap();
        let proba = model.predict_proba(&x);
        assert_eq!(proba[(0, 1)], 0.0);
    }
}
