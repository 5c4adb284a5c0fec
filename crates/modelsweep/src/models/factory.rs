use std::str::FromStr;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::models::adaboost::AdaBoost;
use crate::models::forest::RandomForest;
use crate::models::gbdt::GbdtRegressor;
use crate::models::knn::{KnnClassifier, KnnRegressor};
use crate::models::linear::ElasticNet;
use crate::models::logistic::LogisticRegression;
use crate::models::model_trait::{Classifier, Regressor};
use crate::models::naive_bayes::GaussianNb;
use crate::models::one_vs_rest::OneVsRest;
use crate::models::svm::SvmClassifier;

/// Supported model families and their hyper-parameters.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum ModelKind {
    Boosting {
        rounds: usize,
        max_depth: u32,
        learning_rate: f32,
        min_leaf_size: usize,
    },
    RandomForest {
        trees: usize,
        max_depth: u32,
        feature_fraction: f64,
    },
    AdaBoost {
        rounds: usize,
        max_depth: u32,
    },
    ElasticNet {
        alpha: f64,
        l1_ratio: f64,
    },
    Logistic {
        l2: f64,
        iterations: usize,
    },
    Knn {
        k: usize,
    },
    NaiveBayes,
    Svm {
        c: f64,
        eps: f64,
    },
}

impl ModelKind {
    fn boosting(rounds: usize, learning_rate: f32) -> Self {
        ModelKind::Boosting {
            rounds,
            max_depth: 6,
            learning_rate,
            min_leaf_size: 1,
        }
    }

    fn forest(trees: usize) -> Self {
        ModelKind::RandomForest {
            trees,
            max_depth: 12,
            feature_fraction: 1.0 / 3.0,
        }
    }

    pub fn supports_regression(&self) -> bool {
        !matches!(
            self,
            ModelKind::Logistic { .. } | ModelKind::NaiveBayes | ModelKind::Svm { .. }
        )
    }

    pub fn supports_classification(&self) -> bool {
        !matches!(self, ModelKind::ElasticNet { .. })
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xgboost" | "xgb" => Ok(ModelKind::boosting(100, 0.1)),
            "xgb.1k" => Ok(ModelKind::boosting(1_000, 0.05)),
            "xgb.10k" => Ok(ModelKind::boosting(10_000, 0.01)),
            "lightgbm" | "lgbm" => Ok(ModelKind::Boosting {
                rounds: 200,
                max_depth: 4,
                learning_rate: 0.1,
                min_leaf_size: 20,
            }),
            "randomforest" | "rf" => Ok(ModelKind::forest(100)),
            "rf.1k" => Ok(ModelKind::forest(1_000)),
            "rf.10k" => Ok(ModelKind::forest(10_000)),
            "adaboost" => Ok(ModelKind::AdaBoost {
                rounds: 50,
                max_depth: 3,
            }),
            "linear" => Ok(ModelKind::ElasticNet {
                alpha: 0.0,
                l1_ratio: 0.0,
            }),
            "ridge" => Ok(ModelKind::ElasticNet {
                alpha: 1.0,
                l1_ratio: 0.0,
            }),
            "lasso" => Ok(ModelKind::ElasticNet {
                alpha: 1.0,
                l1_ratio: 1.0,
            }),
            "elasticnet" => Ok(ModelKind::ElasticNet {
                alpha: 1.0,
                l1_ratio: 0.5,
            }),
            "logistic" => Ok(ModelKind::Logistic {
                l2: 1e-4,
                iterations: 500,
            }),
            "knn" => Ok(ModelKind::Knn { k: 5 }),
            // "Gaussian" names Gaussian naive Bayes, not a Gaussian process.
            "bayes" | "gaussian" | "naivebayes" => Ok(ModelKind::NaiveBayes),
            "svm" => Ok(ModelKind::Svm { c: 1.0, eps: 1e-3 }),
            _ => Err(format!(
                "Unknown model: {}. Known models: XGBoost, XGB.1K, XGB.10K, LightGBM, \
                 RandomForest, RF.1K, RF.10K, AdaBoost, Linear, Ridge, Lasso, ElasticNet, \
                 Logistic, KNN, Bayes, Gaussian, SVM",
                s
            )),
        }
    }
}

/// Build a boxed regressor for `kind`; `seed` drives any sampling.
pub fn build_regressor(kind: &ModelKind, seed: u64) -> Result<Box<dyn Regressor>> {
    let model: Box<dyn Regressor> = match kind {
        ModelKind::Boosting { .. } => Box::new(GbdtRegressor::new(kind.clone())),
        ModelKind::RandomForest { .. } => Box::new(RandomForest::new(kind.clone(), seed)),
        ModelKind::AdaBoost { .. } => Box::new(AdaBoost::new(kind.clone(), seed)),
        ModelKind::ElasticNet { alpha, l1_ratio } => Box::new(ElasticNet::new(*alpha, *l1_ratio)),
        ModelKind::Knn { k } => Box::new(KnnRegressor::new(*k)),
        ModelKind::Logistic { .. } | ModelKind::NaiveBayes | ModelKind::Svm { .. } => {
            bail!("{:?} is a classification-only model", kind)
        }
    };
    Ok(model)
}

/// Build a boxed classifier for `kind`. Tree ensembles, AdaBoost included,
/// are fitted one-vs-rest.
pub fn build_classifier(kind: &ModelKind, seed: u64) -> Result<Box<dyn Classifier>> {
    let model: Box<dyn Classifier> = match kind {
        ModelKind::Boosting { .. }
        | ModelKind::RandomForest { .. }
        | ModelKind::AdaBoost { .. } => Box::new(OneVsRest::new(kind.clone(), seed)),
        ModelKind::Logistic { l2, iterations } => {
            Box::new(LogisticRegression::new(*l2, *iterations))
        }
        ModelKind::Knn { k } => Box::new(KnnClassifier::new(*k)),
        ModelKind::NaiveBayes => Box::new(GaussianNb::new()),
        ModelKind::Svm { c, eps } => Box::new(SvmClassifier::new(*c, *eps)),
        ModelKind::ElasticNet { .. } => bail!("{:?} is a regression-only model", kind),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(
            ModelKind::from_str("XGB.1k").unwrap(),
            ModelKind::from_str("xgb.1K").unwrap()
        );
        assert!(matches!(
            ModelKind::from_str("RandomForest").unwrap(),
            ModelKind::RandomForest { trees: 100, .. }
        ));
    }

    #[test]
    fn adaboost_serves_both_tasks() {
        let ada = ModelKind::from_str("AdaBoost").unwrap();
        assert_eq!(
            ada,
            ModelKind::AdaBoost {
                rounds: 50,
                max_depth: 3
            }
        );
        assert!(ada.supports_regression() && ada.supports_classification());
        assert!(build_regressor(&ada, 0).is_ok());
        assert!(build_classifier(&ada, 0).is_ok());
    }

    #[test]
    fn gaussian_is_naive_bayes() {
        assert_eq!(ModelKind::from_str("Gaussian").unwrap(), ModelKind::NaiveBayes);
    }

    #[test]
    fn unknown_name_lists_known_models() {
        let err = ModelKind::from_str("GaussianProcess").unwrap_err();
        assert!(err.contains("GaussianProcess"));
        assert!(err.contains("LightGBM"));
        assert!(err.contains("SVM"));
    }

    #[test]
    fn task_support_is_enforced() {
        let bayes = ModelKind::from_str("Bayes").unwrap();
        assert!(!bayes.supports_regression());
        assert!(build_regressor(&bayes, 0).is_err());
        assert!(build_classifier(&bayes, 0).is_ok());

        let svm = ModelKind::from_str("SVM").unwrap();
        assert!(!svm.supports_regression());
        assert!(build_regressor(&svm, 0).is_err());
        assert!(build_classifier(&svm, 0).is_ok());

        let lasso = ModelKind::from_str("Lasso").unwrap();
        assert!(!lasso.supports_classification());
        assert!(build_classifier(&lasso, 0).is_err());
    }
}
