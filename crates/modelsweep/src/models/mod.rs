pub mod adaboost;
pub mod factory;
pub mod forest;
pub mod gbdt;
pub mod knn;
pub mod linear;
pub mod logistic;
pub mod model_trait;
pub mod naive_bayes;
pub mod one_vs_rest;
pub mod svm;

pub use factory::{build_classifier, build_regressor, ModelKind};
pub use model_trait::{Classifier, Regressor};
