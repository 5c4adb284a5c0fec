//! modelsweep: benchmark a family of models against one target column.
//!
//! The crate covers the whole path from a delimited table on disk to
//! per-model evaluation artifacts: loading and categorical encoding
//! (`io`, `preprocessing`), target resolution and binning (`target`), the
//! sweep loop itself (`sweep`) and a cross-validating trainer with a small
//! model zoo behind it (`trainer`, `models`, `cross_validation`, `stats`).
//!
//! The sweep only talks to training code through the [`sweep::Trainer`]
//! trait, so the orchestration can be exercised without fitting anything.
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod preprocessing;
pub mod stats;
pub mod sweep;
pub mod target;
pub mod trainer;
