//! Dense row-major matrix used for feature data.
//!
//! Kept deliberately small: models only need row access, column
//! extraction and row/column selection for fold slicing.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
