use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Failures a sweep can end with.
#[derive(Debug)]
pub enum SweepError {
    /// Input table missing, unreadable or malformed.
    DataLoad { path: PathBuf, message: String },
    /// Target column index or name not present in the table, or not numeric.
    InvalidTarget(String),
    /// A grouping column is not present in the table.
    UnknownColumn(String),
    /// Fewer than two bins hold enough rows to classify.
    InsufficientClasses { good_bins: usize },
    /// The trainer failed on one model.
    ModelDispatch { model: String, message: String },
}

impl SweepError {
    /// True for outcomes that end the run without being a failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SweepError::InsufficientClasses { .. })
    }
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SweepError::DataLoad { path, message } => {
                write!(f, "Failed to load data file {}: {}", path.display(), message)
            }
            SweepError::InvalidTarget(reason) => write!(f, "Invalid target column: {}", reason),
            SweepError::UnknownColumn(name) => {
                write!(f, "Grouping column '{}' not found in table", name)
            }
            SweepError::InsufficientClasses { good_bins } => write!(
                f,
                "Not enough classes: {} bin(s) hold enough rows, at least 2 are required",
                good_bins
            ),
            SweepError::ModelDispatch { model, message } => {
                write!(f, "Model '{}' failed: {}", model, message)
            }
        }
    }
}

impl Error for SweepError {}
