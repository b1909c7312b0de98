use thiserror::Error;

/// Error type shared by every algorithm crate.
///
/// All variants are local and deterministic: the same input always yields
/// the same error, so retrying is never meaningful.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MlError {
    #[error("Singular matrix: pivot {pivot:e} in column {column} is below tolerance")]
    SingularMatrix { column: usize, pivot: f64 },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Invalid hyperparameter `{name}`: {reason}")]
    InvalidHyperparameter { name: &'static str, reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Point {index} has no label")]
    MissingLabel { index: usize },

    #[error("Point {index} has a label that is not a non-negative integer class id")]
    InvalidLabel { index: usize },
}

impl MlError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        MlError::InvalidHyperparameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type MlResult<T> = Result<T, MlError>;
