//! Error types for tensor operations

use thiserror::Error;

/// Result type for tensor operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Coarse error classification shared by every crate in the workspace.
///
/// Each crate's error enum maps onto one of these through a `kind()` method,
/// so callers can tell a malformed file from a bad shape or an out-of-range
/// index without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unreadable model file
    Format,
    /// Tensor rank or dimension mismatch
    Shape,
    /// Index, token ID or position outside its legal range
    Range,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Format => write!(f, "format"),
            ErrorKind::Shape => write!(f, "shape"),
            ErrorKind::Range => write!(f, "range"),
        }
    }
}

/// Errors that can occur during tensor operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("Invalid shape {0:?}: every dimension must be at least 1")]
    ZeroDimension(Vec<usize>),

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("Rank mismatch: expected a {expected}-D tensor, got {got}-D")]
    RankMismatch { expected: usize, got: usize },

    #[error("Cannot reshape {from:?} into {to:?}: element count differs")]
    ReshapeMismatch { from: Vec<usize>, to: Vec<usize> },

    #[error("Matrix multiplication dimension mismatch: {left} vs {right}")]
    MatmulDimensionMismatch { left: usize, right: usize },

    #[error("Index {index} out of bounds for dimension {dim} with size {size}")]
    IndexOutOfBounds { dim: usize, index: usize, size: usize },

    #[error("Range {offset}..{end} out of bounds for arena of {len} elements")]
    ArenaOutOfBounds { offset: usize, end: usize, len: usize },
}

impl TensorError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TensorError::IndexOutOfBounds { .. } | TensorError::ArenaOutOfBounds { .. } => {
                ErrorKind::Range
            }
            _ => ErrorKind::Shape,
        }
    }
}
