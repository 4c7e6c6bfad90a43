//! Error types for neural network operations

use daiso_core::{ErrorKind, TensorError};
use thiserror::Error;

/// Result type for neural network operations
pub type NnResult<T> = Result<T, NnError>;

/// Errors that can occur in neural network operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NnError {
    #[error("Tensor error: {0}")]
    TensorError(#[from] TensorError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Token {token} out of range for vocabulary of {vocab_size}")]
    TokenOutOfRange { token: u32, vocab_size: usize },

    #[error("Position {position} out of range for sequence length {seq_len}")]
    PositionOutOfRange { position: usize, seq_len: usize },

    #[error("Layer {layer} out of range for {n_layers} layers")]
    LayerOutOfRange { layer: usize, n_layers: usize },

    #[error("KV cache for layer {layer} expects position {expected}, got {position}")]
    CacheOrder {
        layer: usize,
        position: usize,
        expected: usize,
    },
}

impl NnError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NnError::TensorError(e) => e.kind(),
            NnError::InvalidConfig(_) | NnError::ShapeMismatch(_) => ErrorKind::Shape,
            NnError::TokenOutOfRange { .. }
            | NnError::PositionOutOfRange { .. }
            | NnError::LayerOutOfRange { .. }
            | NnError::CacheOrder { .. } => ErrorKind::Range,
        }
    }
}
