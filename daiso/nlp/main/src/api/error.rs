//! Error types for model loading and generation

use daiso_core::{ErrorKind, TensorError};
use daiso_nn::NnError;
use thiserror::Error;

/// Result type for model loading and generation
pub type NlpResult<T> = Result<T, NlpError>;

/// Errors that can occur while loading a model or generating from it
#[derive(Error, Debug)]
pub enum NlpError {
    #[error("Tensor error: {0}")]
    TensorError(#[from] TensorError),

    #[error("Neural network error: {0}")]
    NnError(#[from] NnError),

    #[error("Bad magic number: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("Unsupported format version {found} (expected {expected})")]
    UnsupportedVersion { expected: i32, found: i32 },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Model file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Model file has {extra} unexpected trailing bytes after {expected} bytes")]
    TrailingBytes { expected: usize, extra: usize },

    #[error("Cannot open model file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Prompt of {len} tokens exceeds sequence length {seq_len}")]
    PromptTooLong { len: usize, seq_len: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Tokenizer error: {0}")]
    TokenizerError(String),
}

impl NlpError {
    /// Classify this error as a format, shape or range failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NlpError::TensorError(e) => e.kind(),
            NlpError::NnError(e) => e.kind(),
            NlpError::BadMagic { .. }
            | NlpError::UnsupportedVersion { .. }
            | NlpError::InvalidHeader(_)
            | NlpError::Truncated { .. }
            | NlpError::TrailingBytes { .. }
            | NlpError::Open { .. }
            | NlpError::IoError(_) => ErrorKind::Format,
            NlpError::PromptTooLong { .. }
            | NlpError::InvalidConfig(_)
            | NlpError::TokenizerError(_) => ErrorKind::Range,
        }
    }
}
