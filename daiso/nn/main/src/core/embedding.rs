//! Embedding layer implementation

use crate::api::error::{NnError, NnResult};
use daiso_core::{Tensor, TensorError};

/// Embedding layer that maps token IDs to dense vectors
#[derive(Debug, Clone)]
pub struct Embedding {
    /// Embedding weight matrix [num_embeddings, embedding_dim]
    pub weight: Tensor,
    /// Number of embeddings (vocabulary size)
    pub num_embeddings: usize,
    /// Embedding dimension
    pub embedding_dim: usize,
}

impl Embedding {
    /// Create an embedding layer from existing weights
    pub fn from_weights(weight: Tensor) -> NnResult<Self> {
        let shape = weight.shape();
        if shape.len() != 2 {
            return Err(NnError::InvalidConfig(format!(
                "Embedding weight must be 2D, got {:?}",
                shape
            )));
        }

        Ok(Self {
            num_embeddings: shape[0],
            embedding_dim: shape[1],
            weight,
        })
    }

    /// Copy row `token` of the table into the 1-D `out` buffer.
    pub fn forward(&self, out: &mut Tensor, token: u32) -> NnResult<()> {
        if out.shape() != [self.embedding_dim] {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.embedding_dim],
                got: out.shape().to_vec(),
            }
            .into());
        }
        let idx = token as usize;
        if idx >= self.num_embeddings {
            return Err(NnError::TokenOutOfRange {
                token,
                vocab_size: self.num_embeddings,
            });
        }
        out.data_mut().copy_from_slice(self.weight.row(idx)?);
        Ok(())
    }
}
