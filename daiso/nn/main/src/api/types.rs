//! Types for neural network layers

use crate::api::error::{NnError, NnResult};

/// Dimensions shared by every layer of a decoder stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDims {
    /// Model (residual stream) width
    pub dim: usize,
    /// Feed-forward inner width
    pub hidden_dim: usize,
    pub n_heads: usize,
    /// Key/value heads. Attention currently uses one key/value head per query head.
    pub n_kv_heads: usize,
    /// Maximum sequence length (KV cache and RoPE table capacity)
    pub seq_len: usize,
}

impl BlockDims {
    pub fn head_dim(&self) -> usize {
        self.dim / self.n_heads
    }

    pub fn validate(&self) -> NnResult<()> {
        if self.dim == 0 || self.hidden_dim == 0 || self.seq_len == 0 {
            return Err(NnError::InvalidConfig(format!(
                "dim ({}), hidden_dim ({}) and seq_len ({}) must be positive",
                self.dim, self.hidden_dim, self.seq_len
            )));
        }
        if self.n_heads == 0 || self.dim % self.n_heads != 0 {
            return Err(NnError::InvalidConfig(format!(
                "dim ({}) must be divisible by n_heads ({})",
                self.dim, self.n_heads
            )));
        }
        if self.head_dim() % 2 != 0 {
            return Err(NnError::InvalidConfig(format!(
                "head_dim ({}) must be even for rotary embedding",
                self.head_dim()
            )));
        }
        if self.n_kv_heads == 0 || self.n_heads % self.n_kv_heads != 0 {
            return Err(NnError::InvalidConfig(format!(
                "n_heads ({}) must be divisible by n_kv_heads ({})",
                self.n_heads, self.n_kv_heads
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> BlockDims {
        BlockDims { dim: 8, hidden_dim: 16, n_heads: 2, n_kv_heads: 2, seq_len: 4 }
    }

    #[test]
    fn test_valid_dims() {
        assert!(dims().validate().is_ok());
        assert_eq!(dims().head_dim(), 4);
    }

    #[test]
    fn test_invalid_dims() {
        assert!(BlockDims { n_heads: 3, ..dims() }.validate().is_err());
        assert!(BlockDims { dim: 6, n_heads: 2, ..dims() }.validate().is_err());
        assert!(BlockDims { n_kv_heads: 0, ..dims() }.validate().is_err());
        assert!(BlockDims { n_heads: 4, n_kv_heads: 3, ..dims() }.validate().is_err());
        assert!(BlockDims { seq_len: 0, ..dims() }.validate().is_err());
    }
}
