//! Gated (SwiGLU) feed-forward network.

use crate::api::error::{NnError, NnResult};
use daiso_core::{matvec, silu, Tensor, TensorError};

/// SwiGLU feed-forward: `out = W2 (silu(W1 x) * (W3 x))`.
#[derive(Debug, Clone)]
pub struct FeedForward {
    /// Gate projection [hidden_dim, dim]
    pub w1: Tensor,
    /// Down projection [dim, hidden_dim]
    pub w2: Tensor,
    /// Up projection [hidden_dim, dim]
    pub w3: Tensor,
    pub dim: usize,
    pub hidden_dim: usize,
}

impl FeedForward {
    /// Build from pre-loaded weights, checking their shapes agree.
    pub fn from_weights(w1: Tensor, w2: Tensor, w3: Tensor) -> NnResult<Self> {
        let (hidden_dim, dim) = match w1.shape() {
            [h, d] => (*h, *d),
            other => {
                return Err(NnError::ShapeMismatch(format!("w1 must be 2D, got {:?}", other)));
            }
        };
        if w3.shape() != [hidden_dim, dim] {
            return Err(NnError::ShapeMismatch(format!(
                "w3 must be [{}, {}], got {:?}",
                hidden_dim,
                dim,
                w3.shape()
            )));
        }
        if w2.shape() != [dim, hidden_dim] {
            return Err(NnError::ShapeMismatch(format!(
                "w2 must be [{}, {}], got {:?}",
                dim,
                hidden_dim,
                w2.shape()
            )));
        }
        Ok(Self { w1, w2, w3, dim, hidden_dim })
    }

    /// Forward pass for one `[dim]` vector into a `[dim]` output.
    pub fn forward(&self, out: &mut Tensor, input: &Tensor) -> NnResult<()> {
        for t in [&*out, input] {
            if t.shape() != [self.dim] {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![self.dim],
                    got: t.shape().to_vec(),
                }
                .into());
            }
        }
        let x = input.data();
        let mut h = vec![0.0f32; self.hidden_dim];
        let mut g = vec![0.0f32; self.hidden_dim];
        matvec(&mut h, self.w1.data(), x)?;
        matvec(&mut g, self.w3.data(), x)?;
        for (hv, &gv) in h.iter_mut().zip(&g) {
            *hv = silu(*hv) * gv;
        }
        matvec(out.data_mut(), self.w2.data(), &h)?;
        Ok(())
    }
}
