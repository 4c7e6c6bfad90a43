//! Causal multi-head self-attention with RoPE and a KV cache.

use crate::api::error::{NnError, NnResult};
use crate::api::types::BlockDims;
use crate::core::kv_cache::KVCache;
use crate::core::rope::{RoPEFreqs, ROPE_THETA};
use daiso_core::{dot, matmul, matvec, softmax_in_place, Tensor, TensorError};

/// Per-layer self-attention.
///
/// Q, K, V and O projections are all `[dim, dim]`. Each query head reads the
/// key/value head with the same index; `n_kv_heads` is validated but keys and
/// values are not shared across query groups.
#[derive(Debug, Clone)]
pub struct Attention {
    wq: Tensor,
    wk: Tensor,
    wv: Tensor,
    wo: Tensor,
    dim: usize,
    n_heads: usize,
    n_kv_heads: usize,
    head_dim: usize,
    rope: RoPEFreqs,
}

impl Attention {
    /// Build from pre-loaded projection weights.
    pub fn from_weights(dims: &BlockDims, wq: Tensor, wk: Tensor, wv: Tensor, wo: Tensor) -> NnResult<Self> {
        dims.validate()?;
        let dim = dims.dim;
        for (name, w) in [("wq", &wq), ("wk", &wk), ("wv", &wv), ("wo", &wo)] {
            if w.shape() != [dim, dim] {
                return Err(NnError::ShapeMismatch(format!(
                    "{} must be [{}, {}], got {:?}",
                    name,
                    dim,
                    dim,
                    w.shape()
                )));
            }
        }
        let head_dim = dims.head_dim();
        Ok(Self {
            wq,
            wk,
            wv,
            wo,
            dim,
            n_heads: dims.n_heads,
            n_kv_heads: dims.n_kv_heads,
            head_dim,
            rope: RoPEFreqs::new(head_dim, dims.seq_len, ROPE_THETA)?,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn n_heads(&self) -> usize {
        self.n_heads
    }

    pub fn n_kv_heads(&self) -> usize {
        self.n_kv_heads
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    /// Attend from the token at `position` over cached positions `0..=position`.
    ///
    /// Writes this position's rotated key and raw value into `cache` before
    /// reading it, then writes the projected result into `out`.
    pub fn forward(
        &self,
        out: &mut Tensor,
        input: &Tensor,
        position: usize,
        layer: usize,
        cache: &mut KVCache,
    ) -> NnResult<()> {
        self.check_vector(input)?;
        self.check_vector(out)?;
        if cache.dim() != self.dim {
            return Err(NnError::ShapeMismatch(format!(
                "KV cache width {} does not match attention dim {}",
                cache.dim(),
                self.dim
            )));
        }

        let x = input.data();
        let mut q = vec![0.0f32; self.dim];
        let mut k = vec![0.0f32; self.dim];
        let mut v = vec![0.0f32; self.dim];
        matvec(&mut q, self.wq.data(), x)?;
        matvec(&mut k, self.wk.data(), x)?;
        matvec(&mut v, self.wv.data(), x)?;

        self.rope.apply(&mut q, position)?;
        self.rope.apply(&mut k, position)?;
        cache.append(layer, position, &k, &v)?;

        let keys = cache.keys(layer)?;
        let values = cache.values(layer)?;
        let mut y = vec![0.0f32; self.dim];
        let mut scores = vec![0.0f32; position + 1];
        self.attend_head_range(&q, keys, values, &mut scores, &mut y);

        matvec(out.data_mut(), self.wo.data(), &y)?;
        Ok(())
    }

    /// Full causal attention over a `[n, dim]` sequence at positions `0..n`.
    ///
    /// Does not touch any cache. Produces the same rows as calling
    /// [`forward`](Self::forward) for positions `0..n` in order.
    pub fn forward_sequence(&self, input: &Tensor) -> NnResult<Tensor> {
        let n = match input.shape() {
            [n, d] if *d == self.dim => *n,
            other => {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![0, self.dim],
                    got: other.to_vec(),
                }
                .into())
            }
        };

        let mut q = Tensor::new([n, self.dim])?;
        let mut k = Tensor::new([n, self.dim])?;
        let mut v = Tensor::new([n, self.dim])?;
        matmul(&mut q, input, &self.wq.transpose()?)?;
        matmul(&mut k, input, &self.wk.transpose()?)?;
        matmul(&mut v, input, &self.wv.transpose()?)?;
        for pos in 0..n {
            self.rope.apply(q.row_mut(pos)?, pos)?;
            self.rope.apply(k.row_mut(pos)?, pos)?;
        }

        let mut y = Tensor::new([n, self.dim])?;
        let mut scores = vec![0.0f32; n];
        for pos in 0..n {
            let keys = &k.data()[..(pos + 1) * self.dim];
            let values = &v.data()[..(pos + 1) * self.dim];
            self.attend_head_range(q.row(pos)?, keys, values, &mut scores[..=pos], y.row_mut(pos)?);
        }

        let mut out = Tensor::new([n, self.dim])?;
        matmul(&mut out, &y, &self.wo.transpose()?)?;
        Ok(out)
    }

    /// For each head: scaled dot-product scores of `q` against every cached
    /// key row, softmax, then the weighted sum of value rows into `y`.
    fn attend_head_range(&self, q: &[f32], keys: &[f32], values: &[f32], scores: &mut [f32], y: &mut [f32]) {
        let hd = self.head_dim;
        let scale = (hd as f32).sqrt();
        for h in 0..self.n_heads {
            let lo = h * hd;
            let q_head = &q[lo..lo + hd];

            for (score, k_row) in scores.iter_mut().zip(keys.chunks_exact(self.dim)) {
                *score = dot(q_head, &k_row[lo..lo + hd]) / scale;
            }
            softmax_in_place(scores);

            let y_head = &mut y[lo..lo + hd];
            y_head.fill(0.0);
            for (&weight, v_row) in scores.iter().zip(values.chunks_exact(self.dim)) {
                for (acc, &val) in y_head.iter_mut().zip(&v_row[lo..lo + hd]) {
                    *acc += weight * val;
                }
            }
        }
    }

    fn check_vector(&self, t: &Tensor) -> NnResult<()> {
        if t.shape() != [self.dim] {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.dim],
                got: t.shape().to_vec(),
            }
            .into());
        }
        Ok(())
    }
}
