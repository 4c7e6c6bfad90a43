//! Rotary Position Encoding (RoPE).
//!
//! Coordinates are rotated in adjacent pairs `(x[2i], x[2i + 1])` within each
//! head, by angle `pos * theta^(-2i / head_dim)`.

use crate::api::error::{NnError, NnResult};

/// Base of the RoPE frequency schedule.
pub const ROPE_THETA: f32 = 10000.0;

/// Precomputed cos/sin tables for Rotary Position Encoding.
#[derive(Debug, Clone)]
pub struct RoPEFreqs {
    cos_table: Vec<f32>, // [max_seq_len, head_dim/2]
    sin_table: Vec<f32>, // [max_seq_len, head_dim/2]
    half_dim: usize,
    max_seq_len: usize,
}

impl RoPEFreqs {
    /// Build cos/sin tables for the given head_dim and maximum sequence length.
    pub fn new(head_dim: usize, max_seq_len: usize, theta: f32) -> NnResult<Self> {
        if head_dim == 0 || head_dim % 2 != 0 {
            return Err(NnError::InvalidConfig(format!(
                "RoPE head_dim ({}) must be even and positive",
                head_dim
            )));
        }
        let half_dim = head_dim / 2;
        let mut cos_table = Vec::with_capacity(max_seq_len * half_dim);
        let mut sin_table = Vec::with_capacity(max_seq_len * half_dim);

        for pos in 0..max_seq_len {
            for i in 0..half_dim {
                let freq = 1.0 / theta.powf(2.0 * i as f32 / head_dim as f32);
                let angle = pos as f32 * freq;
                cos_table.push(angle.cos());
                sin_table.push(angle.sin());
            }
        }

        Ok(Self { cos_table, sin_table, half_dim, max_seq_len })
    }

    pub fn head_dim(&self) -> usize {
        self.half_dim * 2
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Rotate every head of `x` (a multiple of `head_dim` long) at position `pos`.
    pub fn apply(&self, x: &mut [f32], pos: usize) -> NnResult<()> {
        if pos >= self.max_seq_len {
            return Err(NnError::PositionOutOfRange {
                position: pos,
                seq_len: self.max_seq_len,
            });
        }
        let head_dim = self.head_dim();
        if x.len() % head_dim != 0 {
            return Err(NnError::ShapeMismatch(format!(
                "RoPE input length {} is not a multiple of head_dim {}",
                x.len(),
                head_dim
            )));
        }
        let cos = &self.cos_table[pos * self.half_dim..(pos + 1) * self.half_dim];
        let sin = &self.sin_table[pos * self.half_dim..(pos + 1) * self.half_dim];
        for head in x.chunks_exact_mut(head_dim) {
            for (pair, (&c, &s)) in head.chunks_exact_mut(2).zip(cos.iter().zip(sin)) {
                let x0 = pair[0];
                let x1 = pair[1];
                pair[0] = x0 * c - x1 * s;
                pair[1] = x0 * s + x1 * c;
            }
        }
        Ok(())
    }
}
