//! Transformer block: pre-norm architecture with self-attention + FFN.

use crate::api::error::{NnError, NnResult};
use crate::core::attention::Attention;
use crate::core::feed_forward::FeedForward;
use crate::core::kv_cache::KVCache;
use crate::core::rms_norm::RMSNorm;
use daiso_core::{add_in_place, Tensor};

/// Reusable `[dim]` activation buffers threaded through every block.
///
/// `x` carries the residual stream; `xb` and `xb2` hold the normalized input
/// and the sub-layer output of the current step.
#[derive(Debug, Clone)]
pub struct Activations {
    pub x: Tensor,
    pub xb: Tensor,
    pub xb2: Tensor,
}

impl Activations {
    pub fn new(dim: usize) -> NnResult<Self> {
        Ok(Self {
            x: Tensor::new([dim])?,
            xb: Tensor::new([dim])?,
            xb2: Tensor::new([dim])?,
        })
    }
}

/// A single transformer block with pre-norm architecture.
///
/// Structure: x -> attention_norm -> attention -> + -> ffn_norm -> feed_forward -> +
#[derive(Debug, Clone)]
pub struct TransformerBlock {
    pub attention_norm: RMSNorm,
    pub attention: Attention,
    pub ffn_norm: RMSNorm,
    pub feed_forward: FeedForward,
}

impl TransformerBlock {
    pub fn new(
        attention_norm: RMSNorm,
        attention: Attention,
        ffn_norm: RMSNorm,
        feed_forward: FeedForward,
    ) -> NnResult<Self> {
        let dim = attention.dim();
        if attention_norm.dim() != dim || ffn_norm.dim() != dim || feed_forward.dim != dim {
            return Err(NnError::ShapeMismatch(format!(
                "block dims disagree: attention {}, attention_norm {}, ffn_norm {}, feed_forward {}",
                dim,
                attention_norm.dim(),
                ffn_norm.dim(),
                feed_forward.dim
            )));
        }
        Ok(Self {
            attention_norm,
            attention,
            ffn_norm,
            feed_forward,
        })
    }

    pub fn dim(&self) -> usize {
        self.attention.dim()
    }

    /// Advance the residual stream `act.x` by one block at `position`.
    pub fn forward(
        &self,
        act: &mut Activations,
        position: usize,
        layer: usize,
        cache: &mut KVCache,
    ) -> NnResult<()> {
        self.attention_norm.forward(&mut act.xb, &act.x)?;
        self.attention
            .forward(&mut act.xb2, &act.xb, position, layer, cache)?;
        add_in_place(act.x.data_mut(), act.xb2.data())?;

        self.ffn_norm.forward(&mut act.xb, &act.x)?;
        self.feed_forward.forward(&mut act.xb2, &act.xb)?;
        add_in_place(act.x.data_mut(), act.xb2.data())?;
        Ok(())
    }

    /// Advance a `[n, dim]` residual stream for positions `0..n` without a cache.
    pub fn forward_sequence(&self, x: &mut Tensor) -> NnResult<()> {
        let normed = self.attention_norm.forward_rows(x)?;
        let attended = self.attention.forward_sequence(&normed)?;
        add_in_place(x.data_mut(), attended.data())?;

        let dim = self.dim();
        let normed = self.ffn_norm.forward_rows(x)?;
        let mut row_in = Tensor::new([dim])?;
        let mut row_out = Tensor::new([dim])?;
        for (row, src) in x.data_mut().chunks_exact_mut(dim).zip(normed.data().chunks_exact(dim)) {
            row_in.data_mut().copy_from_slice(src);
            self.feed_forward.forward(&mut row_out, &row_in)?;
            add_in_place(row, row_out.data())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::BlockDims;
    use crate::core::rms_norm::RMS_NORM_EPS;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const DIMS: BlockDims = BlockDims { dim: 8, hidden_dim: 12, n_heads: 2, n_kv_heads: 2, seq_len: 5 };

    fn random(rng: &mut StdRng, shape: &[usize]) -> Tensor {
        let n: usize = shape.iter().product();
        let data = (0..n).map(|_| rng.gen_range(-0.4..0.4)).collect();
        Tensor::from_vec(data, shape.to_vec()).unwrap()
    }

    fn random_block(seed: u64) -> TransformerBlock {
        let mut rng = StdRng::seed_from_u64(seed);
        let (d, h) = (DIMS.dim, DIMS.hidden_dim);
        let attention = Attention::from_weights(
            &DIMS,
            random(&mut rng, &[d, d]),
            random(&mut rng, &[d, d]),
            random(&mut rng, &[d, d]),
            random(&mut rng, &[d, d]),
        )
        .unwrap();
        let feed_forward = FeedForward::from_weights(
            random(&mut rng, &[h, d]),
            random(&mut rng, &[d, h]),
            random(&mut rng, &[h, d]),
        )
        .unwrap();
        TransformerBlock::new(
            RMSNorm::from_weight(random(&mut rng, &[d]), RMS_NORM_EPS).unwrap(),
            attention,
            RMSNorm::from_weight(random(&mut rng, &[d]), RMS_NORM_EPS).unwrap(),
            feed_forward,
        )
        .unwrap()
    }

    #[test]
    fn test_transformer_block_with_cache() {
        let block = random_block(3);
        let mut act = Activations::new(DIMS.dim).unwrap();
        let mut cache = KVCache::new(1, DIMS.seq_len, DIMS.dim).unwrap();
        act.x.data_mut().copy_from_slice(&[0.5, -0.1, 0.2, 0.0, 0.3, -0.7, 0.9, 0.1]);
        block.forward(&mut act, 0, 0, &mut cache).unwrap();
        assert_eq!(act.x.shape(), &[8]);
        assert!(act.x.data().iter().all(|v| v.is_finite()));
        assert_eq!(cache.len(0).unwrap(), 1);
    }

    #[test]
    fn test_transformer_block_incremental_matches_sequence() {
        let block = random_block(11);
        let mut rng = StdRng::seed_from_u64(5);
        let inputs = random(&mut rng, &[4, DIMS.dim]);

        let mut batch = inputs.clone();
        block.forward_sequence(&mut batch).unwrap();

        let mut act = Activations::new(DIMS.dim).unwrap();
        let mut cache = KVCache::new(1, DIMS.seq_len, DIMS.dim).unwrap();
        for pos in 0..4 {
            act.x.data_mut().copy_from_slice(inputs.row(pos).unwrap());
            block.forward(&mut act, pos, 0, &mut cache).unwrap();
            for (a, b) in act.x.data().iter().zip(batch.row(pos).unwrap()) {
                assert!((a - b).abs() < 1e-5, "pos {}: {} vs {}", pos, a, b);
            }
        }
    }

    #[test]
    fn test_transformer_block_rejects_mismatched_parts() {
        let block = random_block(1);
        let err = TransformerBlock::new(
            RMSNorm::new(4).unwrap(),
            block.attention.clone(),
            block.ffn_norm.clone(),
            block.feed_forward.clone(),
        );
        assert!(err.is_err());
    }
}
