//! KV Cache for autoregressive inference.
//!
//! Keys and values each live in one contiguous `[n_layers, seq_len, dim]`
//! tensor. Entries are addressed by `(layer, position)` and appended strictly
//! in position order per layer; nothing is overwritten until `reset`.

use crate::api::error::{NnError, NnResult};
use daiso_core::Tensor;

/// KV Cache storing past keys and values for each layer.
pub struct KVCache {
    keys: Tensor,
    values: Tensor,
    n_layers: usize,
    seq_len: usize,
    dim: usize,
    /// Next free position, per layer.
    filled: Vec<usize>,
}

impl KVCache {
    /// Create a new zeroed cache.
    pub fn new(n_layers: usize, seq_len: usize, dim: usize) -> NnResult<Self> {
        let keys = Tensor::new([n_layers, seq_len, dim])?;
        let values = Tensor::new([n_layers, seq_len, dim])?;
        Ok(Self {
            keys,
            values,
            n_layers,
            seq_len,
            dim,
            filled: vec![0; n_layers],
        })
    }

    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of positions written for `layer`.
    pub fn len(&self, layer: usize) -> NnResult<usize> {
        self.check_layer(layer)?;
        Ok(self.filled[layer])
    }

    /// Whether no layer has any entry.
    pub fn is_empty(&self) -> bool {
        self.filled.iter().all(|&n| n == 0)
    }

    /// Store the key and value for `position` of `layer`.
    ///
    /// `position` must be the layer's next free position.
    pub fn append(&mut self, layer: usize, position: usize, key: &[f32], value: &[f32]) -> NnResult<()> {
        self.check_layer(layer)?;
        if position >= self.seq_len {
            return Err(NnError::PositionOutOfRange {
                position,
                seq_len: self.seq_len,
            });
        }
        let expected = self.filled[layer];
        if position != expected {
            return Err(NnError::CacheOrder { layer, position, expected });
        }
        if key.len() != self.dim || value.len() != self.dim {
            return Err(NnError::ShapeMismatch(format!(
                "KV cache entries must have length {}, got key {} and value {}",
                self.dim,
                key.len(),
                value.len()
            )));
        }

        let offset = self.offset(layer, position);
        self.keys.data_mut()[offset..offset + self.dim].copy_from_slice(key);
        self.values.data_mut()[offset..offset + self.dim].copy_from_slice(value);
        self.filled[layer] += 1;
        Ok(())
    }

    /// Keys written so far for `layer`, as `len(layer)` consecutive rows of `dim`.
    pub fn keys(&self, layer: usize) -> NnResult<&[f32]> {
        self.check_layer(layer)?;
        let start = self.offset(layer, 0);
        Ok(&self.keys.data()[start..start + self.filled[layer] * self.dim])
    }

    /// Values written so far for `layer`, as `len(layer)` consecutive rows of `dim`.
    pub fn values(&self, layer: usize) -> NnResult<&[f32]> {
        self.check_layer(layer)?;
        let start = self.offset(layer, 0);
        Ok(&self.values.data()[start..start + self.filled[layer] * self.dim])
    }

    /// Forget every entry.
    pub fn reset(&mut self) {
        self.keys.fill(0.0);
        self.values.fill(0.0);
        self.filled.iter_mut().for_each(|n| *n = 0);
    }

    fn offset(&self, layer: usize, position: usize) -> usize {
        (layer * self.seq_len + position) * self.dim
    }

    fn check_layer(&self, layer: usize) -> NnResult<()> {
        if layer >= self.n_layers {
            return Err(NnError::LayerOutOfRange {
                layer,
                n_layers: self.n_layers,
            });
        }
        Ok(())
    }
}
