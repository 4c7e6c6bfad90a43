//! Public configuration and event types

use std::path::Path;
use std::time::Duration;

use daiso_nn::BlockDims;
use serde::{Deserialize, Serialize};

use crate::api::error::{NlpError, NlpResult};
use crate::api::traits::Sampler;
use crate::core::sampler::{GreedySampler, RandomSampler};

/// Model hyperparameters, as stored in the model file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Residual stream width
    pub dim: usize,
    /// Feed-forward inner width
    pub hidden_dim: usize,
    pub n_layers: usize,
    pub n_heads: usize,
    pub n_kv_heads: usize,
    pub vocab_size: usize,
    /// Maximum sequence length
    pub seq_len: usize,
}

impl ModelConfig {
    /// Small default used for generated test models.
    pub fn dummy() -> Self {
        Self {
            dim: 288,
            hidden_dim: 768,
            n_layers: 6,
            n_heads: 6,
            n_kv_heads: 6,
            vocab_size: 1024,
            seq_len: 256,
        }
    }

    pub fn head_dim(&self) -> usize {
        self.dim / self.n_heads
    }

    pub fn block_dims(&self) -> BlockDims {
        BlockDims {
            dim: self.dim,
            hidden_dim: self.hidden_dim,
            n_heads: self.n_heads,
            n_kv_heads: self.n_kv_heads,
            seq_len: self.seq_len,
        }
    }

    pub fn validate(&self) -> NlpResult<()> {
        if self.n_layers == 0 || self.vocab_size == 0 {
            return Err(NlpError::InvalidHeader(format!(
                "n_layers ({}) and vocab_size ({}) must be positive",
                self.n_layers, self.vocab_size
            )));
        }
        self.block_dims()
            .validate()
            .map_err(|e| NlpError::InvalidHeader(e.to_string()))?;
        self.weight_count().map(|_| ())
    }

    /// Number of f32 weights in the payload.
    pub fn weight_count(&self) -> NlpResult<usize> {
        let overflow = || NlpError::InvalidHeader(format!("weight count overflows for {:?}", self));
        let (d, h) = (self.dim, self.hidden_dim);
        let embedding = self.vocab_size.checked_mul(d).ok_or_else(overflow)?;
        let per_layer = d
            .checked_mul(d)
            .and_then(|dd| dd.checked_mul(4))
            .and_then(|attn| h.checked_mul(d)?.checked_mul(3)?.checked_add(attn))
            .and_then(|n| n.checked_add(2 * d))
            .ok_or_else(overflow)?;
        per_layer
            .checked_mul(self.n_layers)
            .and_then(|layers| layers.checked_add(embedding))
            .and_then(|n| n.checked_add(d))
            .and_then(|n| n.checked_add(embedding))
            .ok_or_else(overflow)
    }
}

/// Sampling and length settings for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum number of new tokens
    pub steps: usize,
    /// Sampling temperature (0.0 = greedy)
    pub temperature: f32,
    /// Keep only the k most likely tokens
    pub top_k: Option<usize>,
    /// Nucleus threshold; 1.0 disables truncation
    pub top_p: f32,
    /// RNG seed for the random sampler
    pub seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            steps: 50,
            temperature: 0.0,
            top_k: None,
            top_p: 1.0,
            seed: 0,
        }
    }
}

impl GenerationConfig {
    pub fn from_json_str(json: &str) -> NlpResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| NlpError::InvalidConfig(format!("generation config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> NlpResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            NlpError::InvalidConfig(format!("cannot read generation config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> NlpResult<()> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(NlpError::InvalidConfig(format!(
                "temperature must be >= 0.0, got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(NlpError::InvalidConfig(format!(
                "top_p must be in (0.0, 1.0], got {}",
                self.top_p
            )));
        }
        if self.top_k == Some(0) {
            return Err(NlpError::InvalidConfig("top_k must be > 0".into()));
        }
        Ok(())
    }

    /// Greedy when temperature is 0, otherwise a seeded random sampler.
    pub fn build_sampler(&self) -> NlpResult<Box<dyn Sampler>> {
        self.validate()?;
        if self.temperature == 0.0 {
            return Ok(Box::new(GreedySampler));
        }
        let mut sampler = RandomSampler::new(self.seed)
            .with_temperature(self.temperature)
            .with_top_p(self.top_p);
        if let Some(k) = self.top_k {
            sampler = sampler.with_top_k(k);
        }
        Ok(Box::new(sampler))
    }
}

/// Structured observability events emitted by a model.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Loading began; `source` is a path or `"<memory>"`.
    LoadStarted { source: String },
    HeaderDecoded { config: ModelConfig },
    /// The header asks for fewer KV heads than query heads; attention
    /// still uses one KV head per query head.
    KvHeadsIgnored { n_heads: usize, n_kv_heads: usize },
    WeightsLoaded { floats: usize, elapsed: Duration },
    CacheReset,
    PromptProcessed { tokens: usize },
    ForwardTimed { position: usize, elapsed: Duration },
    TokenGenerated { position: usize, token: u32 },
    /// Generation stopped because the next position would reach `seq_len`.
    SequenceLimitReached { seq_len: usize },
    GenerationFinished { generated: usize },
}
