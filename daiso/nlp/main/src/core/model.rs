//! Decoder-only transformer with an embedded KV cache.
//!
//! A [`Model`] owns its weights (views into one arena), the KV cache, the
//! residual activations and the logits buffer. A decode step reuses those;
//! attention and the feed-forward still allocate small per-call working
//! vectors. One model serves one generation at a time.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use daiso_core::{matmul, matvec, Tensor, WeightArena};
use daiso_nn::{
    Activations, Attention, Embedding, FeedForward, KVCache, NnError, RMSNorm, TransformerBlock,
    RMS_NORM_EPS,
};
use memmap2::Mmap;

use crate::api::error::{NlpError, NlpResult};
use crate::api::traits::{EventSink, Sampler};
use crate::api::types::{Event, ModelConfig};
use crate::core::format::{parse_model_bytes, HEADER_SIZE};
use crate::core::weights::ModelWeights;

pub struct Model {
    config: ModelConfig,
    embedding: Embedding,
    layers: Vec<TransformerBlock>,
    final_norm: RMSNorm,
    output: Tensor,
    cache: KVCache,
    act: Activations,
    logits: Tensor,
    sink: Box<dyn EventSink>,
}

impl Model {
    /// Load a model file. The file is memory-mapped and copied once into the weight arena.
    pub fn load(path: impl AsRef<Path>, sink: Box<dyn EventSink>) -> NlpResult<Self> {
        let path = path.as_ref();
        let started = Instant::now();
        sink.emit(&Event::LoadStarted {
            source: path.display().to_string(),
        });

        let open_err = |source| NlpError::Open {
            path: path.display().to_string(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let len = file.metadata().map_err(open_err)?.len();
        let (header, data) = if len < HEADER_SIZE as u64 {
            // Too short to map usefully; let the parser report the truncation.
            parse_model_bytes(&std::fs::read(path).map_err(open_err)?)?
        } else {
            // SAFETY: the mapping is read-only and dropped at the end of this block;
            // `parse_model_bytes` copies the payload out.
            let mmap = unsafe { Mmap::map(&file) }.map_err(open_err)?;
            parse_model_bytes(&mmap)?
        };
        Self::build(header.config, data, sink, started)
    }

    /// Parse a complete model file held in memory.
    pub fn from_bytes(bytes: &[u8], sink: Box<dyn EventSink>) -> NlpResult<Self> {
        let started = Instant::now();
        sink.emit(&Event::LoadStarted {
            source: "<memory>".to_string(),
        });
        let (header, data) = parse_model_bytes(bytes)?;
        Self::build(header.config, data, sink, started)
    }

    pub fn from_weights(weights: ModelWeights, sink: Box<dyn EventSink>) -> NlpResult<Self> {
        let started = Instant::now();
        sink.emit(&Event::LoadStarted {
            source: "<weights>".to_string(),
        });
        let config = *weights.config();
        Self::build(config, weights.into_data(), sink, started)
    }

    fn build(config: ModelConfig, data: Vec<f32>, sink: Box<dyn EventSink>, started: Instant) -> NlpResult<Self> {
        config.validate()?;
        sink.emit(&Event::HeaderDecoded { config });
        if config.n_kv_heads != config.n_heads {
            sink.emit(&Event::KvHeadsIgnored {
                n_heads: config.n_heads,
                n_kv_heads: config.n_kv_heads,
            });
        }

        let floats = data.len();
        let (d, h, v) = (config.dim, config.hidden_dim, config.vocab_size);
        let dims = config.block_dims();
        let mut arena = WeightArena::new(data);

        let embedding = Embedding::from_weights(arena.take([v, d])?)?;
        let mut layers = Vec::with_capacity(config.n_layers);
        for _ in 0..config.n_layers {
            let attention_norm = RMSNorm::from_weight(arena.take([d])?, RMS_NORM_EPS)?;
            let wq = arena.take([d, d])?;
            let wk = arena.take([d, d])?;
            let wv = arena.take([d, d])?;
            let wo = arena.take([d, d])?;
            let attention = Attention::from_weights(&dims, wq, wk, wv, wo)?;
            let ffn_norm = RMSNorm::from_weight(arena.take([d])?, RMS_NORM_EPS)?;
            let w1 = arena.take([h, d])?;
            let w2 = arena.take([d, h])?;
            let w3 = arena.take([h, d])?;
            let feed_forward = FeedForward::from_weights(w1, w2, w3)?;
            layers.push(TransformerBlock::new(attention_norm, attention, ffn_norm, feed_forward)?);
        }
        let final_norm = RMSNorm::from_weight(arena.take([d])?, RMS_NORM_EPS)?;
        let output = arena.take([v, d])?;
        arena.finish()?;

        sink.emit(&Event::WeightsLoaded {
            floats,
            elapsed: started.elapsed(),
        });

        Ok(Self {
            embedding,
            layers,
            final_norm,
            output,
            cache: KVCache::new(config.n_layers, config.seq_len, d)?,
            act: Activations::new(d)?,
            logits: Tensor::new([v])?,
            sink,
            config,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Next sequence position the cache expects.
    pub fn position(&self) -> usize {
        self.cache.len(0).unwrap_or(0)
    }

    /// Drop every cached key and value.
    pub fn reset(&mut self) {
        self.cache.reset();
        self.sink.emit(&Event::CacheReset);
    }

    /// Run one token at `position` and return the `[vocab_size]` logits.
    ///
    /// Positions must be fed in order starting at 0 after construction or
    /// [`reset`](Self::reset). The returned buffer is overwritten by the next call.
    pub fn forward(&mut self, token: u32, position: usize) -> NlpResult<&Tensor> {
        if token as usize >= self.config.vocab_size {
            return Err(NnError::TokenOutOfRange {
                token,
                vocab_size: self.config.vocab_size,
            }
            .into());
        }
        if position >= self.config.seq_len {
            return Err(NnError::PositionOutOfRange {
                position,
                seq_len: self.config.seq_len,
            }
            .into());
        }
        let expected = self.position();
        if position != expected {
            return Err(NnError::CacheOrder {
                layer: 0,
                position,
                expected,
            }
            .into());
        }

        let t = if self.sink.timings_enabled() { Some(Instant::now()) } else { None };

        self.embedding.forward(&mut self.act.x, token)?;
        for (layer, block) in self.layers.iter().enumerate() {
            block.forward(&mut self.act, position, layer, &mut self.cache)?;
        }
        self.final_norm.forward_in_place(&mut self.act.x)?;
        matvec(self.logits.data_mut(), self.output.data(), self.act.x.data())?;

        if let Some(t) = t {
            self.sink.emit(&Event::ForwardTimed {
                position,
                elapsed: t.elapsed(),
            });
        }
        Ok(&self.logits)
    }

    /// Logits for every position of `tokens`, computed without the KV cache.
    ///
    /// Returns `[tokens.len(), vocab_size]`. Row `i` equals what
    /// [`forward`](Self::forward) returns for `tokens[i]` at position `i`.
    pub fn forward_sequence(&self, tokens: &[u32]) -> NlpResult<Tensor> {
        if tokens.len() > self.config.seq_len {
            return Err(NlpError::PromptTooLong {
                len: tokens.len(),
                seq_len: self.config.seq_len,
            });
        }
        if tokens.is_empty() {
            return Err(NnError::ShapeMismatch("token sequence is empty".into()).into());
        }

        let (n, d) = (tokens.len(), self.config.dim);
        let mut x = Tensor::new([n, d])?;
        let mut row = Tensor::new([d])?;
        for (pos, &tok) in tokens.iter().enumerate() {
            self.embedding.forward(&mut row, tok)?;
            x.row_mut(pos)?.copy_from_slice(row.data());
        }
        for block in &self.layers {
            block.forward_sequence(&mut x)?;
        }
        let normed = self.final_norm.forward_rows(&x)?;
        let mut logits = Tensor::new([n, self.config.vocab_size])?;
        matmul(&mut logits, &normed, &self.output.transpose()?)?;
        Ok(logits)
    }

    /// Continue `prompt` by up to `steps` tokens.
    ///
    /// Returns the prompt followed by the new tokens. Generation stops early,
    /// without error, once the next position would reach `seq_len`.
    pub fn generate(&mut self, prompt: &[u32], steps: usize, sampler: &mut dyn Sampler) -> NlpResult<Vec<u32>> {
        self.generate_stream(prompt, steps, sampler, |_| true)
    }

    /// Like [`generate`](Self::generate), calling `on_token` with each new
    /// token as it is produced. Returning `false` stops after that token.
    pub fn generate_stream<F>(
        &mut self,
        prompt: &[u32],
        steps: usize,
        sampler: &mut dyn Sampler,
        mut on_token: F,
    ) -> NlpResult<Vec<u32>>
    where
        F: FnMut(u32) -> bool,
    {
        let seq_len = self.config.seq_len;
        let vocab_size = self.config.vocab_size;
        if prompt.len() > seq_len {
            return Err(NlpError::PromptTooLong {
                len: prompt.len(),
                seq_len,
            });
        }
        if let Some(&token) = prompt.iter().find(|&&t| t as usize >= vocab_size) {
            return Err(NnError::TokenOutOfRange { token, vocab_size }.into());
        }

        self.reset();

        // An empty prompt starts from token 0, which is not part of the output.
        let (mut next, mut pos) = match prompt.split_last() {
            Some((&last, head)) => {
                for (pos, &tok) in head.iter().enumerate() {
                    self.forward(tok, pos)?;
                }
                (last, head.len())
            }
            None => (0, 0),
        };
        self.sink.emit(&Event::PromptProcessed { tokens: prompt.len() });

        let mut tokens = Vec::with_capacity(prompt.len() + steps.min(seq_len));
        tokens.extend_from_slice(prompt);
        let mut generated = 0;
        while generated < steps {
            if pos >= seq_len {
                self.sink.emit(&Event::SequenceLimitReached { seq_len });
                break;
            }
            let logits = self.forward(next, pos)?;
            let token = sampler.sample(logits.data());
            if token as usize >= vocab_size {
                return Err(NnError::TokenOutOfRange { token, vocab_size }.into());
            }
            self.sink.emit(&Event::TokenGenerated { position: pos, token });
            tokens.push(token);
            generated += 1;
            pos += 1;
            next = token;
            if !on_token(token) {
                break;
            }
        }

        self.sink.emit(&Event::GenerationFinished { generated });
        Ok(tokens)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("config", &self.config)
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{MemorySink, NullSink};
    use crate::core::sampler::GreedySampler;

    fn tiny() -> ModelConfig {
        ModelConfig {
            dim: 8,
            hidden_dim: 16,
            n_layers: 2,
            n_heads: 2,
            n_kv_heads: 2,
            vocab_size: 12,
            seq_len: 6,
        }
    }

    fn random_model(seed: u64) -> Model {
        Model::from_weights(ModelWeights::random(tiny(), seed).unwrap(), Box::new(NullSink)).unwrap()
    }

    #[test]
    fn test_forward_advances_position() {
        let mut model = random_model(1);
        assert_eq!(model.position(), 0);
        let logits = model.forward(3, 0).unwrap();
        assert_eq!(logits.shape(), &[12]);
        assert!(logits.data().iter().all(|v| v.is_finite()));
        assert_eq!(model.position(), 1);
    }

    #[test]
    fn test_forward_rejects_out_of_order_position() {
        let mut model = random_model(1);
        model.forward(0, 0).unwrap();
        assert!(model.forward(0, 0).is_err());
        assert!(model.forward(0, 2).is_err());
        assert_eq!(model.position(), 1);
        model.reset();
        assert!(model.forward(0, 0).is_ok());
    }

    #[test]
    fn test_forward_rejects_bad_token_without_touching_cache() {
        let mut model = random_model(1);
        let err = model.forward(12, 0).unwrap_err();
        assert_eq!(err.kind(), daiso_core::ErrorKind::Range);
        assert_eq!(model.position(), 0);
    }

    #[test]
    fn test_generate_resets_between_calls() {
        let mut model = random_model(4);
        let a = model.generate(&[1, 2], 3, &mut GreedySampler).unwrap();
        let b = model.generate(&[1, 2], 3, &mut GreedySampler).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..2], &[1, 2]);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_generate_stream_stops_when_callback_declines() {
        let mut model = random_model(4);
        let mut seen = Vec::new();
        let out = model
            .generate_stream(&[5], 10, &mut GreedySampler, |t| {
                seen.push(t);
                seen.len() < 2
            })
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(&out[1..], seen.as_slice());
    }

    #[test]
    fn test_gqa_header_emits_warning_event() {
        let sink = MemorySink::new();
        let config = ModelConfig { n_kv_heads: 1, ..tiny() };
        Model::from_weights(ModelWeights::zeros(config).unwrap(), Box::new(sink.clone())).unwrap();
        assert!(sink
            .events()
            .contains(&Event::KvHeadsIgnored { n_heads: 2, n_kv_heads: 1 }));
    }
}
