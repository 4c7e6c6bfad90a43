//! # Daiso NLP
//!
//! Model loading and autoregressive generation for the Daiso inference engine.
//!
//! This crate provides:
//! - the binary model file format (reader, writer and header inspection)
//! - [`Model`], a Llama-style decoder with an embedded KV cache
//! - greedy and temperature/top-k/top-p samplers
//! - a byte-level tokenizer and structured observability events
//!
//! ## Example
//!
//! ```rust
//! use daiso_nlp::{GreedySampler, Model, ModelConfig, ModelWeights, NullSink};
//!
//! let config = ModelConfig {
//!     dim: 8,
//!     hidden_dim: 16,
//!     n_layers: 1,
//!     n_heads: 2,
//!     n_kv_heads: 2,
//!     vocab_size: 10,
//!     seq_len: 4,
//! };
//! let weights = ModelWeights::random(config, 7)?;
//! let mut model = Model::from_weights(weights, Box::new(NullSink))?;
//! let tokens = model.generate(&[1, 2], 8, &mut GreedySampler)?;
//! assert_eq!(tokens.len(), 2 + 3);
//! # Ok::<(), daiso_nlp::NlpError>(())
//! ```

pub mod api;
pub(crate) mod core;
mod saf;

pub use saf::*;
