//! # Daiso Neural Network
//!
//! Decoder layers for single-token autoregressive inference.
//!
//! This crate provides the building blocks of a Llama-style decoder:
//! - RMS normalization
//! - Token embedding lookup
//! - Causal self-attention with rotary position encoding and a KV cache
//! - Gated (SwiGLU) feed-forward
//! - The pre-norm transformer block that composes them
//!
//! Every layer writes into caller-owned buffers; nothing allocates per
//! token except small per-call working vectors inside attention and the
//! feed-forward.
//!
//! ## Example
//!
//! ```rust,ignore
//! use daiso_nn::{Activations, KVCache, TransformerBlock};
//!
//! let mut act = Activations::new(dim)?;
//! let mut cache = KVCache::new(n_layers, seq_len, dim)?;
//! block.forward(&mut act, position, layer, &mut cache)?;
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
