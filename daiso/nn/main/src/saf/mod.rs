//! Facade re-exports for daiso-nn

pub use crate::api::error::*;
pub use crate::api::types::*;
pub use crate::core::attention::Attention;
pub use crate::core::embedding::Embedding;
pub use crate::core::feed_forward::FeedForward;
pub use crate::core::kv_cache::KVCache;
pub use crate::core::rms_norm::{RMSNorm, RMS_NORM_EPS};
pub use crate::core::rope::{RoPEFreqs, ROPE_THETA};
pub use crate::core::transformer_block::{Activations, TransformerBlock};
