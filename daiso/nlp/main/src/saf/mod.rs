//! Facade re-exports for daiso-nlp

pub use crate::api::error::*;
pub use crate::api::traits::*;
pub use crate::api::types::*;
pub use crate::core::events::{LogSink, MemorySink, NullSink};
pub use crate::core::format::{
    decode_f32s, encode_f32s, parse_model_bytes, ModelHeader, HEADER_SIZE, MAGIC, VERSION,
};
pub use crate::core::model::Model;
pub use crate::core::sampler::{GreedySampler, RandomSampler};
pub use crate::core::sampling::{apply_temperature, apply_top_k, apply_top_p, argmax, sample_categorical};
pub use crate::core::tokenizer::{ByteStreamDecoder, ByteTokenizer};
pub use crate::core::weights::ModelWeights;
pub use daiso_core::ErrorKind;
