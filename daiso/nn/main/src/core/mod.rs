pub mod attention;
pub mod embedding;
pub mod feed_forward;
pub mod kv_cache;
pub mod rms_norm;
pub mod rope;
pub mod transformer_block;
