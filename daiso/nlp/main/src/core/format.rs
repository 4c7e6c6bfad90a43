//! Binary model file format.
//!
//! Layout (little-endian, no padding, no checksum):
//!
//! ```text
//! u32 magic | i32 version | i32 dim | i32 hidden_dim | i32 n_layers
//! | i32 n_heads | i32 n_kv_heads | i32 vocab_size | i32 seq_len
//! f32 payload, in order:
//!   embedding            [vocab_size, dim]
//!   per layer:
//!     attention_norm     [dim]
//!     wq, wk, wv, wo     [dim, dim] each
//!     ffn_norm           [dim]
//!     w1                 [hidden_dim, dim]
//!     w2                 [dim, hidden_dim]
//!     w3                 [hidden_dim, dim]
//!   final_norm           [dim]
//!   output               [vocab_size, dim]
//! ```

use crate::api::error::{NlpError, NlpResult};
use crate::api::types::ModelConfig;

/// Magic number. Stored little-endian, so a file starts with the bytes `siad`.
pub const MAGIC: u32 = 0x6461_6973;
/// The only supported format version.
pub const VERSION: i32 = 1;
/// Size of the fixed header record in bytes.
pub const HEADER_SIZE: usize = 36;

/// Decoded file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub version: i32,
    pub config: ModelConfig,
}

impl ModelHeader {
    pub fn new(config: ModelConfig) -> Self {
        Self { version: VERSION, config }
    }

    /// Decode and validate the header at the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> NlpResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(NlpError::Truncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let word = |i: usize| -> [u8; 4] {
            [bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]]
        };

        let magic = u32::from_le_bytes(word(0));
        if magic != MAGIC {
            return Err(NlpError::BadMagic { expected: MAGIC, found: magic });
        }
        let version = i32::from_le_bytes(word(1));
        if version != VERSION {
            return Err(NlpError::UnsupportedVersion { expected: VERSION, found: version });
        }

        let field = |i: usize, name: &str| -> NlpResult<usize> {
            let v = i32::from_le_bytes(word(i));
            if v <= 0 {
                return Err(NlpError::InvalidHeader(format!("{} must be positive, got {}", name, v)));
            }
            Ok(v as usize)
        };
        let config = ModelConfig {
            dim: field(2, "dim")?,
            hidden_dim: field(3, "hidden_dim")?,
            n_layers: field(4, "n_layers")?,
            n_heads: field(5, "n_heads")?,
            n_kv_heads: field(6, "n_kv_heads")?,
            vocab_size: field(7, "vocab_size")?,
            seq_len: field(8, "seq_len")?,
        };
        config.validate()?;
        Ok(Self { version, config })
    }

    /// Encode as the fixed 36-byte record.
    pub fn encode(&self) -> NlpResult<[u8; HEADER_SIZE]> {
        let c = &self.config;
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        let fields = [c.dim, c.hidden_dim, c.n_layers, c.n_heads, c.n_kv_heads, c.vocab_size, c.seq_len];
        for (i, v) in fields.into_iter().enumerate() {
            let v = i32::try_from(v)
                .map_err(|_| NlpError::InvalidHeader(format!("header field {} does not fit in i32", v)))?;
            let at = 8 + i * 4;
            out[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }
        Ok(out)
    }

    /// Exact file size implied by this header.
    pub fn file_size(&self) -> NlpResult<usize> {
        let floats = self.config.weight_count()?;
        floats
            .checked_mul(4)
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or_else(|| NlpError::InvalidHeader("file size overflows".into()))
    }
}

/// Split a whole model file into its header and decoded f32 payload.
///
/// The file must be exactly as long as the header implies.
pub fn parse_model_bytes(bytes: &[u8]) -> NlpResult<(ModelHeader, Vec<f32>)> {
    let header = ModelHeader::decode(bytes)?;
    let expected = header.file_size()?;
    if bytes.len() < expected {
        return Err(NlpError::Truncated { expected, actual: bytes.len() });
    }
    if bytes.len() > expected {
        return Err(NlpError::TrailingBytes {
            expected,
            extra: bytes.len() - expected,
        });
    }
    Ok((header, decode_f32s(&bytes[HEADER_SIZE..])))
}

/// Decode little-endian f32 values. Trailing bytes short of a full value are ignored.
pub fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    let whole = &bytes[..bytes.len() / 4 * 4];
    if cfg!(target_endian = "little") {
        bytemuck::pod_collect_to_vec::<u8, f32>(whole)
    } else {
        whole
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

/// Encode f32 values as little-endian bytes.
pub fn encode_f32s(values: &[f32]) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        bytemuck::cast_slice::<f32, u8>(values).to_vec()
    } else {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}
