//! Flat weight payloads and model file writing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::error::{NlpError, NlpResult};
use crate::api::types::ModelConfig;
use crate::core::format::{encode_f32s, ModelHeader};

/// A complete weight payload in file order, paired with its config.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelWeights {
    config: ModelConfig,
    data: Vec<f32>,
}

impl ModelWeights {
    /// All-zero weights.
    pub fn zeros(config: ModelConfig) -> NlpResult<Self> {
        config.validate()?;
        Ok(Self {
            data: vec![0.0; config.weight_count()?],
            config,
        })
    }

    /// Uniform weights in `[-0.1, 0.1)` from a seeded RNG; norms are set to 1.
    pub fn random(config: ModelConfig, seed: u64) -> NlpResult<Self> {
        let mut weights = Self::zeros(config)?;
        let mut rng = StdRng::seed_from_u64(seed);
        for v in weights.data.iter_mut() {
            *v = rng.gen_range(-0.1f32..0.1);
        }
        for range in weights.norm_ranges() {
            weights.data[range].fill(1.0);
        }
        Ok(weights)
    }

    pub fn from_vec(config: ModelConfig, data: Vec<f32>) -> NlpResult<Self> {
        config.validate()?;
        let expected = config.weight_count()?;
        if data.len() != expected {
            return Err(NlpError::InvalidConfig(format!(
                "expected {} weights for {:?}, got {}",
                expected,
                config,
                data.len()
            )));
        }
        Ok(Self { config, data })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Token embedding table, `[vocab_size, dim]` row-major.
    pub fn embedding_mut(&mut self) -> &mut [f32] {
        let n = self.config.vocab_size * self.config.dim;
        &mut self.data[..n]
    }

    /// Output projection, `[vocab_size, dim]` row-major.
    pub fn output_mut(&mut self) -> &mut [f32] {
        let n = self.config.vocab_size * self.config.dim;
        let len = self.data.len();
        &mut self.data[len - n..]
    }

    /// Final norm weights, `[dim]`.
    pub fn final_norm_mut(&mut self) -> &mut [f32] {
        let c = self.config;
        let end = self.data.len() - c.vocab_size * c.dim;
        &mut self.data[end - c.dim..end]
    }

    fn norm_ranges(&self) -> Vec<std::ops::Range<usize>> {
        let c = self.config;
        let (d, h) = (c.dim, c.hidden_dim);
        let per_layer = 2 * d + 4 * d * d + 3 * h * d;
        let mut ranges = Vec::with_capacity(2 * c.n_layers + 1);
        let mut at = c.vocab_size * d;
        for _ in 0..c.n_layers {
            ranges.push(at..at + d);
            let ffn_norm = at + d + 4 * d * d;
            ranges.push(ffn_norm..ffn_norm + d);
            at += per_layer;
        }
        ranges.push(at..at + d);
        ranges
    }

    /// Serialize as a complete model file.
    pub fn to_bytes(&self) -> NlpResult<Vec<u8>> {
        let header = ModelHeader::new(self.config).encode()?;
        let mut bytes = Vec::with_capacity(header.len() + self.data.len() * 4);
        bytes.extend_from_slice(&header);
        bytes.extend(encode_f32s(&self.data));
        Ok(bytes)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> NlpResult<()> {
        writer.write_all(&ModelHeader::new(self.config).encode()?)?;
        for chunk in self.data.chunks(64 * 1024) {
            writer.write_all(&encode_f32s(chunk))?;
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> NlpResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| NlpError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
