//! Stock [`Sampler`] implementations.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::api::traits::Sampler;
use crate::core::sampling::{apply_temperature, apply_top_k, apply_top_p, argmax, sample_categorical};

/// Always picks the highest logit; ties go to the lowest ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySampler;

impl Sampler for GreedySampler {
    fn sample(&mut self, logits: &[f32]) -> u32 {
        argmax(logits)
    }
}

/// Temperature, top-k and top-p sampling from a seeded RNG.
///
/// The same seed over the same logits reproduces the same tokens.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    temperature: f32,
    top_k: Option<usize>,
    top_p: f32,
    rng: StdRng,
    scratch: Vec<f32>,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            temperature: 1.0,
            top_k: None,
            top_p: 1.0,
            rng: StdRng::seed_from_u64(seed),
            scratch: Vec::new(),
        }
    }

    /// 0.0 falls back to greedy selection.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    pub fn with_top_p(mut self, p: f32) -> Self {
        self.top_p = p;
        self
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self, logits: &[f32]) -> u32 {
        if self.temperature <= 0.0 {
            return argmax(logits);
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(logits);
        apply_temperature(&mut self.scratch, self.temperature);
        if let Some(k) = self.top_k {
            apply_top_k(&mut self.scratch, k);
        }
        apply_top_p(&mut self.scratch, self.top_p);
        sample_categorical(&self.scratch, &mut self.rng)
    }
}
