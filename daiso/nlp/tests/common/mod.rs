#![allow(dead_code)]

use daiso_nlp::ModelConfig;

/// The smallest shape exercised throughout the suite.
pub fn tiny_config() -> ModelConfig {
    ModelConfig {
        dim: 8,
        hidden_dim: 16,
        n_layers: 1,
        n_heads: 2,
        n_kv_heads: 2,
        vocab_size: 10,
        seq_len: 4,
    }
}

pub fn small_config() -> ModelConfig {
    ModelConfig {
        dim: 16,
        hidden_dim: 32,
        n_layers: 3,
        n_heads: 4,
        n_kv_heads: 4,
        vocab_size: 300,
        seq_len: 12,
    }
}

pub fn assert_f32_near(actual: &[f32], expected: &[f32], tol: f32) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= tol, "index {}: {} vs {} (tol {})", i, a, e, tol);
    }
}
