//! Sampling functions for language model inference.
//!
//! Operates on raw logit slices (not Tensor) for efficiency.

use daiso_core::softmax_in_place;
use rand::Rng;

/// Return the index of the maximum value in the logit slice.
///
/// Ties resolve to the lowest index. NaN entries never win.
pub fn argmax(logits: &[f32]) -> u32 {
    let mut best = 0u32;
    let mut max_val = f32::NEG_INFINITY;
    for (i, &v) in logits.iter().enumerate() {
        if v > max_val {
            max_val = v;
            best = i as u32;
        }
    }
    best
}

/// Scale logits by `1 / temperature`, shifted so the maximum becomes 0.
///
/// The shift leaves the softmax unchanged and keeps every scaled value
/// finite or `NEG_INFINITY`, however small the temperature. A non-positive
/// temperature is a no-op.
pub fn apply_temperature(logits: &mut [f32], temperature: f32) {
    if temperature <= 0.0 || temperature == 1.0 {
        return;
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return;
    }
    for v in logits.iter_mut() {
        *v = (*v - max) / temperature;
    }
}

/// Keep only the top-k logits; set the rest to NEG_INFINITY.
/// If k >= logits.len(), this is a no-op.
pub fn apply_top_k(logits: &mut [f32], k: usize) {
    if k == 0 || k >= logits.len() {
        return;
    }
    let mut vals: Vec<f32> = logits.to_vec();
    let pivot = vals.len() - k;
    vals.select_nth_unstable_by(pivot, |a: &f32, b: &f32| a.total_cmp(b));
    let threshold = vals[pivot];

    for v in logits.iter_mut() {
        if *v < threshold {
            *v = f32::NEG_INFINITY;
        }
    }
}

/// Apply nucleus (top-p) filtering: keep the smallest set of tokens whose
/// cumulative probability reaches `p`, mask the rest to NEG_INFINITY.
pub fn apply_top_p(logits: &mut [f32], p: f32) {
    if p >= 1.0 || logits.is_empty() {
        return;
    }

    let mut probs = logits.to_vec();
    softmax_in_place(&mut probs);

    let mut indices: Vec<usize> = (0..probs.len()).collect();
    indices.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));

    let mut cumsum = 0.0f32;
    let mut keep = vec![false; logits.len()];
    for &idx in &indices {
        cumsum += probs[idx];
        keep[idx] = true;
        if cumsum >= p {
            break;
        }
    }

    for (v, kept) in logits.iter_mut().zip(keep) {
        if !kept {
            *v = f32::NEG_INFINITY;
        }
    }
}

/// Sample from a categorical distribution defined by logits (not probabilities).
/// Applies stable softmax internally then draws using the given RNG.
pub fn sample_categorical<R: Rng>(logits: &[f32], rng: &mut R) -> u32 {
    if logits.is_empty() {
        return 0;
    }
    let mut probs = logits.to_vec();
    softmax_in_place(&mut probs);

    let r: f32 = rng.gen();
    let mut cumsum = 0.0;
    let mut last_live = None;
    for (i, &p) in probs.iter().enumerate() {
        if p > 0.0 {
            last_live = Some(i);
        }
        cumsum += p;
        if r < cumsum {
            return i as u32;
        }
    }
    match last_live {
        // Rounding left the cumulative sum just under r.
        Some(i) => i as u32,
        // No usable probability mass (non-finite logits).
        None => argmax(logits),
    }
}
