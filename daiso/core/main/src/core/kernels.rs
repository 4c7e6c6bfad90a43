//! Slice kernels for the single-token path.
//!
//! These work on raw `f32` slices so layers can address sub-ranges of a
//! tensor (a head, a cache row) without building intermediate tensors.
//! Reductions run in ascending index order.

use crate::api::error::{TensorError, TensorResult};

/// Dense matrix-vector product: `out[i] = sum_j w[i * cols + j] * x[j]`.
///
/// `w` is row-major `[out.len(), x.len()]`.
pub fn matvec(out: &mut [f32], w: &[f32], x: &[f32]) -> TensorResult<()> {
    let rows = out.len();
    let cols = x.len();
    if w.len() != rows * cols {
        return Err(TensorError::ShapeMismatch {
            expected: vec![rows, cols],
            got: vec![w.len()],
        });
    }
    if cols == 0 {
        out.fill(0.0);
        return Ok(());
    }
    for (o, w_row) in out.iter_mut().zip(w.chunks_exact(cols)) {
        *o = dot(w_row, x);
    }
    Ok(())
}

/// Dot product over the common prefix of `a` and `b`.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        acc += x * y;
    }
    acc
}

/// Numerically stable softmax over the whole slice. Empty slices are left alone.
pub fn softmax_in_place(x: &mut [f32]) {
    if x.is_empty() {
        return;
    }
    let max_val = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let mut sum = 0.0f32;
    for v in x.iter_mut() {
        *v = (*v - max_val).exp();
        sum += *v;
    }
    for v in x.iter_mut() {
        *v /= sum;
    }
}

/// `acc += b`, for the residual stream.
pub fn add_in_place(acc: &mut [f32], b: &[f32]) -> TensorResult<()> {
    if acc.len() != b.len() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![acc.len()],
            got: vec![b.len()],
        });
    }
    for (a, &v) in acc.iter_mut().zip(b) {
        *a += v;
    }
    Ok(())
}

#[inline]
pub fn sigmoid_scalar(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Swish / SiLU: `v * sigmoid(v)`.
#[inline]
pub fn silu(v: f32) -> f32 {
    v * sigmoid_scalar(v)
}
