//! Tensor operations that write into a caller-provided output.

use crate::api::error::{TensorError, TensorResult};
use crate::core::kernels::{sigmoid_scalar, softmax_in_place};

use super::Tensor;

fn require_same_shape(expected: &Tensor, got: &Tensor) -> TensorResult<()> {
    if expected.shape() != got.shape() {
        return Err(TensorError::ShapeMismatch {
            expected: expected.shape().to_vec(),
            got: got.shape().to_vec(),
        });
    }
    Ok(())
}

// ==================== Matrix multiplication ====================

/// `out[i, j] = sum_k a[i, k] * b[k, j]` for 2-D tensors.
pub fn matmul(out: &mut Tensor, a: &Tensor, b: &Tensor) -> TensorResult<()> {
    let (m, k) = a.require_2d()?;
    let (k2, n) = b.require_2d()?;
    if k != k2 {
        return Err(TensorError::MatmulDimensionMismatch { left: k, right: k2 });
    }
    out.require_2d()?;
    if out.shape() != [m, n] {
        return Err(TensorError::ShapeMismatch {
            expected: vec![m, n],
            got: out.shape().to_vec(),
        });
    }

    let lhs = a.data();
    let rhs = b.data();
    let dst = out.data_mut();
    for i in 0..m {
        let a_row = &lhs[i * k..(i + 1) * k];
        for j in 0..n {
            let mut acc = 0.0f32;
            for (kk, &av) in a_row.iter().enumerate() {
                acc += av * rhs[kk * n + j];
            }
            dst[i * n + j] = acc;
        }
    }
    Ok(())
}

// ==================== Element-wise ops ====================

/// `out = a + b`, all three of identical shape.
pub fn add(out: &mut Tensor, a: &Tensor, b: &Tensor) -> TensorResult<()> {
    binary_op(out, a, b, |x, y| x + y)
}

/// `out = a * b` element-wise, all three of identical shape.
pub fn element_wise_mul(out: &mut Tensor, a: &Tensor, b: &Tensor) -> TensorResult<()> {
    binary_op(out, a, b, |x, y| x * y)
}

/// `out = 1 / (1 + exp(-a))` element-wise.
pub fn sigmoid(out: &mut Tensor, a: &Tensor) -> TensorResult<()> {
    require_same_shape(a, out)?;
    for (o, &v) in out.data_mut().iter_mut().zip(a.data()) {
        *o = sigmoid_scalar(v);
    }
    Ok(())
}

/// Softmax over the last dimension, stabilized by the per-row maximum.
pub fn softmax(out: &mut Tensor, a: &Tensor) -> TensorResult<()> {
    require_same_shape(a, out)?;
    let row_len = a.shape()[a.ndim() - 1];
    let dst = out.data_mut();
    dst.copy_from_slice(a.data());
    for row in dst.chunks_mut(row_len) {
        softmax_in_place(row);
    }
    Ok(())
}

fn binary_op(out: &mut Tensor, a: &Tensor, b: &Tensor, f: impl Fn(f32, f32) -> f32) -> TensorResult<()> {
    require_same_shape(a, b)?;
    require_same_shape(a, out)?;
    for ((o, &x), &y) in out.data_mut().iter_mut().zip(a.data()).zip(b.data()) {
        *o = f(x, y);
    }
    Ok(())
}
