//! RMSNorm: x * weight / rms(x). Used by Llama-family models.
//! Unlike LayerNorm, does not subtract mean and has no bias parameter.

use crate::api::error::{NnError, NnResult};
use daiso_core::{Tensor, TensorError};

/// Epsilon added to the mean square before the inverse square root.
pub const RMS_NORM_EPS: f32 = 1e-5;

/// RMSNorm layer
#[derive(Debug, Clone)]
pub struct RMSNorm {
    pub weight: Tensor,
    pub eps: f32,
}

impl RMSNorm {
    /// Create a new RMSNorm with weights initialized to 1.
    pub fn new(dim: usize) -> NnResult<Self> {
        let weight = Tensor::full([dim], 1.0)?;
        Ok(Self { weight, eps: RMS_NORM_EPS })
    }

    /// Create from a pre-loaded 1-D weight tensor.
    pub fn from_weight(weight: Tensor, eps: f32) -> NnResult<Self> {
        if weight.ndim() != 1 {
            return Err(NnError::InvalidConfig(format!(
                "RMSNorm weight must be 1D, got {:?}",
                weight.shape()
            )));
        }
        Ok(Self { weight, eps })
    }

    pub fn dim(&self) -> usize {
        self.weight.size()
    }

    /// `out = weight * (input / sqrt(mean(input^2) + eps))`.
    ///
    /// `input`, `out` and the weight must all share one shape.
    pub fn forward(&self, out: &mut Tensor, input: &Tensor) -> NnResult<()> {
        self.check_shape(input)?;
        self.check_shape(out)?;
        let x = input.data();
        let scale = inv_rms(x, self.eps);
        for ((o, &w), &v) in out.data_mut().iter_mut().zip(self.weight.data()).zip(x) {
            *o = w * (scale * v);
        }
        Ok(())
    }

    /// Normalize `x` in place.
    pub fn forward_in_place(&self, x: &mut Tensor) -> NnResult<()> {
        self.check_shape(x)?;
        let data = x.data_mut();
        let scale = inv_rms(data, self.eps);
        for (v, &w) in data.iter_mut().zip(self.weight.data()) {
            *v = w * (scale * *v);
        }
        Ok(())
    }

    /// Normalize each row of a `[n, dim]` tensor independently.
    pub fn forward_rows(&self, input: &Tensor) -> NnResult<Tensor> {
        let dim = self.dim();
        if input.ndim() != 2 || input.shape()[1] != dim {
            return Err(NnError::ShapeMismatch(format!(
                "RMSNorm rows expect [n, {}], got {:?}",
                dim,
                input.shape()
            )));
        }
        let mut out = input.clone();
        for row in out.data_mut().chunks_exact_mut(dim) {
            let scale = inv_rms(row, self.eps);
            for (v, &w) in row.iter_mut().zip(self.weight.data()) {
                *v = w * (scale * *v);
            }
        }
        Ok(out)
    }

    fn check_shape(&self, t: &Tensor) -> NnResult<()> {
        if t.shape() != self.weight.shape() {
            return Err(TensorError::ShapeMismatch {
                expected: self.weight.shape().to_vec(),
                got: t.shape().to_vec(),
            }
            .into());
        }
        Ok(())
    }
}

fn inv_rms(x: &[f32], eps: f32) -> f32 {
    let mut ss = 0.0f32;
    for &v in x {
        ss += v * v;
    }
    ss /= x.len() as f32;
    ss += eps;
    1.0 / ss.sqrt()
}
