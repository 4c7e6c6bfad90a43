//! Facade re-exports for daiso-core

pub use crate::api::error::*;
pub use crate::core::arena::WeightArena;
pub use crate::core::kernels::{add_in_place, dot, matvec, sigmoid_scalar, silu, softmax_in_place};
pub use crate::core::shape::Shape;
pub use crate::core::tensor::{add, element_wise_mul, matmul, sigmoid, softmax, Storage, Tensor};
