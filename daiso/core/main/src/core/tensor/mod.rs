mod ops;
#[allow(clippy::module_inception)]
mod tensor;

pub use ops::{add, element_wise_mul, matmul, sigmoid, softmax};
pub use tensor::{Storage, Tensor};
