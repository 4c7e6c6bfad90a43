pub mod arena;
pub mod kernels;
pub mod shape;
pub mod tensor;
