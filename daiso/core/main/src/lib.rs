//! # Daiso Core
//!
//! Tensor storage and numeric kernels for the Daiso inference engine.
//!
//! This crate provides a `Tensor` type over `f32` buffers that are either
//! owned outright or viewed out of a shared, read-only weight arena, plus
//! the handful of operations a decoder-only transformer needs.
//!
//! ## Features
//!
//! - Row-major tensors with checked 1-, 2- and 3-D accessors
//! - Free functions with explicit output buffers (`matmul`, `add`, `softmax`, ...)
//! - Slice kernels for the single-token hot path (`matvec`, `dot`)
//! - A contiguous weight arena carved into tensor views
//!
//! ## Example
//!
//! ```rust
//! use daiso_core::{matmul, Tensor};
//!
//! let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
//! let b = Tensor::from_vec(vec![5.0, 6.0, 7.0, 8.0], [2, 2]).unwrap();
//! let mut c = Tensor::new([2, 2]).unwrap();
//! matmul(&mut c, &a, &b).unwrap();
//! assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
