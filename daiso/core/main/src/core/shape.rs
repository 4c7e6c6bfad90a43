//! Tensor shape

use crate::api::error::{TensorError, TensorResult};
use smallvec::SmallVec;
use std::fmt;

/// Ordered dimension sizes of a tensor. Stack-allocated for up to 4 dims.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(SmallVec<[usize; 4]>);

impl Shape {
    pub fn new(dims: impl Into<SmallVec<[usize; 4]>>) -> Self {
        Self(dims.into())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of dims).
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Fails if the shape is empty or any dimension is zero.
    pub fn validate(&self) -> TensorResult<()> {
        if self.0.is_empty() || self.0.contains(&0) {
            return Err(TensorError::ZeroDimension(self.0.to_vec()));
        }
        Ok(())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(v))
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Self(SmallVec::from_slice(s))
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(a: [usize; N]) -> Self {
        Self(SmallVec::from_slice(&a))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numel_and_display() {
        let s = Shape::from([2, 3, 4]);
        assert_eq!(s.numel(), 24);
        assert_eq!(s.ndim(), 3);
        assert_eq!(s.to_string(), "[2, 3, 4]");
    }

    #[test]
    fn test_validate_rejects_zero_and_empty() {
        assert!(Shape::from([4, 1]).validate().is_ok());
        assert_eq!(
            Shape::from([4, 0]).validate(),
            Err(TensorError::ZeroDimension(vec![4, 0]))
        );
        assert!(Shape::from(Vec::new()).validate().is_err());
    }
}
