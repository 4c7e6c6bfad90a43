//! f32 Tensor over owned or arena-backed storage.

use crate::api::error::{TensorError, TensorResult};
use crate::core::shape::Shape;
use std::fmt;
use std::sync::Arc;

/// Underlying storage for tensor data.
#[derive(Clone)]
pub enum Storage {
    /// Exclusively owned, mutable buffer.
    Owned(Vec<f32>),
    /// Read-only window into a shared arena.
    View {
        arena: Arc<[f32]>,
        offset: usize,
        len: usize,
    },
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Owned(v) => write!(f, "Owned({} elements)", v.len()),
            Storage::View { offset, len, .. } => {
                write!(f, "View(offset={}, len={})", offset, len)
            }
        }
    }
}

/// A shaped, row-major buffer of `f32` values.
///
/// The buffer length always equals the product of the shape, and every
/// dimension is at least 1.
#[derive(Clone)]
pub struct Tensor {
    storage: Storage,
    shape: Shape,
}

impl Tensor {
    // ==================== Constructors ====================

    /// Create a zero-filled tensor. Fails if any dimension is 0.
    pub fn new(shape: impl Into<Shape>) -> TensorResult<Self> {
        Self::full(shape, 0.0)
    }

    /// Create a tensor filled with `value`.
    pub fn full(shape: impl Into<Shape>, value: f32) -> TensorResult<Self> {
        let shape = shape.into();
        shape.validate()?;
        Ok(Self {
            storage: Storage::Owned(vec![value; shape.numel()]),
            shape,
        })
    }

    /// Create a tensor from an f32 vector with the given shape.
    pub fn from_vec(data: Vec<f32>, shape: impl Into<Shape>) -> TensorResult<Self> {
        let shape = shape.into();
        shape.validate()?;
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            storage: Storage::Owned(data),
            shape,
        })
    }

    /// Create a read-only view of `shape.numel()` elements starting at `offset`.
    pub fn from_arena(arena: Arc<[f32]>, offset: usize, shape: impl Into<Shape>) -> TensorResult<Self> {
        let shape = shape.into();
        shape.validate()?;
        let len = shape.numel();
        let end = offset.checked_add(len).unwrap_or(usize::MAX);
        if end > arena.len() {
            return Err(TensorError::ArenaOutOfBounds {
                offset,
                end,
                len: arena.len(),
            });
        }
        Ok(Self {
            storage: Storage::View { arena, offset, len },
            shape,
        })
    }

    // ==================== Properties ====================

    pub fn shape(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.shape.numel()
    }

    /// Whether the buffer is a view into a shared arena.
    pub fn is_view(&self) -> bool {
        matches!(self.storage, Storage::View { .. })
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // ==================== Data access ====================

    /// Flat read access to the buffer.
    pub fn data(&self) -> &[f32] {
        match &self.storage {
            Storage::Owned(v) => v,
            Storage::View { arena, offset, len } => &arena[*offset..*offset + *len],
        }
    }

    /// Flat write access to the buffer.
    ///
    /// A view is first copied into owned storage, so writes never reach the
    /// shared arena.
    pub fn data_mut(&mut self) -> &mut [f32] {
        if let Storage::View { arena, offset, len } = &self.storage {
            let owned = arena[*offset..*offset + *len].to_vec();
            self.storage = Storage::Owned(owned);
        }
        match &mut self.storage {
            Storage::Owned(v) => v,
            Storage::View { .. } => unreachable!("view materialized above"),
        }
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data().to_vec()
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: f32) {
        self.data_mut().fill(value);
    }

    /// Change the shape in place. The element count must be preserved.
    pub fn reshape(&mut self, new_shape: impl Into<Shape>) -> TensorResult<()> {
        let new_shape = new_shape.into();
        new_shape.validate()?;
        if new_shape.numel() != self.size() {
            return Err(TensorError::ReshapeMismatch {
                from: self.shape().to_vec(),
                to: new_shape.dims().to_vec(),
            });
        }
        self.shape = new_shape;
        Ok(())
    }

    // ==================== Indexed accessors ====================

    pub fn at(&self, i: usize) -> TensorResult<f32> {
        let idx = self.offset_of(&[i])?;
        Ok(self.data()[idx])
    }

    pub fn at2(&self, i: usize, j: usize) -> TensorResult<f32> {
        let idx = self.offset_of(&[i, j])?;
        Ok(self.data()[idx])
    }

    pub fn at3(&self, i: usize, j: usize, k: usize) -> TensorResult<f32> {
        let idx = self.offset_of(&[i, j, k])?;
        Ok(self.data()[idx])
    }

    pub fn at_mut(&mut self, i: usize) -> TensorResult<&mut f32> {
        let idx = self.offset_of(&[i])?;
        Ok(&mut self.data_mut()[idx])
    }

    pub fn at2_mut(&mut self, i: usize, j: usize) -> TensorResult<&mut f32> {
        let idx = self.offset_of(&[i, j])?;
        Ok(&mut self.data_mut()[idx])
    }

    pub fn at3_mut(&mut self, i: usize, j: usize, k: usize) -> TensorResult<&mut f32> {
        let idx = self.offset_of(&[i, j, k])?;
        Ok(&mut self.data_mut()[idx])
    }

    /// Row `i` of a 2-D tensor.
    pub fn row(&self, i: usize) -> TensorResult<&[f32]> {
        let cols = self.require_2d()?.1;
        let start = self.offset_of(&[i, 0])?;
        Ok(&self.data()[start..start + cols])
    }

    /// Mutable row `i` of a 2-D tensor.
    pub fn row_mut(&mut self, i: usize) -> TensorResult<&mut [f32]> {
        let cols = self.require_2d()?.1;
        let start = self.offset_of(&[i, 0])?;
        Ok(&mut self.data_mut()[start..start + cols])
    }

    /// Transpose of a 2-D tensor into a new owned tensor.
    pub fn transpose(&self) -> TensorResult<Tensor> {
        let (rows, cols) = self.require_2d()?;
        let src = self.data();
        let mut out = vec![0.0f32; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                out[j * rows + i] = src[i * cols + j];
            }
        }
        Tensor::from_vec(out, [cols, rows])
    }

    // ==================== Internal helpers ====================

    pub(crate) fn require_2d(&self) -> TensorResult<(usize, usize)> {
        match self.shape() {
            [rows, cols] => Ok((*rows, *cols)),
            other => Err(TensorError::RankMismatch {
                expected: 2,
                got: other.len(),
            }),
        }
    }

    fn offset_of(&self, indices: &[usize]) -> TensorResult<usize> {
        let dims = self.shape();
        if indices.len() != dims.len() {
            return Err(TensorError::RankMismatch {
                expected: indices.len(),
                got: dims.len(),
            });
        }
        let mut offset = 0;
        for (dim, (&index, &size)) in indices.iter().zip(dims).enumerate() {
            if index >= size {
                return Err(TensorError::IndexOutOfBounds { dim, index, size });
            }
            offset = offset * size + index;
        }
        Ok(offset)
    }
}

// ==================== Display ====================

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={}, storage={:?})", self.shape, self.storage)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        if data.len() <= 16 {
            write!(f, "Tensor({}, {:?})", self.shape, data)
        } else {
            write!(
                f,
                "Tensor({}, [{:.4}, {:.4}, ..., {:.4}, {:.4}])",
                self.shape,
                data[0],
                data[1],
                data[data.len() - 2],
                data[data.len() - 1],
            )
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;

    #[test]
    fn test_tensor_creation() {
        let t = Tensor::new([2, 3]).unwrap();
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.size(), 6);
        assert!(t.data().iter().all(|&v| v == 0.0));
        assert!(!t.is_view());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = Tensor::new([3, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(Tensor::from_vec(vec![], Vec::<usize>::new()).is_err());
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let err = Tensor::from_vec(vec![1.0, 2.0, 3.0], [2, 2]).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reshape_preserves_size() {
        let mut t = Tensor::from_vec((0..6).map(|i| i as f32).collect(), [2, 3]).unwrap();
        t.reshape([3, 2]).unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.at2(2, 1).unwrap(), 5.0);

        let err = t.reshape([4, 2]).unwrap_err();
        assert!(matches!(err, TensorError::ReshapeMismatch { .. }));
        assert_eq!(t.shape(), &[3, 2]);
    }

    #[test]
    fn test_accessor_rank_checked() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        assert_eq!(t.at2(1, 0).unwrap(), 3.0);

        let err = t.at(1).unwrap_err();
        assert_eq!(err, TensorError::RankMismatch { expected: 1, got: 2 });
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(t.at3(0, 0, 0).is_err());
    }

    #[test]
    fn test_accessor_bounds_checked() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [1, 2, 3]).unwrap();
        assert_eq!(t.at3(0, 1, 2).unwrap(), 6.0);
        let err = t.at3(0, 2, 0).unwrap_err();
        assert_eq!(err, TensorError::IndexOutOfBounds { dim: 1, index: 2, size: 2 });
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_mutable_accessors() {
        let mut t = Tensor::new([3]).unwrap();
        *t.at_mut(1).unwrap() = 7.0;
        assert_eq!(t.data(), &[0.0, 7.0, 0.0]);

        let mut m = Tensor::new([2, 2]).unwrap();
        m.row_mut(1).unwrap().copy_from_slice(&[8.0, 9.0]);
        assert_eq!(m.row(1).unwrap(), &[8.0, 9.0]);
    }

    #[test]
    fn test_arena_view_is_copy_on_write() {
        let arena: Arc<[f32]> = Arc::from(vec![1.0f32, 2.0, 3.0, 4.0, 5.0]);
        let mut v = Tensor::from_arena(arena.clone(), 1, [2, 2]).unwrap();
        assert!(v.is_view());
        assert_eq!(v.data(), &[2.0, 3.0, 4.0, 5.0]);

        v.data_mut()[0] = -1.0;
        assert!(!v.is_view());
        assert_eq!(v.at2(0, 0).unwrap(), -1.0);
        assert_eq!(arena[1], 2.0);
    }

    #[test]
    fn test_arena_view_bounds() {
        let arena: Arc<[f32]> = Arc::from(vec![0.0f32; 4]);
        let err = Tensor::from_arena(arena, 2, [3]).unwrap_err();
        assert_eq!(err, TensorError::ArenaOutOfBounds { offset: 2, end: 5, len: 4 });
    }

    #[test]
    fn test_transpose() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
        let tt = t.transpose().unwrap();
        assert_eq!(tt.shape(), &[3, 2]);
        assert_eq!(tt.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }
}
