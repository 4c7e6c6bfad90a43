//! Contiguous weight storage.
//!
//! All model weights are decoded once into a single `Arc<[f32]>`. A
//! `WeightArena` hands out read-only tensor views over consecutive ranges of
//! that buffer, in the order the caller asks for them, so the file's fixed
//! tensor order maps directly onto arena offsets.

use crate::api::error::{TensorError, TensorResult};
use crate::core::shape::Shape;
use crate::core::tensor::Tensor;
use std::sync::Arc;

pub struct WeightArena {
    data: Arc<[f32]>,
    cursor: usize,
}

impl WeightArena {
    pub fn new(data: impl Into<Arc<[f32]>>) -> Self {
        Self {
            data: data.into(),
            cursor: 0,
        }
    }

    /// Next `shape.numel()` elements as a view, advancing the cursor.
    pub fn take(&mut self, shape: impl Into<Shape>) -> TensorResult<Tensor> {
        let shape = shape.into();
        let len = shape.numel();
        let view = Tensor::from_arena(self.data.clone(), self.cursor, shape)?;
        self.cursor += len;
        Ok(view)
    }

    /// Total number of elements in the arena.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements not yet handed out.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Fails unless every element has been handed out.
    pub fn finish(self) -> TensorResult<()> {
        if self.cursor != self.data.len() {
            return Err(TensorError::ArenaOutOfBounds {
                offset: self.cursor,
                end: self.data.len(),
                len: self.data.len(),
            });
        }
        Ok(())
    }
}
