//! Tensor descriptors and shape utilities.
//!
//! # Core Tensor Utilities
//!
//! The kernels never own memory. They see borrowed descriptors:
//!
//! - [`Operand`] — a read-only `f32` buffer plus its shape
//! - [`OutputMut`] — the writable output buffer plus the broadcast shape
//!
//! [`Tensor`] is a small owned container for hosts, tests and demos that
//! hands out those descriptors.
//!
//! ## Design Highlights
//! - Row-major only; strides are always derived from the shape
//! - Shapes are plain `usize` slices, a rank-0 shape is a scalar
//! - Descriptors are validated with `briny` before a kernel reads them
//! - The `tensor!` macro builds `f32` tensors from nested literals
//!
//! ## Example
//!
//! ```rust
//! use binary_broadcast::tensors::{broadcast_shape, Tensor};
//! let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(t.shape, vec![2, 3]);
//! assert_eq!(broadcast_shape(&t.shape, &[3]), Some(vec![2, 3]));
//! ```

use briny::prelude::*;

/// Number of elements described by `shape`.
#[inline]
#[must_use]
pub fn count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Number of elements in the dimensions from `start` on (1 past the end).
#[inline]
#[must_use]
pub fn count_from(shape: &[usize], start: usize) -> usize {
    shape.get(start..).map_or(1, |tail| tail.iter().product())
}

/// Whether `a` and `b` have the same rank and agree on every dimension from
/// `start` on.
///
/// The rank must be larger than `start`, so there is at least one dimension
/// being compared.
#[must_use]
pub fn equal_from(a: &[usize], b: &[usize], start: usize) -> bool {
    a.len() == b.len() && a.len() > start && a[start..] == b[start..]
}

/// Right-aligns `shape` to `rank` by prepending 1s.
///
/// A shape already at or above `rank` is returned unchanged.
#[must_use]
pub fn pad_shape(shape: &[usize], rank: usize) -> Vec<usize> {
    let lead = rank.saturating_sub(shape.len());
    let mut padded = vec![1; lead];
    padded.extend_from_slice(shape);
    padded
}

/// NumPy-style broadcast of two shapes, or `None` when incompatible.
///
/// Shapes are aligned from the trailing dimension; each pair must be equal or
/// contain a 1, and the result takes the larger extent.
#[must_use]
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let rank = a.len().max(b.len());
    let a = pad_shape(a, rank);
    let b = pad_shape(b, rank);

    a.iter()
        .zip(&b)
        .map(|(&da, &db)| match (da, db) {
            _ if da == db => Some(da),
            (1, _) => Some(db),
            (_, 1) => Some(da),
            _ => None,
        })
        .collect()
}

/// A read-only, contiguous, row-major `f32` buffer and its shape.
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    /// Flat element storage.
    pub data: &'a [f32],
    /// Extents, outermost first.
    pub shape: &'a [usize],
}

impl<'a> Operand<'a> {
    /// Wraps a buffer and a shape without checking them.
    ///
    /// Kernels validate every operand before reading it.
    #[must_use]
    pub const fn new(data: &'a [f32], shape: &'a [usize]) -> Self {
        Self { data, shape }
    }
}

impl Validate for Operand<'_> {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.data.len() != count(self.shape) {
            return Err(ValidationError);
        }
        Ok(())
    }
}

/// The writable output buffer of a layer and its (broadcast) shape.
#[derive(Debug)]
pub struct OutputMut<'a> {
    /// Flat element storage.
    pub data: &'a mut [f32],
    /// Extents, outermost first.
    pub shape: &'a [usize],
}

impl<'a> OutputMut<'a> {
    /// Wraps a buffer and a shape without checking them.
    pub fn new(data: &'a mut [f32], shape: &'a [usize]) -> Self {
        Self { data, shape }
    }

    /// Read-only view of the current contents.
    #[must_use]
    pub fn as_operand(&self) -> Operand<'_> {
        Operand::new(&*self.data, self.shape)
    }
}

impl Validate for OutputMut<'_> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.as_operand().validate()
    }
}

/// Represents an N-dimensional `f32` tensor with a shape and flat row-major data.
///
/// - `shape` defines the structure, e.g., `[2, 3]` for a 2×3 matrix.
/// - `data` holds the flattened content in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Extents, outermost first.
    pub shape: Vec<usize>,
    /// Flat element storage.
    pub data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<f32>) -> Self {
        let shape = shape.into();
        assert_eq!(
            count(&shape),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        Self { shape, data }
    }

    /// Creates a zero-filled tensor.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let data = vec![0.0; count(&shape)];
        Self { shape, data }
    }

    /// Borrows the tensor as a kernel input.
    #[must_use]
    pub fn operand(&self) -> Operand<'_> {
        Operand::new(&self.data, &self.shape)
    }

    /// Borrows the tensor as a kernel output.
    pub fn output(&mut self) -> OutputMut<'_> {
        OutputMut::new(&mut self.data, &self.shape)
    }
}

/// Defines an `f32` tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
///
/// # Example
/// ```
/// use binary_broadcast::tensor;
/// let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(t.shape, vec![2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($lit:literal) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$lit])
    };

    ([ $( $inner:tt ),+ $(,)? ]) => {{
        let children = vec![ $( $crate::tensor!($inner) ),+ ];
        let first_shape = &children[0].shape;
        assert!(children.iter().all(|c| c.shape == *first_shape),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].data.len());
        for c in children { data.extend(c.data); }
        $crate::tensors::Tensor::new(shape, data)
    }};
}
