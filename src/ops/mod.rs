//! # Binary Operation Layer
//!
//! This module defines the broadcasting binary elementwise operators and
//! dispatches them to CPU kernels of the requested vector width.
//!
//! ## Submodules
//!
//! - [`binary`] — Operator tags and their scalar/vector semantics
//! - [`classify`] — Broadcast topology of a shape pair
//! - [`lanes`] — 4- and 8-wide `f32` vectors (SSE/AVX with `simd`)
//! - [`cpu`] — Specialized loops and the shape-generic engine
//! - [`dispatch`] — Strategy table, operand resolution and folding
//!
//! ## Example
//!
//! ```rust
//! use binary_broadcast::layer::BinaryLayer;
//! use binary_broadcast::ops::{binary::OpType, dispatch::forward};
//! use binary_broadcast::tensor;
//! use binary_broadcast::tensors::Tensor;
//!
//! let x = tensor!([[1.0, 8.0], [6.0, 2.0]]);
//! let y = tensor!([5.0, 5.0]);
//! let mut out = Tensor::zeros(vec![2, 2]);
//!
//! forward(&BinaryLayer::new(OpType::Max), &mut out.output(), &[x.operand(), y.operand()]).unwrap();
//! assert_eq!(out.data, vec![5.0, 8.0, 6.0, 5.0]);
//! ```
//!
//! ## Feature Flags
//!
//! - `simd` — Maps the lanes onto SSE (and AVX when the target enables it) on `x86_64`

pub mod binary;
pub mod classify;
pub mod cpu;
pub mod dispatch;
pub mod lanes;
