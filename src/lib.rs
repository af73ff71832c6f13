//! binary_broadcast: broadcasting binary elementwise kernels for neural-network inference.
//!
//! Evaluates `add`, `sub`, `mul`, `div`, `max` and `min` over contiguous `f32`
//! tensors whose shapes differ under NumPy-style broadcasting.
//!
//! # Features
//!
//! - Broadcast topology classification with one tight loop per topology.
//! - A shape-generic engine for every other compatible shape pair.
//! - 4- or 8-lane vector kernels selected from the host capability.
//! - In-place updates and left-to-right folding over any number of operands.
//!
//! # Modules
//!
//! - [`tensors`] — Operand descriptors, an owned tensor and shape helpers.
//! - [`ops`] — Operators, classification, CPU kernels and dispatch.
//! - [`layer`] — Layer parameters and stored constant operands.
//! - [`backend`] — Host vector capability detection and selection.
//! - [`error`] — The error type shared by every entry point.
//!
//! # Example
//!
//! ```rust
//! use binary_broadcast::{execute, BinaryLayer, Capability, OpType, Tensor};
//!
//! let x = Tensor::new(vec![2, 3, 2, 2], (0..24).map(|i| i as f32).collect());
//! let bias = Tensor::new(vec![3, 1, 1], vec![100.0, 200.0, 300.0]);
//! let mut out = Tensor::zeros(vec![2, 3, 2, 2]);
//!
//! execute(
//!     &BinaryLayer::new(OpType::Add),
//!     &mut out.output(),
//!     &[x.operand(), bias.operand()],
//!     Capability::Avx2,
//! )
//! .unwrap();
//! assert_eq!(out.data[4], 204.0);
//! ```

pub mod backend;
pub mod error;
pub mod layer;
pub mod ops;
pub mod tensors;

pub use backend::Capability;
pub use error::EltwiseError;
pub use layer::{BinaryLayer, BinaryParam, ElementResource};
pub use ops::binary::OpType;
pub use ops::cpu::Lhs;
pub use ops::dispatch::{execute, execute_in_place, forward, select, BinaryFn};
pub use tensors::{Operand, OutputMut, Tensor};
