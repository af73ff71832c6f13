//! CPU binary elementwise kernels
//!
//! # CPU Backend
//!
//! This module evaluates one binary operator over two operands whose shapes
//! broadcast against each other, writing into a pre-sized output buffer.
//!
//! The dispatcher in [`crate::ops::dispatch`] folds longer operand lists onto
//! [`binary_func`] one pair at a time.
//!
//! ## Features
//!
//! - One tight loop per broadcast topology ([`specialized`])
//! - A shape-generic fallback for every other compatible pair ([`general`])
//! - Vector width chosen by the [`Lanes`] type, scalar cleanup for remainders
//! - In-place update of the output through [`Lhs::Output`]
//!
//! ## Safety
//!
//! - No `unsafe` here; intrinsics are confined to [`crate::ops::lanes`]
//! - Every operand is validated before the first write to the output

pub mod general;
pub mod specialized;

use briny::prelude::*;

use super::binary::BinaryOp;
use super::classify::{classify, BroadcastType};
use super::lanes::Lanes;
use crate::error::EltwiseError;
use crate::tensors::{broadcast_shape, Operand, OutputMut};

/// First operand of a binary step.
#[derive(Debug, Clone, Copy)]
pub enum Lhs<'a> {
    /// A separate input buffer.
    Operand(Operand<'a>),
    /// The output buffer itself (in-place update, `out = op(out, rhs)`).
    Output,
}

/// Computes `out = op(lhs, rhs)` with NumPy broadcasting.
///
/// # Requirements
/// - Every buffer length matches its shape.
/// - `lhs` and `rhs` broadcast to a shape that itself broadcasts to `out.shape`.
///
/// # Behavior
/// Classifies the pair, runs the specialized loop when its layout assumption
/// holds for these shapes, and the general engine otherwise. Both produce the
/// same values; the operator always sees `(lhs, rhs)` in that order.
///
/// # Errors
/// - [`EltwiseError::InvalidOperand`] if a buffer length disagrees with its shape
/// - [`EltwiseError::IncompatibleShapes`] if the shapes do not broadcast
///
/// Nothing is written on error.
pub fn binary_func<O: BinaryOp, V: Lanes>(
    out: &mut OutputMut<'_>,
    lhs: Lhs<'_>,
    rhs: Operand<'_>,
) -> Result<(), EltwiseError> {
    out.validate()?;
    rhs.validate()?;
    let out_shape = out.shape;
    let lhs_shape = match lhs {
        Lhs::Operand(op) => {
            op.validate()?;
            op.shape
        }
        Lhs::Output => out_shape,
    };

    let full = broadcast_shape(lhs_shape, rhs.shape)
        .ok_or_else(|| EltwiseError::incompatible(lhs_shape, rhs.shape))?;
    if broadcast_shape(&full, out_shape).as_deref() != Some(out_shape) {
        return Err(EltwiseError::incompatible(&full, out_shape));
    }

    let class = classify(&full, lhs_shape, rhs.shape);
    let in_place = matches!(lhs, Lhs::Output);
    let lhs_data = match lhs {
        Lhs::Operand(op) => Some(op.data),
        Lhs::Output => None,
    };

    if class.kind != BroadcastType::General
        && !(in_place && class.swap)
        && class.fits(out_shape, &full, lhs_shape, rhs.shape)
    {
        log::trace!("{} {:?}: specialized loop, {} lanes", O::TAG, class.kind, V::LANES);
        specialized::run::<O, V>(class, &full, out.data, lhs_data, rhs.data)
    } else {
        log::trace!("{} {:?}: general engine, {} lanes", O::TAG, class.kind, V::LANES);
        if let Some(data) = lhs_data {
            general::seed(out.data, out_shape, Operand::new(data, lhs_shape));
        }
        general::accumulate::<O, V>(out.data, out_shape, rhs);
        Ok(())
    }
}

/// Combines one big-operand element with one small-operand element.
///
/// Under `swap` the small operand is the declared first input.
#[inline(always)]
fn pick<O: BinaryOp>(big: f32, small: f32, swap: bool) -> f32 {
    if swap { O::scalar(small, big) } else { O::scalar(big, small) }
}

#[inline(always)]
fn pick_v<O: BinaryOp, V: Lanes>(big: V, small: V, swap: bool) -> V {
    if swap { O::vector(small, big) } else { O::vector(big, small) }
}

/// `out[i] = op(big[i], small[i])`, with `big == None` reading `out` itself.
///
/// `small` (and `big`) must hold at least `out.len()` elements.
#[inline]
fn run_vv<O: BinaryOp, V: Lanes>(out: &mut [f32], big: Option<&[f32]>, small: &[f32], swap: bool) {
    let n = out.len();
    let w = V::LANES;
    let mut i = 0;
    while i + w <= n {
        let x = V::load(big.map_or(&out[i..], |b| &b[i..]));
        let y = V::load(&small[i..]);
        pick_v::<O, V>(x, y, swap).store(&mut out[i..]);
        i += w;
    }
    while i < n {
        let x = big.map_or(out[i], |b| b[i]);
        out[i] = pick::<O>(x, small[i], swap);
        i += 1;
    }
}

/// `out[i] = op(big[i], scalar)`, with `big == None` reading `out` itself.
#[inline]
fn run_vs<O: BinaryOp, V: Lanes>(out: &mut [f32], big: Option<&[f32]>, scalar: f32, swap: bool) {
    let n = out.len();
    let w = V::LANES;
    let y = V::splat(scalar);
    let mut i = 0;
    while i + w <= n {
        let x = V::load(big.map_or(&out[i..], |b| &b[i..]));
        pick_v::<O, V>(x, y, swap).store(&mut out[i..]);
        i += w;
    }
    while i < n {
        let x = big.map_or(out[i], |b| b[i]);
        out[i] = pick::<O>(x, scalar, swap);
        i += 1;
    }
}
