//! Operator dispatch layer
//!
//! This module turns a layer invocation into calls of one monomorphized
//! kernel, selected by operator and vector capability.
//!
//! Each invocation:
//! 1. Resolves the operand list from the runtime inputs and the stored constant
//! 2. Validates every buffer and the broadcast chain before touching the output
//! 3. Folds left to right: `out = op(x0, x1)`, then `out = op(out, xi)`
//!
//! # Design Highlights
//! - **Strategy table**: [`select`] maps `(OpType, Capability)` to a plain `fn` pointer
//! - **No hidden state**: nothing survives between invocations
//! - **All or nothing**: an invalid invocation fails before the first write
//!
//! # Example
//! ```rust
//! use binary_broadcast::backend::Capability;
//! use binary_broadcast::layer::BinaryLayer;
//! use binary_broadcast::ops::binary::OpType;
//! use binary_broadcast::ops::dispatch::execute;
//! use binary_broadcast::tensors::Tensor;
//!
//! let a = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! let b = Tensor::new(vec![3], vec![10.0, 20.0, 30.0]);
//! let mut out = Tensor::zeros(vec![2, 3]);
//!
//! let layer = BinaryLayer::new(OpType::Add);
//! execute(&layer, &mut out.output(), &[a.operand(), b.operand()], Capability::Sse42).unwrap();
//! assert_eq!(out.data, vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
//! ```

use briny::prelude::*;

use super::binary::{AddOp, DivOp, MaxOp, MinOp, MulOp, OpType, SubOp};
use super::cpu::{binary_func, Lhs};
use super::lanes::{F32x4, F32x8};
use crate::backend::{get_capability, Capability};
use crate::error::EltwiseError;
use crate::layer::BinaryLayer;
use crate::tensors::{broadcast_shape, Operand, OutputMut};

/// One kernel instantiation: `out = op(lhs, rhs)`.
pub type BinaryFn = fn(&mut OutputMut<'_>, Lhs<'_>, Operand<'_>) -> Result<(), EltwiseError>;

/// Picks the kernel for `op` at the vector width of `capability`.
///
/// `Avx2` selects 8 lanes, everything else 4.
#[must_use]
pub fn select(op: OpType, capability: Capability) -> BinaryFn {
    match (op, capability) {
        (OpType::Add, Capability::Avx2) => binary_func::<AddOp, F32x8>,
        (OpType::Sub, Capability::Avx2) => binary_func::<SubOp, F32x8>,
        (OpType::Mul, Capability::Avx2) => binary_func::<MulOp, F32x8>,
        (OpType::Div, Capability::Avx2) => binary_func::<DivOp, F32x8>,
        (OpType::Max, Capability::Avx2) => binary_func::<MaxOp, F32x8>,
        (OpType::Min, Capability::Avx2) => binary_func::<MinOp, F32x8>,
        (OpType::Add, Capability::Sse42) => binary_func::<AddOp, F32x4>,
        (OpType::Sub, Capability::Sse42) => binary_func::<SubOp, F32x4>,
        (OpType::Mul, Capability::Sse42) => binary_func::<MulOp, F32x4>,
        (OpType::Div, Capability::Sse42) => binary_func::<DivOp, F32x4>,
        (OpType::Max, Capability::Sse42) => binary_func::<MaxOp, F32x4>,
        (OpType::Min, Capability::Sse42) => binary_func::<MinOp, F32x4>,
    }
}

fn layer_op(layer: &BinaryLayer) -> Result<OpType, EltwiseError> {
    let param = layer
        .param
        .ok_or_else(|| EltwiseError::param("binary layer has no parameters"))?;
    param.validate().map_err(|_| {
        EltwiseError::param(format!(
            "weight_input_index must be 0 or 1, got {}",
            param.weight_input_index
        ))
    })?;
    Ok(param.op)
}

/// Builds the ordered operand list of a layer invocation.
///
/// - one input plus a stored constant: ordered by `weight_input_index`
/// - one input alone: the input twice, `op(x, x)`
/// - otherwise: the inputs as given (a stored constant is not used)
fn resolve<'a>(
    layer: &'a BinaryLayer,
    inputs: &[Operand<'a>],
) -> Result<Vec<Operand<'a>>, EltwiseError> {
    let weight_index = layer.param.map_or(1, |p| p.weight_input_index);
    match (inputs, &layer.resource) {
        ([], _) => Err(EltwiseError::param("binary layer has no inputs")),
        ([x], Some(constant)) if weight_index == 0 => Ok(vec![constant.operand(), *x]),
        ([x], Some(constant)) => Ok(vec![*x, constant.operand()]),
        ([x], None) => Ok(vec![*x, *x]),
        (all, _) => Ok(all.to_vec()),
    }
}

/// Checks every buffer and that the whole fold lands in `out`'s shape.
fn check_chain(
    out: &OutputMut<'_>,
    start: &[usize],
    operands: &[Operand<'_>],
) -> Result<(), EltwiseError> {
    out.validate()?;
    for x in operands {
        x.validate()?;
    }

    let mut acc = start.to_vec();
    for x in operands {
        acc = broadcast_shape(&acc, x.shape)
            .ok_or_else(|| EltwiseError::incompatible(&acc, x.shape))?;
    }
    if broadcast_shape(&acc, out.shape).as_deref() != Some(out.shape) {
        return Err(EltwiseError::incompatible(&acc, out.shape));
    }
    Ok(())
}

/// Evaluates a binary layer into `output`.
///
/// # Behavior
/// - Width 8 when `capability` is `Avx2`, 4 otherwise
/// - `op(x0, x1)` for two operands, then `out = op(out, xi)` for every further one
///
/// # Errors
/// - [`EltwiseError::Param`] if the layer has no parameters or no inputs
/// - [`EltwiseError::InvalidOperand`] if a buffer length disagrees with its shape
/// - [`EltwiseError::IncompatibleShapes`] if the operands do not broadcast into `output`
///
/// The output is left untouched on error.
pub fn execute(
    layer: &BinaryLayer,
    output: &mut OutputMut<'_>,
    inputs: &[Operand<'_>],
    capability: Capability,
) -> Result<(), EltwiseError> {
    let op = layer_op(layer)?;
    let operands = resolve(layer, inputs)?;
    let (first, rest) = (operands[0], &operands[1..]);
    check_chain(output, first.shape, &operands)?;

    let kernel = select(op, capability);
    log::debug!(
        "{op}: {} operand(s) into {:?}, {} lanes",
        operands.len(),
        output.shape,
        capability.lanes()
    );

    kernel(output, Lhs::Operand(first), rest[0])?;
    for &x in &rest[1..] {
        kernel(output, Lhs::Output, x)?;
    }
    Ok(())
}

/// Evaluates a binary layer whose first operand is `output` itself.
///
/// Computes `out = op(out, others[0])`, then `out = op(out, others[i])`. With
/// no `others`, the stored constant is applied as the second operand; a
/// constant configured as the first operand cannot be applied in place.
///
/// # Errors
/// Same as [`execute`]; additionally [`EltwiseError::Param`] when there is no
/// second operand to apply.
pub fn execute_in_place(
    layer: &BinaryLayer,
    output: &mut OutputMut<'_>,
    others: &[Operand<'_>],
    capability: Capability,
) -> Result<(), EltwiseError> {
    let op = layer_op(layer)?;
    let weight_index = layer.param.map_or(1, |p| p.weight_input_index);

    let operands: Vec<Operand<'_>> = match (others, &layer.resource) {
        ([], Some(constant)) if weight_index == 1 => vec![constant.operand()],
        ([], Some(_)) => {
            return Err(EltwiseError::param(
                "an in-place update cannot take the constant as its first operand",
            ));
        }
        ([], None) => {
            return Err(EltwiseError::param("an in-place update needs a second operand"));
        }
        (all, _) => all.to_vec(),
    };
    check_chain(output, output.shape, &operands)?;

    let kernel = select(op, capability);
    log::debug!(
        "{op}: in place, {} operand(s) into {:?}, {} lanes",
        operands.len(),
        output.shape,
        capability.lanes()
    );

    for x in operands {
        kernel(output, Lhs::Output, x)?;
    }
    Ok(())
}

/// [`execute`] at the process-wide capability from [`get_capability`].
pub fn forward(
    layer: &BinaryLayer,
    output: &mut OutputMut<'_>,
    inputs: &[Operand<'_>],
) -> Result<(), EltwiseError> {
    execute(layer, output, inputs, get_capability())
}
