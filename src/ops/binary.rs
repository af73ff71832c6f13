//! Binary operator tags and their scalar/vector semantics.
//!
//! Each operator is a zero-sized type implementing [`BinaryOp`], so kernels are
//! monomorphized per operator and the inner loops carry no branch on the tag.

use core::fmt;
use core::str::FromStr;

use super::lanes::Lanes;
use crate::error::EltwiseError;

/// Operator tag carried by a binary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpType {
    Add = 0,
    Sub,
    Mul,
    Div,
    Max,
    Min,
}

impl OpType {
    /// Every operator with a compiled kernel.
    pub const ALL: [OpType; 6] = [
        OpType::Add,
        OpType::Sub,
        OpType::Mul,
        OpType::Div,
        OpType::Max,
        OpType::Min,
    ];

    /// Lower-case name used in logs and layer descriptions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Scalar evaluation of `op(a, b)`.
    ///
    /// Same rule the vector kernels apply lane by lane.
    #[must_use]
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Add => AddOp::scalar(a, b),
            Self::Sub => SubOp::scalar(a, b),
            Self::Mul => MulOp::scalar(a, b),
            Self::Div => DivOp::scalar(a, b),
            Self::Max => MaxOp::scalar(a, b),
            Self::Min => MinOp::scalar(a, b),
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OpType {
    type Err = EltwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "sub" => Ok(Self::Sub),
            "mul" => Ok(Self::Mul),
            "div" => Ok(Self::Div),
            "max" | "maximum" => Ok(Self::Max),
            "min" | "minimum" => Ok(Self::Min),
            other => {
                log::error!("no binary kernel for operator `{other}`");
                Err(EltwiseError::UnsupportedOperator(other.to_owned()))
            }
        }
    }
}

impl TryFrom<u8> for OpType {
    type Error = EltwiseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OpType::ALL.get(usize::from(value)).copied().ok_or_else(|| {
            log::error!("no binary kernel for operator tag {value}");
            EltwiseError::UnsupportedOperator(format!("tag {value}"))
        })
    }
}

/// A binary elementwise operator, evaluated on scalars and on lane vectors.
///
/// Both entry points receive the operands in declared order, `op(a, b)`.
pub trait BinaryOp {
    const TAG: OpType;

    fn scalar(a: f32, b: f32) -> f32;

    fn vector<V: Lanes>(a: V, b: V) -> V;
}

pub struct AddOp;
pub struct SubOp;
pub struct MulOp;
pub struct DivOp;
pub struct MaxOp;
pub struct MinOp;

impl BinaryOp for AddOp {
    const TAG: OpType = OpType::Add;

    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a + b
    }

    #[inline(always)]
    fn vector<V: Lanes>(a: V, b: V) -> V {
        a.add(b)
    }
}

impl BinaryOp for SubOp {
    const TAG: OpType = OpType::Sub;

    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a - b
    }

    #[inline(always)]
    fn vector<V: Lanes>(a: V, b: V) -> V {
        a.sub(b)
    }
}

impl BinaryOp for MulOp {
    const TAG: OpType = OpType::Mul;

    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a * b
    }

    #[inline(always)]
    fn vector<V: Lanes>(a: V, b: V) -> V {
        a.mul(b)
    }
}

impl BinaryOp for DivOp {
    const TAG: OpType = OpType::Div;

    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a / b
    }

    #[inline(always)]
    fn vector<V: Lanes>(a: V, b: V) -> V {
        a.div(b)
    }
}

impl BinaryOp for MaxOp {
    const TAG: OpType = OpType::Max;

    /// `a > b ? a : b`; a NaN on either side selects `b`.
    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        if a > b { a } else { b }
    }

    #[inline(always)]
    fn vector<V: Lanes>(a: V, b: V) -> V {
        a.max(b)
    }
}

impl BinaryOp for MinOp {
    const TAG: OpType = OpType::Min;

    /// `a < b ? a : b`; a NaN on either side selects `b`.
    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        if a < b { a } else { b }
    }

    #[inline(always)]
    fn vector<V: Lanes>(a: V, b: V) -> V {
        a.min(b)
    }
}
