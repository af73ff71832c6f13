//! Shape-generic broadcast engine.
//!
//! Handles every compatible operand/output pair, including shapes the
//! specialized loops do not cover (mutual broadcasts, interior unit dims,
//! outputs larger than both inputs).
//!
//! Each operand is right-aligned to the output rank and the output is split
//! into three nested ranges:
//!
//! - `outer`: the leading output dims the operand does not have (or has as 1);
//!   the whole pattern repeats once per outer index
//! - the middle span, walked with per-dim operand strides (zero where the
//!   operand has extent 1)
//! - an innermost block, either a contiguous run shared by operand and output,
//!   or a run of trailing broadcast dims where one operand value is replicated
//!
//! The first operand seeds the output; every later one is applied in place as
//! `out = op(out, x)`.

use super::{run_vs, run_vv};
use crate::ops::binary::BinaryOp;
use crate::ops::lanes::Lanes;
use crate::tensors::{count, pad_shape, Operand};

/// Innermost unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    /// One operand value covers `len` consecutive outputs.
    Splat(usize),
    /// `len` consecutive operand values map onto `len` consecutive outputs.
    Contiguous(usize),
}

impl Run {
    fn len(self) -> usize {
        match self {
            Run::Splat(len) | Run::Contiguous(len) => len,
        }
    }
}

/// How one operand maps onto the output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Plan {
    /// Extents of the middle span, outermost first.
    dims: Vec<usize>,
    /// Operand stride per middle dim; 0 where the operand is broadcast.
    strides: Vec<usize>,
    run: Run,
}

impl Plan {
    fn new(out_shape: &[usize], operand_shape: &[usize]) -> Self {
        let rank = out_shape.len();
        let padded = pad_shape(operand_shape, rank);

        let lead = padded.iter().take_while(|&&d| d == 1).count();
        if lead == rank {
            return Self {
                dims: Vec::new(),
                strides: Vec::new(),
                run: Run::Splat(count(out_shape)),
            };
        }

        let trail = padded.iter().rev().take_while(|&&d| d == 1).count();
        let (end, run) = if trail > 0 {
            (rank - trail, Run::Splat(count(&out_shape[rank - trail..])))
        } else {
            let tail = padded
                .iter()
                .zip(out_shape)
                .rev()
                .take_while(|(p, o)| p == o)
                .count();
            // A matching tail may run into the leading 1s; those belong to `outer`.
            let end = (rank - tail).max(lead);
            (end, Run::Contiguous(count(&out_shape[end..])))
        };

        let mut strides = vec![0; end - lead];
        let mut stride = count(&padded[end..]);
        for d in (lead..end).rev() {
            if padded[d] != 1 {
                strides[d - lead] = stride;
            }
            stride *= padded[d];
        }

        Self {
            dims: out_shape[lead..end].to_vec(),
            strides,
            run,
        }
    }

    /// Calls `f(block, offset)` for every innermost block of `out`, in order,
    /// with the operand offset of that block.
    fn for_each_block(&self, out: &mut [f32], mut f: impl FnMut(&mut [f32], usize)) {
        let len = self.run.len();
        if out.is_empty() || len == 0 {
            return;
        }

        let mut index = vec![0usize; self.dims.len()];
        let mut offset = 0;
        for block in out.chunks_exact_mut(len) {
            f(block, offset);

            for d in (0..self.dims.len()).rev() {
                index[d] += 1;
                offset += self.strides[d];
                if index[d] < self.dims[d] {
                    break;
                }
                offset -= self.strides[d] * self.dims[d];
                index[d] = 0;
            }
        }
    }
}

/// Writes `x` broadcast to `out_shape` into `out`.
pub fn seed(out: &mut [f32], out_shape: &[usize], x: Operand<'_>) {
    let plan = Plan::new(out_shape, x.shape);
    match plan.run {
        Run::Splat(_) => plan.for_each_block(out, |block, at| block.fill(x.data[at])),
        Run::Contiguous(len) => {
            plan.for_each_block(out, |block, at| block.copy_from_slice(&x.data[at..at + len]))
        }
    }
}

/// Applies `out = op(out, x)` with `x` broadcast to `out_shape`.
pub fn accumulate<O: BinaryOp, V: Lanes>(out: &mut [f32], out_shape: &[usize], x: Operand<'_>) {
    let plan = Plan::new(out_shape, x.shape);
    match plan.run {
        Run::Splat(_) => {
            plan.for_each_block(out, |block, at| run_vs::<O, V>(block, None, x.data[at], false))
        }
        Run::Contiguous(len) => plan.for_each_block(out, |block, at| {
            run_vv::<O, V>(block, None, &x.data[at..at + len], false)
        }),
    }
}
