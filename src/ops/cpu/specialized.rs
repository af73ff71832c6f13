//! One loop per broadcast topology.
//!
//! Every loop walks the output in row-major order. The non-broadcast ("big")
//! operand is read at the output index; the broadcast ("small") operand is
//! read through the fixed layout its topology implies, see
//! [`Classification::fits`]. With `swap` the small operand is the declared
//! first input, which only changes the argument order passed to the operator.

use super::{run_vs, run_vv};
use crate::error::EltwiseError;
use crate::ops::binary::BinaryOp;
use crate::ops::classify::{channel_stride, BroadcastType, Classification};
use crate::ops::lanes::Lanes;
use crate::tensors::count_from;

/// Runs the loop for `class` over an output of shape `full`.
///
/// `lhs == None` means the first operand is `out` itself; callers never pass
/// that together with `swap`.
///
/// # Errors
/// [`EltwiseError::UnsupportedBroadcast`] for `General`, which has no loop here.
pub fn run<O: BinaryOp, V: Lanes>(
    class: Classification,
    full: &[usize],
    out: &mut [f32],
    lhs: Option<&[f32]>,
    rhs: &[f32],
) -> Result<(), EltwiseError> {
    let swap = class.swap;
    let (big, small) = match (swap, lhs) {
        (false, _) => (lhs, rhs),
        (true, Some(lhs)) => (Some(rhs), lhs),
        (true, None) => {
            return Err(EltwiseError::param(
                "an in-place update cannot broadcast its first operand",
            ));
        }
    };

    match class.kind {
        BroadcastType::Normal => run_vv::<O, V>(out, big, small, false),
        BroadcastType::Single => run_vs::<O, V>(out, big, small[0], swap),
        BroadcastType::Channel => channel::<O, V>(full, out, big, small, swap),
        BroadcastType::Element => element::<O, V>(full, out, big, small, swap),
        BroadcastType::HeightWidth => height_width::<O, V>(full, out, big, small, swap),
        BroadcastType::Width => width::<O, V>(full, out, big, small, swap),
        BroadcastType::General => {
            log::error!("general broadcast reached the specialized loops");
            return Err(EltwiseError::UnsupportedBroadcast {
                lhs: full.to_vec(),
                rhs: vec![small.len()],
            });
        }
    }
    Ok(())
}

#[inline(always)]
fn window(big: Option<&[f32]>, start: usize, len: usize) -> Option<&[f32]> {
    big.map(|b| &b[start..start + len])
}

/// Per-channel scalar, splatted once per (batch, channel).
fn channel<O: BinaryOp, V: Lanes>(
    full: &[usize],
    out: &mut [f32],
    big: Option<&[f32]>,
    small: &[f32],
    swap: bool,
) {
    let (batch, channels) = (full[0], full[1]);
    let stride = channel_stride(full);
    for b in 0..batch {
        for c in 0..channels {
            let base = (b * channels + c) * stride;
            run_vs::<O, V>(
                &mut out[base..base + stride],
                window(big, base, stride),
                small[c],
                swap,
            );
        }
    }
}

/// Small operand is one batch item, reused for every batch.
fn element<O: BinaryOp, V: Lanes>(
    full: &[usize],
    out: &mut [f32],
    big: Option<&[f32]>,
    small: &[f32],
    swap: bool,
) {
    let batch_stride = count_from(full, 1);
    for b in 0..full[0] {
        let base = b * batch_stride;
        run_vv::<O, V>(
            &mut out[base..base + batch_stride],
            window(big, base, batch_stride),
            small,
            swap,
        );
    }
}

/// Small operand is one spatial plane, reused for every (batch, channel).
fn height_width<O: BinaryOp, V: Lanes>(
    full: &[usize],
    out: &mut [f32],
    big: Option<&[f32]>,
    small: &[f32],
    swap: bool,
) {
    let (batch, channels) = (full[0], full[1]);
    let plane = count_from(full, 2);
    for b in 0..batch {
        for c in 0..channels {
            let base = (b * channels + c) * plane;
            run_vv::<O, V>(
                &mut out[base..base + plane],
                window(big, base, plane),
                small,
                swap,
            );
        }
    }
}

/// Small operand is one row, reused for every (batch, channel, height).
fn width<O: BinaryOp, V: Lanes>(
    full: &[usize],
    out: &mut [f32],
    big: Option<&[f32]>,
    small: &[f32],
    swap: bool,
) {
    let (batch, channels, height, row) = (full[0], full[1], full[2], full[3]);
    for b in 0..batch {
        for c in 0..channels {
            for h in 0..height {
                let base = ((b * channels + c) * height + h) * row;
                run_vv::<O, V>(&mut out[base..base + row], window(big, base, row), small, swap);
            }
        }
    }
}
