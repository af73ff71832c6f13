#![allow(dead_code)]

use binary_broadcast::tensors::{broadcast_shape, count, pad_shape};
use binary_broadcast::{OpType, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Row-major multi-index of flat position `flat` in `shape`.
fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for d in (0..shape.len()).rev() {
        index[d] = flat % shape[d];
        flat /= shape[d];
    }
    index
}

/// Element of `t` feeding output position `index` (right-aligned, 1s broadcast).
fn broadcast_read(t: &Tensor, index: &[usize]) -> f32 {
    let padded = pad_shape(&t.shape, index.len());
    let mut flat = 0;
    for (d, &extent) in padded.iter().enumerate() {
        let i = if extent == 1 { 0 } else { index[d] };
        flat = flat * extent + i;
    }
    t.data[flat]
}

/// Naive nested-loop evaluation of `op(op(x0, x1), x2) ...` into `out_shape`.
pub fn reference(op: OpType, out_shape: &[usize], operands: &[&Tensor]) -> Vec<f32> {
    (0..count(out_shape))
        .map(|flat| {
            let index = unravel(flat, out_shape);
            let mut acc = broadcast_read(operands[0], &index);
            for x in &operands[1..] {
                acc = op.apply(acc, broadcast_read(x, &index));
            }
            acc
        })
        .collect()
}

/// Broadcast shape of all operands.
pub fn full_shape(shapes: &[&[usize]]) -> Vec<usize> {
    shapes
        .iter()
        .try_fold(Vec::new(), |acc, s| broadcast_shape(&acc, s))
        .expect("test shapes must broadcast")
}

pub fn random_tensor(rng: &mut StdRng, shape: &[usize]) -> Tensor {
    let data = (0..count(shape))
        .map(|_| rng.random_range(-10.0f32..10.0))
        .collect();
    Tensor::new(shape.to_vec(), data)
}

/// A random shape of rank 1..=4 with extents 1..=6.
pub fn random_shape(rng: &mut StdRng) -> Vec<usize> {
    let rank = rng.random_range(1..=4);
    (0..rank).map(|_| rng.random_range(1..=6)).collect()
}

/// A shape that broadcasts to `full`: some dims collapsed to 1, some leading
/// dims dropped.
pub fn broadcastable_from(rng: &mut StdRng, full: &[usize]) -> Vec<usize> {
    let drop = rng.random_range(0..=full.len());
    full[drop..]
        .iter()
        .map(|&d| if rng.random_bool(0.4) { 1 } else { d })
        .collect()
}

/// Element-wise equality that treats NaN as equal to NaN.
pub fn assert_same(actual: &[f32], expected: &[f32], context: &str) {
    assert_eq!(actual.len(), expected.len(), "{context}: length");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            a == e || (a.is_nan() && e.is_nan()),
            "{context}: element {i} is {a}, expected {e}"
        );
    }
}
