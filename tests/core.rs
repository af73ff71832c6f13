mod common;

use binary_broadcast::backend::{get_capability, set_capability};
use binary_broadcast::{
    execute, execute_in_place, forward, BinaryLayer, Capability, EltwiseError, ElementResource, OpType,
    Operand, Tensor,
};
use common::{assert_same, random_tensor, reference, rng};
use rayon::prelude::*;

#[test]
fn test_fold_is_left_to_right() {
    let a = Tensor::new(vec![4], vec![100.0, 50.0, 8.0, -3.0]);
    let b = Tensor::new(vec![4], vec![10.0, 5.0, 2.0, 1.0]);
    let c = Tensor::new(vec![4], vec![2.0, 5.0, 4.0, 0.5]);
    let inputs = [a.operand(), b.operand(), c.operand()];

    let mut out = Tensor::zeros(vec![4]);
    execute(&BinaryLayer::new(OpType::Sub), &mut out.output(), &inputs, Capability::Sse42).unwrap();
    assert_eq!(out.data, vec![88.0, 40.0, 2.0, -4.5]);

    execute(&BinaryLayer::new(OpType::Div), &mut out.output(), &inputs, Capability::Avx2).unwrap();
    assert_eq!(out.data, vec![5.0, 2.0, 1.0, -6.0]);
}

#[test]
fn test_fold_with_broadcasting_operands() {
    let mut rng = rng(21);
    let a = random_tensor(&mut rng, &[2, 3, 4, 4]);
    let b = random_tensor(&mut rng, &[3, 1, 1]);
    let c = random_tensor(&mut rng, &[1, 1, 4, 4]);
    let d = random_tensor(&mut rng, &[1]);
    let shape = [2, 3, 4, 4];

    for op in OpType::ALL {
        let expected = reference(op, &shape, &[&a, &b, &c, &d]);
        for cap in [Capability::Sse42, Capability::Avx2] {
            let mut out = Tensor::zeros(shape.to_vec());
            execute(
                &BinaryLayer::new(op),
                &mut out.output(),
                &[a.operand(), b.operand(), c.operand(), d.operand()],
                cap,
            )
            .unwrap();
            assert_same(&out.data, &expected, &format!("{op} fold at {cap:?}"));
        }
    }
}

#[test]
fn test_fold_into_output_grown_by_later_operand() {
    let a = Tensor::new(vec![3], vec![1.0, 2.0, 3.0]);
    let b = Tensor::new(vec![1], vec![1.0]);
    let c = Tensor::new(vec![2, 1], vec![10.0, 20.0]);
    let expected = reference(OpType::Add, &[2, 3], &[&a, &b, &c]);

    let mut out = Tensor::zeros(vec![2, 3]);
    execute(
        &BinaryLayer::new(OpType::Add),
        &mut out.output(),
        &[a.operand(), b.operand(), c.operand()],
        Capability::Avx2,
    )
    .unwrap();
    assert_eq!(out.data, expected);
}

#[test]
fn test_in_place_matches_scratch_output() {
    let mut rng = rng(8);
    for others in [
        vec![vec![2, 3, 4, 5]],
        vec![vec![3, 1, 1]],
        vec![vec![1]],
        vec![vec![1, 1, 4, 5]],
        vec![vec![1, 1, 1, 5], vec![2, 3, 1, 1]],
        vec![vec![2, 1, 4, 1]],
    ] {
        let x = random_tensor(&mut rng, &[2, 3, 4, 5]);
        let rest: Vec<Tensor> = others.iter().map(|s| random_tensor(&mut rng, s)).collect();

        for op in OpType::ALL {
            let layer = BinaryLayer::new(op);
            let mut inputs = vec![x.operand()];
            inputs.extend(rest.iter().map(Tensor::operand));

            let mut scratch = Tensor::zeros(x.shape.clone());
            execute(&layer, &mut scratch.output(), &inputs, Capability::Avx2).unwrap();

            let mut aliased = x.clone();
            execute_in_place(&layer, &mut aliased.output(), &inputs[1..], Capability::Avx2).unwrap();

            assert_same(&aliased.data, &scratch.data, &format!("{op} in place with {others:?}"));
        }
    }
}

#[test]
fn test_in_place_applies_constant_on_the_right() {
    let constant = ElementResource::new(vec![3, 1], vec![1.0, 2.0, 3.0]);
    let layer = BinaryLayer::new(OpType::Mul).with_constant(constant, 1);
    let mut x = Tensor::new(vec![3, 2], vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);

    execute_in_place(&layer, &mut x.output(), &[], Capability::Sse42).unwrap();
    assert_eq!(x.data, vec![1.0, 1.0, 4.0, 4.0, 9.0, 9.0]);
}

#[test]
fn test_in_place_without_second_operand_fails() {
    let mut x = Tensor::new(vec![2], vec![1.0, 2.0]);
    let err = execute_in_place(&BinaryLayer::new(OpType::Add), &mut x.output(), &[], Capability::Sse42);
    assert!(matches!(err, Err(EltwiseError::Param(_))));
    assert_eq!(x.data, vec![1.0, 2.0]);
}

#[test]
fn test_in_place_cannot_grow_output() {
    let mut x = Tensor::new(vec![3], vec![1.0, 2.0, 3.0]);
    let wide = Tensor::new(vec![2, 3], vec![1.0; 6]);
    let err = execute_in_place(
        &BinaryLayer::new(OpType::Add),
        &mut x.output(),
        &[wide.operand()],
        Capability::Sse42,
    );
    assert!(matches!(err, Err(EltwiseError::IncompatibleShapes { .. })));
    assert_eq!(x.data, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_single_input_is_self_op() {
    let x = Tensor::new(vec![5], vec![1.0, -2.0, 3.0, 0.5, 4.0]);
    let mut out = Tensor::zeros(vec![5]);

    execute(&BinaryLayer::new(OpType::Mul), &mut out.output(), &[x.operand()], Capability::Avx2).unwrap();
    assert_eq!(out.data, vec![1.0, 4.0, 9.0, 0.25, 16.0]);

    execute(&BinaryLayer::new(OpType::Sub), &mut out.output(), &[x.operand()], Capability::Sse42).unwrap();
    assert_eq!(out.data, vec![0.0; 5]);
}

#[test]
fn test_constant_operand_order() {
    let x = Tensor::new(vec![2, 2], vec![2.0, 4.0, 8.0, 16.0]);
    let constant = ElementResource::new(vec![2], vec![1.0, 2.0]);

    let mut out = Tensor::zeros(vec![2, 2]);
    let second = BinaryLayer::new(OpType::Div).with_constant(constant.clone(), 1);
    execute(&second, &mut out.output(), &[x.operand()], Capability::Sse42).unwrap();
    assert_eq!(out.data, vec![2.0, 2.0, 8.0, 8.0]);

    let first = BinaryLayer::new(OpType::Div).with_constant(constant, 0);
    execute(&first, &mut out.output(), &[x.operand()], Capability::Sse42).unwrap();
    assert_eq!(out.data, vec![0.5, 0.5, 0.125, 0.125]);
}

#[test]
fn test_constant_ignored_with_two_inputs() {
    let a = Tensor::new(vec![2], vec![1.0, 2.0]);
    let b = Tensor::new(vec![2], vec![3.0, 4.0]);
    let layer = BinaryLayer::new(OpType::Add).with_constant(ElementResource::new(vec![1], vec![100.0]), 0);

    let mut out = Tensor::zeros(vec![2]);
    execute(&layer, &mut out.output(), &[a.operand(), b.operand()], Capability::Sse42).unwrap();
    assert_eq!(out.data, vec![4.0, 6.0]);
}

#[test]
fn test_errors_leave_output_untouched() {
    let a = Tensor::new(vec![2, 3], vec![1.0; 6]);
    let b = Tensor::new(vec![2, 4], vec![1.0; 8]);
    let c = Tensor::new(vec![3], vec![1.0; 3]);
    let layer = BinaryLayer::new(OpType::Add);

    let mut out = Tensor::new(vec![2, 3], vec![-1.0; 6]);
    let err = execute(&layer, &mut out.output(), &[a.operand(), b.operand()], Capability::Sse42);
    assert!(matches!(err, Err(EltwiseError::IncompatibleShapes { .. })));

    // the third operand is bad; the first pair must not be written either
    let err = execute(
        &layer,
        &mut out.output(),
        &[a.operand(), c.operand(), b.operand()],
        Capability::Sse42,
    );
    assert!(matches!(err, Err(EltwiseError::IncompatibleShapes { .. })));

    let short = [1.0f32; 2];
    let err = execute(
        &layer,
        &mut out.output(),
        &[a.operand(), Operand::new(&short, &[3])],
        Capability::Sse42,
    );
    assert!(matches!(err, Err(EltwiseError::InvalidOperand(_))));

    let mut small = Tensor::zeros(vec![3]);
    let err = execute(&layer, &mut small.output(), &[a.operand(), c.operand()], Capability::Sse42);
    assert!(matches!(err, Err(EltwiseError::IncompatibleShapes { .. })));

    let err = execute(&layer, &mut out.output(), &[], Capability::Sse42);
    assert!(matches!(err, Err(EltwiseError::Param(_))));

    assert_eq!(out.data, vec![-1.0; 6]);
    assert_eq!(small.data, vec![0.0; 3]);
}

#[test]
fn test_missing_or_bad_params() {
    let a = Tensor::new(vec![1], vec![1.0]);
    let mut out = Tensor::zeros(vec![1]);

    let err = execute(&BinaryLayer::default(), &mut out.output(), &[a.operand()], Capability::Sse42);
    assert!(matches!(err, Err(EltwiseError::Param(_))));

    let mut layer = BinaryLayer::new(OpType::Add);
    layer.param = layer.param.map(|p| p.with_weight_index(3));
    let err = execute(&layer, &mut out.output(), &[a.operand()], Capability::Sse42);
    assert!(matches!(err, Err(EltwiseError::Param(_))));
}

#[test]
fn test_unknown_operator_tag() {
    assert!(matches!("pow".parse::<OpType>(), Err(EltwiseError::UnsupportedOperator(_))));
    assert!(matches!(OpType::try_from(200u8), Err(EltwiseError::UnsupportedOperator(_))));
}

#[test]
fn test_forward_uses_pinned_capability() {
    set_capability(Capability::Avx2);
    assert_eq!(get_capability(), Capability::Avx2);

    let a = Tensor::new(vec![3], vec![1.0, 2.0, 3.0]);
    let b = Tensor::new(vec![1], vec![2.0]);
    let mut out = Tensor::zeros(vec![3]);
    forward(&BinaryLayer::new(OpType::Max), &mut out.output(), &[a.operand(), b.operand()]).unwrap();
    assert_eq!(out.data, vec![2.0, 2.0, 3.0]);
}

#[test]
fn test_concurrent_invocations_match_sequential() {
    let mut rng = rng(99);
    let shapes: Vec<(Vec<usize>, Vec<usize>)> = vec![
        (vec![2, 3, 4, 4], vec![3, 1, 1]),
        (vec![1, 3, 8, 8], vec![1, 3, 8, 8]),
        (vec![2, 3, 4, 4], vec![1]),
        (vec![3, 1], vec![1, 7]),
        (vec![1, 1, 1, 9], vec![2, 3, 2, 9]),
    ];
    let jobs: Vec<(OpType, Tensor, Tensor)> = (0..64)
        .map(|i| {
            let (sa, sb) = &shapes[i % shapes.len()];
            let op = OpType::ALL[i % OpType::ALL.len()];
            (op, random_tensor(&mut rng, sa), random_tensor(&mut rng, sb))
        })
        .collect();

    let evaluate = |(op, a, b): &(OpType, Tensor, Tensor), cap: Capability| {
        let shape = binary_broadcast::tensors::broadcast_shape(&a.shape, &b.shape).unwrap();
        let mut out = Tensor::zeros(shape);
        execute(&BinaryLayer::new(*op), &mut out.output(), &[a.operand(), b.operand()], cap).unwrap();
        out.data
    };

    let sequential: Vec<Vec<f32>> = jobs.iter().map(|job| evaluate(job, Capability::Sse42)).collect();
    let parallel: Vec<Vec<f32>> = jobs
        .par_iter()
        .enumerate()
        .map(|(i, job)| {
            let cap = if i % 2 == 0 { Capability::Avx2 } else { Capability::Sse42 };
            evaluate(job, cap)
        })
        .collect();

    for (i, (s, p)) in sequential.iter().zip(&parallel).enumerate() {
        assert_same(p, s, &format!("job {i}"));
    }
}
