mod common;

use common::{assert_all_close, create_test_context, matrix, vector};
use vkvec::{Array, Axis, Distribution, Padding, PoolKind, Shape, VkVecError};

#[test]
fn transpose_twice_is_identity() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = Array::random_seeded(&context, (7, 5, 2), Distribution::Uniform { low: -1.0, high: 1.0 }, 7).unwrap();
    let t = a.transpose().unwrap();
    assert_eq!(t.shape(), Shape::new(5, 7, 2));
    assert_eq!(t.get(3, 6, 1).unwrap(), a.get(6, 3, 1).unwrap());
    let back = t.transpose().unwrap();
    assert_eq!(back.shape(), a.shape());
    assert_eq!(back.read().unwrap(), a.read().unwrap());
}

#[test]
fn reshape_keeps_flat_order() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let b = a.reshape((3, 2)).unwrap();
    assert_eq!(b.get(2, 0, 0).unwrap(), 5.0);
    assert_eq!(a.flatten().unwrap().shape(), Shape::vector(6));
    assert!(matches!(a.reshape((4, 2)), Err(VkVecError::ShapeMismatch { operation: "reshape", .. })));
}

#[test]
fn growing_then_shrinking_restores_the_array() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 2, 2, &[1.0, 2.0, 3.0, 4.0]);
    let grown = a.add_rows(3).unwrap();
    assert_eq!(grown.shape(), Shape::matrix(5, 2));
    assert_eq!(grown.get(4, 1, 0).unwrap(), 0.0);
    assert_eq!(grown.add_rows(-3).unwrap().read().unwrap(), a.read().unwrap());

    let wider = a.add_cols(2).unwrap();
    assert_eq!(wider.read().unwrap(), vec![1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0]);
    assert_eq!(wider.add_cols(-2).unwrap().read().unwrap(), a.read().unwrap());

    let deeper = a.add_depth(1).unwrap();
    assert_eq!(deeper.shape(), Shape::new(2, 2, 2));
    assert_eq!(deeper.get(1, 0, 0).unwrap(), 3.0);
    assert_eq!(deeper.get(1, 0, 1).unwrap(), 0.0);

    assert!(a.add_cols(-2).is_err());
    assert_eq!(a.add_rows(-2).unwrap().elements(), 0);
}

#[test]
fn resize_keeps_top_left_corner() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    assert_eq!(a.resize((2, 2)).unwrap().read().unwrap(), vec![1.0, 2.0, 4.0, 5.0]);
}

#[test]
fn erase_removes_one_slice() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    assert_eq!(a.erase_row(1).unwrap().read().unwrap(), vec![1.0, 2.0, 3.0, 7.0, 8.0, 9.0]);
    assert_eq!(a.erase_col(0).unwrap().read().unwrap(), vec![2.0, 3.0, 5.0, 6.0, 8.0, 9.0]);
    assert!(matches!(a.erase_row(3), Err(VkVecError::IndexOutOfRange { row: 3, .. })));
    assert!(a.erase_depth(0).is_err());

    let deep = Array::from_slice(&context, (1, 1, 3), &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(deep.erase_depth(2).unwrap().read().unwrap(), vec![1.0, 2.0]);
}

#[test]
fn pad_surrounds_with_fill() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 1, 2, &[1.0, 2.0]);
    let padded = a
        .pad(
            Padding {
                top: 1,
                bottom: 0,
                left: 1,
                right: 1,
            },
            -1.0,
        )
        .unwrap();
    assert_eq!(padded.shape(), Shape::matrix(2, 4));
    assert_eq!(padded.read().unwrap(), vec![-1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 2.0, -1.0]);
    assert_eq!(a.pad(Padding::uniform(2), 0.0).unwrap().shape(), Shape::matrix(5, 6));
}

#[test]
fn pooling_windows() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(
        &context,
        4,
        4,
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, -16.0],
    );
    let max = a.pool(PoolKind::Max, (2, 2), 2).unwrap();
    assert_eq!(max.shape(), Shape::matrix(2, 2));
    assert_eq!(max.read().unwrap(), vec![6.0, 8.0, 14.0, 15.0]);
    assert_eq!(a.pool(PoolKind::Min, (2, 2), 2).unwrap().read().unwrap(), vec![1.0, 3.0, 9.0, -16.0]);
    assert_all_close(
        &a.pool(PoolKind::Mean, (2, 2), 2).unwrap().read().unwrap(),
        &[3.5, 5.5, 11.5, 5.5],
        1e-6,
    );
    assert_eq!(a.pool(PoolKind::MaxAbs, (2, 2), 2).unwrap().get(1, 1, 0).unwrap(), 16.0);
    assert_eq!(a.pool(PoolKind::Max, (3, 3), 1).unwrap().shape(), Shape::matrix(2, 2));

    assert!(a.pool(PoolKind::Max, (5, 1), 1).is_err());
    assert!(a.pool(PoolKind::Max, (2, 2), 0).is_err());
}

#[test]
fn convolve_is_valid_cross_correlation() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    let kernel = matrix(&context, 2, 2, &[1.0, 0.0, 0.0, -1.0]);
    let out = a.convolve(&kernel, 1).unwrap();
    assert_eq!(out.shape(), Shape::matrix(2, 2));
    assert_eq!(out.read().unwrap(), vec![-4.0, -4.0, -4.0, -4.0]);
    assert_eq!(a.convolve(&kernel, 2).unwrap().shape(), Shape::matrix(1, 1));
    assert!(kernel.convolve(&a, 1).is_err());
}

#[test]
fn concatenate_along_each_axis() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 1, 2, &[1.0, 2.0]);
    let b = matrix(&context, 1, 2, &[3.0, 4.0]);
    let rows = a.concatenate(&b, Axis::Rows).unwrap();
    assert_eq!(rows.shape(), Shape::matrix(2, 2));
    assert_eq!(rows.read().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);

    let cols = a.concatenate(&b, Axis::Cols).unwrap();
    assert_eq!(cols.shape(), Shape::matrix(1, 4));
    assert_eq!(cols.read().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);

    let depth = a.concatenate(&b, Axis::Depth).unwrap();
    assert_eq!(depth.shape(), Shape::new(1, 2, 2));
    assert_eq!(depth.read().unwrap(), vec![1.0, 3.0, 2.0, 4.0]);

    let c = vector(&context, &[1.0, 2.0, 3.0]);
    assert!(matches!(a.concatenate(&c, Axis::Rows), Err(VkVecError::ShapeMismatch { .. })));
}

#[test]
fn mirror_and_triangles() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(a.mirror(Axis::Rows).unwrap().read().unwrap(), vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
    assert_eq!(a.mirror(Axis::Cols).unwrap().read().unwrap(), vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);

    let square = matrix(&context, 3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    assert_eq!(square.diagonal().unwrap().read().unwrap(), vec![1.0, 5.0, 9.0]);
    assert_eq!(a.diagonal().unwrap().read().unwrap(), vec![1.0, 5.0]);
    assert_eq!(
        square.upper_triangular().unwrap().read().unwrap(),
        vec![1.0, 2.0, 3.0, 0.0, 5.0, 6.0, 0.0, 0.0, 9.0]
    );
    assert_eq!(
        square.lower_triangular().unwrap().read().unwrap(),
        vec![1.0, 0.0, 0.0, 4.0, 5.0, 0.0, 7.0, 8.0, 9.0]
    );
}

#[test]
fn remap_gathers_by_flat_index() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = vector(&context, &[10.0, 20.0, 30.0]);
    let map = matrix(&context, 2, 2, &[2.0, 0.0, -1.0, 7.0]);
    let out = a.remap(&map).unwrap();
    assert_eq!(out.shape(), Shape::matrix(2, 2));
    assert_eq!(out.read().unwrap(), vec![30.0, 10.0, 0.0, 0.0]);
}

#[test]
fn diff_keeps_orientation() {
    let Some(context) = create_test_context() else {
        return;
    };
    let column = vector(&context, &[1.0, 4.0, 9.0, 16.0]);
    let d = column.diff().unwrap();
    assert_eq!(d.shape(), Shape::vector(3));
    assert_eq!(d.read().unwrap(), vec![3.0, 5.0, 7.0]);

    let row = matrix(&context, 1, 3, &[2.0, 1.0, 5.0]);
    let d = row.diff().unwrap();
    assert_eq!(d.shape(), Shape::matrix(1, 2));
    assert_eq!(d.read().unwrap(), vec![-1.0, 4.0]);

    assert_eq!(vector(&context, &[1.0]).diff().unwrap().elements(), 0);
}
