mod common;

use common::{assert_all_close, create_test_context, matrix};
use vkvec::{Array, Distribution, InverseOptions, Shape, VkVecError};

#[test]
fn matmul_small() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let b = matrix(&context, 3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
    let c = a.matmul(&b).unwrap();
    assert_eq!(c.shape(), Shape::matrix(2, 2));
    assert_eq!(c.read().unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
}

#[test]
fn matmul_per_depth_slice() {
    let Some(context) = create_test_context() else {
        return;
    };
    // slice 0 is [[1, 2], [3, 4]], slice 1 is 2I
    let a = Array::from_slice(&context, (2, 2, 2), &[1.0, 2.0, 2.0, 0.0, 3.0, 0.0, 4.0, 2.0]).unwrap();
    let b = Array::from_slice(&context, (2, 1, 2), &[1.0, 5.0, 1.0, 6.0]).unwrap();
    let c = a.matmul(&b).unwrap();
    assert_eq!(c.shape(), Shape::new(2, 1, 2));
    assert_eq!(c.read().unwrap(), vec![3.0, 10.0, 7.0, 12.0]);
}

#[test]
fn matmul_rejects_incompatible_shapes() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = Array::zeros(&context, (2, 3)).unwrap();
    assert!(matches!(a.matmul(&a), Err(VkVecError::ShapeMismatch { operation: "matmul", .. })));
}

#[test]
fn matmul_with_identity() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = Array::random_seeded(&context, (33, 33), Distribution::Gaussian { mean: 0.0, std_dev: 1.0 }, 3).unwrap();
    let identity = Array::identity(&context, 33).unwrap();
    assert_eq!(a.matmul(&identity).unwrap().read().unwrap(), a.read().unwrap());
    assert_eq!(identity.matmul(&a).unwrap().read().unwrap(), a.read().unwrap());
}

#[test]
fn inverse_of_well_conditioned_matrix() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
    let inverse = a.inverse(InverseOptions::default()).unwrap();
    let product = a.matmul(&inverse).unwrap();
    assert_all_close(&product.read().unwrap(), &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], 1e-4);

    let diagonal = matrix(&context, 2, 2, &[2.0, 0.0, 0.0, 4.0]);
    let inverse = diagonal.inverse(InverseOptions::default()).unwrap();
    assert_all_close(&inverse.read().unwrap(), &[0.5, 0.0, 0.0, 0.25], 1e-5);
}

#[test]
fn inverse_stops_at_max_iterations() {
    let Some(context) = create_test_context() else {
        return;
    };
    let a = matrix(&context, 2, 2, &[2.0, 0.0, 0.0, 4.0]);
    let options = InverseOptions {
        max_iterations: 1,
        tolerance: 0.0,
    };
    let x = a.inverse(options).unwrap();
    assert_eq!(x.shape(), Shape::matrix(2, 2));
    assert!(x.read().unwrap().iter().all(|v| v.is_finite()));
}

#[test]
fn inverse_rejects_bad_input() {
    let Some(context) = create_test_context() else {
        return;
    };
    let rectangular = Array::filled(&context, (2, 3), 1.0).unwrap();
    assert!(matches!(
        rectangular.inverse(InverseOptions::default()),
        Err(VkVecError::InvalidArgument { operation: "inverse", .. })
    ));
    let zero = Array::zeros(&context, (3, 3)).unwrap();
    assert!(zero.inverse(InverseOptions::default()).is_err());
}
