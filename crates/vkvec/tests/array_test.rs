mod common;

use common::{assert_all_close, create_test_context, vector};
use vkvec::{Array, Distribution, Shape, VkVecError};

#[test]
fn shape_invariants() {
    let Some(context) = create_test_context() else {
        return;
    };
    for (shape, dimensions) in [
        (Shape::new(4, 1, 1), 1),
        (Shape::new(2, 3, 1), 2),
        (Shape::new(2, 3, 4), 3),
        (Shape::new(3, 0, 0), 1),
    ] {
        let array = Array::new(&context, shape).unwrap();
        assert_eq!(array.elements(), array.rows() * array.cols() * array.depth());
        assert_eq!(array.dimensions(), dimensions, "{shape}");
        assert!(array.read().unwrap().iter().all(|&v| v == 0.0));
    }
}

#[test]
fn set_then_get_round_trips() {
    let Some(context) = create_test_context() else {
        return;
    };
    let array = Array::zeros(&context, (2, 3, 2)).unwrap();
    for r in 0..2 {
        for c in 0..3 {
            for d in 0..2 {
                let value = (r * 100 + c * 10 + d) as f32;
                array.set(value, r, c, d).unwrap();
                assert_eq!(array.get(r, c, d).unwrap(), value);
            }
        }
    }
    assert_eq!(array.get_flat(array.shape().flat_index(1, 2, 1)).unwrap(), 121.0);
}

#[test]
fn out_of_range_access_is_an_error() {
    let Some(context) = create_test_context() else {
        return;
    };
    let array = Array::zeros(&context, (2, 2)).unwrap();
    assert!(matches!(array.get(2, 0, 0), Err(VkVecError::IndexOutOfRange { row: 2, .. })));
    assert!(matches!(array.set(1.0, 0, 0, 1), Err(VkVecError::IndexOutOfRange { depth: 1, .. })));
    assert!(array.get_flat(4).is_err());
    assert!(matches!(
        array.write(&[1.0, 2.0]),
        Err(VkVecError::LengthMismatch { expected: 4, actual: 2, .. })
    ));
}

#[test]
fn fills() {
    let Some(context) = create_test_context() else {
        return;
    };
    let array = Array::filled(&context, (2, 3), 2.5).unwrap();
    assert!(array.read().unwrap().iter().all(|&v| v == 2.5));

    array.fill_zero().unwrap();
    assert!(array.read().unwrap().iter().all(|&v| v == 0.0));

    let identity = Array::identity(&context, 3).unwrap();
    assert_eq!(identity.read().unwrap(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    let copy = identity.try_clone().unwrap();
    identity.fill(7.0).unwrap();
    assert_eq!(copy.get(1, 1, 0).unwrap(), 1.0);
    assert_eq!(copy.get(1, 0, 0).unwrap(), 0.0);
}

#[test]
fn seeded_random_is_reproducible() {
    let Some(context) = create_test_context() else {
        return;
    };
    let distribution = Distribution::Gaussian { mean: 0.0, std_dev: 1.0 };
    let a = Array::random_seeded(&context, (64, 8), distribution, 42).unwrap();
    let b = Array::random_seeded(&context, (64, 8), distribution, 42).unwrap();
    let c = Array::random_seeded(&context, (64, 8), distribution, 43).unwrap();
    assert_eq!(a.read().unwrap(), b.read().unwrap());
    assert_ne!(a.read().unwrap(), c.read().unwrap());
}

#[test]
fn random_distributions_respect_their_support() {
    let Some(context) = create_test_context() else {
        return;
    };
    let shape = Shape::matrix(128, 16);

    let uniform = Array::random(&context, shape, Distribution::Uniform { low: -2.0, high: 3.0 }).unwrap();
    assert!(uniform.read().unwrap().iter().all(|v| (-2.0..=3.0).contains(v)));

    let ints = Array::random(&context, shape, Distribution::UniformInt { low: 1, high: 6 }).unwrap();
    assert!(ints.read().unwrap().iter().all(|v| v.fract() == 0.0 && (1.0..=6.0).contains(v)));

    let signs = Array::random(&context, shape, Distribution::Sign).unwrap();
    assert!(signs.read().unwrap().iter().all(|&v| v == 1.0 || v == -1.0));

    let binary = Array::random(&context, shape, Distribution::Binary { probability: 0.3 }).unwrap();
    let ones = binary.read().unwrap().iter().filter(|&&v| v == 1.0).count();
    assert!(ones > 0 && ones < shape.elements());

    let limit = (6.0_f32 / (128.0 + 16.0)).sqrt();
    let xavier = Array::random(&context, shape, Distribution::XavierUniform).unwrap();
    assert!(xavier.maxabs().unwrap() <= limit + 1e-6);

    let gaussian = Array::random(&context, (256, 16), Distribution::Gaussian { mean: 5.0, std_dev: 2.0 }).unwrap();
    assert!((gaussian.mean().unwrap() - 5.0).abs() < 0.3);
    assert!((gaussian.stddev().unwrap() - 2.0).abs() < 0.3);
}

#[test]
fn invalid_parameters_leave_array_unchanged() {
    let Some(context) = create_test_context() else {
        return;
    };
    let array = vector(&context, &[1.0, 2.0, 3.0]);
    array.fill_random(Distribution::Dropout { rate: 1.5 }).unwrap();
    array.fill_random(Distribution::Binary { probability: -0.5 }).unwrap();
    array.fill_random(Distribution::UniformInt { low: 5, high: 1 }).unwrap();
    assert_all_close(&array.read().unwrap(), &[1.0, 2.0, 3.0], 0.0);

    let mask = Array::random(&context, Shape::vector(1000), Distribution::Dropout { rate: 0.5 }).unwrap();
    assert!(mask.read().unwrap().iter().all(|&v| v == 0.0 || v == 2.0));
}

#[test]
fn from_slice_checks_length() {
    let Some(context) = create_test_context() else {
        return;
    };
    assert!(Array::from_slice(&context, (2, 2), &[1.0; 3]).is_err());
    let array = Array::from_slice(&context, (1, 3), &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(array.dimensions(), 2);
    assert_eq!(array.read().unwrap(), vec![1.0, 2.0, 3.0]);
}
