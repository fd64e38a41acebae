mod common;

use common::{assert_all_close, create_test_context, vector};
use is_close::is_close;
use rand::{Rng, SeedableRng, rngs::StdRng};
use vkvec::{Array, Shape, VkVecError};

fn white_noise(
    seed: u64,
    len: usize,
    amplitude: f32,
) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-amplitude..amplitude)).collect()
}

#[test]
fn pearson_of_perfect_line() {
    let Some(context) = create_test_context() else {
        return;
    };
    let xs = (1..=10).map(|v| v as f32).collect::<Vec<_>>();
    let ys = xs.iter().map(|x| 2.0 * x + 1.0).collect::<Vec<_>>();
    let fit = vector(&context, &xs).pearson(&vector(&context, &ys)).unwrap();
    assert!(is_close!(fit.coefficient, 1.0, abs_tol = 1e-5));
    assert!(is_close!(fit.slope, 2.0, abs_tol = 1e-5));
    assert!(is_close!(fit.intercept, 1.0, abs_tol = 1e-4));
    assert_all_close(&fit.predicted.read().unwrap(), &ys, 1e-4);
    assert!(fit.residuals.maxabs().unwrap() < 1e-4);

    let falling = ys.iter().map(|y| -y).collect::<Vec<_>>();
    let fit = vector(&context, &xs).pearson(&vector(&context, &falling)).unwrap();
    assert!(is_close!(fit.coefficient, -1.0, abs_tol = 1e-5));
}

#[test]
fn pearson_accepts_row_vectors() {
    let Some(context) = create_test_context() else {
        return;
    };
    let x = Array::from_slice(&context, (1, 4), &[1.0, 2.0, 3.0, 4.0]).unwrap();
    let y = vector(&context, &[2.0, 4.0, 6.0, 8.0]);
    let fit = x.pearson(&y).unwrap();
    assert!(is_close!(fit.slope, 2.0, abs_tol = 1e-5));
    assert_eq!(fit.predicted.shape(), Shape::vector(4));
}

#[test]
fn spearman_of_monotonic_curve() {
    let Some(context) = create_test_context() else {
        return;
    };
    let xs = (1..=8).map(|v| v as f32).collect::<Vec<_>>();
    let ys = xs.iter().map(|x| x * x * x).collect::<Vec<_>>();
    let x = vector(&context, &xs);
    let y = vector(&context, &ys);
    let spearman = x.spearman(&y).unwrap();
    assert!(is_close!(spearman.coefficient, 1.0, abs_tol = 1e-5));
    let pearson = x.pearson(&y).unwrap();
    assert!(pearson.coefficient < spearman.coefficient);
}

#[test]
fn mismatched_lengths_give_placeholders() {
    let Some(context) = create_test_context() else {
        return;
    };
    let x = vector(&context, &[1.0, 2.0, 3.0]);
    let y = vector(&context, &[1.0, 2.0, 3.0, 4.0]);

    let fit = x.pearson(&y).unwrap();
    assert!(fit.coefficient.is_nan());
    assert_eq!(fit.predicted.elements(), 3);

    let regression = x.polynomial_regression(&y, 2).unwrap();
    assert!(regression.r_squared.is_nan());
    assert_eq!(regression.coefficients.elements(), 3);

    let cointegration = x.engle_granger(&y).unwrap();
    assert!(!cointegration.is_cointegrated);
    assert!(cointegration.stationarity.statistic.is_nan());
}

#[test]
fn quadratic_regression_recovers_coefficients() {
    let Some(context) = create_test_context() else {
        return;
    };
    let xs = (0..9).map(|i| -2.0 + 0.5 * i as f32).collect::<Vec<_>>();
    let ys = xs.iter().map(|x| 1.0 + 2.0 * x + 3.0 * x * x).collect::<Vec<_>>();
    let result = vector(&context, &xs).polynomial_regression(&vector(&context, &ys), 2).unwrap();
    assert_eq!(result.degree, 2);
    assert_all_close(&result.coefficients.read().unwrap(), &[1.0, 2.0, 3.0], 1e-2);
    assert_all_close(&result.predicted.read().unwrap(), &ys, 1e-1);
    assert!(result.r_squared > 0.999);
}

#[test]
fn regression_needs_enough_points() {
    let Some(context) = create_test_context() else {
        return;
    };
    let x = vector(&context, &[1.0, 2.0]);
    assert!(matches!(
        x.polynomial_regression(&x, 3),
        Err(VkVecError::InvalidArgument { operation: "polynomial_regression", .. })
    ));
}

#[test]
fn dickey_fuller_separates_noise_from_growth() {
    let Some(context) = create_test_context() else {
        return;
    };
    let noise = vector(&context, &white_noise(11, 200, 1.0));
    let result = noise.dickey_fuller().unwrap();
    assert!(result.is_stationary, "statistic {}", result.statistic);
    assert!(result.gamma < 0.0);
    assert_eq!(result.residuals.elements(), 199);

    let growth = (0..100).map(|t| (t * t) as f32 / 100.0).collect::<Vec<_>>();
    let result = vector(&context, &growth).dickey_fuller().unwrap();
    assert!(!result.is_stationary, "statistic {}", result.statistic);

    assert!(vector(&context, &[1.0, 2.0, 3.0]).dickey_fuller().is_err());
}

#[test]
fn engle_granger_detects_shared_trend() {
    let Some(context) = create_test_context() else {
        return;
    };
    let steps = white_noise(5, 200, 1.0);
    let walk = steps
        .iter()
        .scan(0.0f32, |level, step| {
            *level += step;
            Some(*level)
        })
        .collect::<Vec<_>>();
    let noise = white_noise(6, 200, 0.5);
    let follower = walk.iter().zip(&noise).map(|(x, e)| 2.0 * x + 1.0 + e).collect::<Vec<_>>();

    let result = vector(&context, &walk).engle_granger(&vector(&context, &follower)).unwrap();
    assert!(result.is_cointegrated, "statistic {}", result.stationarity.statistic);
    assert_all_close(&result.regression.coefficients.read().unwrap(), &[1.0, 2.0], 0.2);
    assert_eq!(result.stationarity.critical_values[1], (0.05, -3.34));
}
