use super::{Array, InverseOptions, Shape};
use crate::backends::vulkan::{PushConstants, VkDispatch};
use crate::error::VkVecError;
use crate::kernel::Kernel;

/// Dickey-Fuller critical values (with constant) at 1%, 5% and 10%.
pub const DICKEY_FULLER_CRITICAL_VALUES: [(f32, f32); 3] = [(0.01, -3.43), (0.05, -2.86), (0.10, -2.57)];

/// Engle-Granger critical values for two series at 1%, 5% and 10%.
pub const ENGLE_GRANGER_CRITICAL_VALUES: [(f32, f32); 3] = [(0.01, -3.90), (0.05, -3.34), (0.10, -3.04)];

const REGRESSION_INVERSE: InverseOptions = InverseOptions {
    max_iterations: 200,
    tolerance: 1e-4,
};

/// Correlation coefficient with the least-squares line `y = slope * x + intercept`.
///
/// `predicted` and `residuals` are column vectors.
#[derive(Debug)]
pub struct CorrelationResult {
    pub coefficient: f32,
    pub slope: f32,
    pub intercept: f32,
    pub predicted: Array,
    pub residuals: Array,
}

#[derive(Debug)]
pub struct RegressionResult {
    pub degree: u32,
    /// `degree + 1` coefficients, constant term first.
    pub coefficients: Array,
    pub predicted: Array,
    pub residuals: Array,
    pub r_squared: f32,
}

/// Dickey-Fuller test without lag terms, `dy[t] = alpha + gamma * y[t-1]`.
#[derive(Debug)]
pub struct StationarityResult {
    pub statistic: f32,
    pub gamma: f32,
    /// `(significance, value)` pairs.
    pub critical_values: [(f32, f32); 3],
    /// `statistic` is below the 5% critical value.
    pub is_stationary: bool,
    pub residuals: Array,
}

#[derive(Debug)]
pub struct CointegrationResult {
    pub regression: RegressionResult,
    pub stationarity: StationarityResult,
    pub is_cointegrated: bool,
}

fn five_percent(critical_values: &[(f32, f32); 3]) -> f32 {
    critical_values[1].1
}

fn correlation_coefficient(
    sxy: f32,
    sxx: f32,
    syy: f32,
) -> f32 {
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 { f32::NAN } else { sxy / denominator }
}

fn r_squared(
    ss_res: f32,
    ss_tot: f32,
) -> f32 {
    if ss_tot == 0.0 { f32::NAN } else { 1.0 - ss_res / ss_tot }
}

/// `gamma / se(gamma)` for a simple regression with intercept on `m` points.
fn t_statistic(
    gamma: f32,
    sxx: f32,
    ss_res: f32,
    m: usize,
) -> f32 {
    if m <= 2 || sxx == 0.0 {
        return f32::NAN;
    }
    let standard_error = (ss_res / (m - 2) as f32 / sxx).sqrt();
    if standard_error == 0.0 { f32::NAN } else { gamma / standard_error }
}

impl CorrelationResult {
    fn placeholder(x: &Array) -> Result<Self, VkVecError> {
        let shape = Shape::vector(x.elements() as u32);
        Ok(Self {
            coefficient: f32::NAN,
            slope: f32::NAN,
            intercept: f32::NAN,
            predicted: Array::zeros(&x.context, shape)?,
            residuals: Array::zeros(&x.context, shape)?,
        })
    }
}

impl RegressionResult {
    fn placeholder(
        x: &Array,
        degree: u32,
    ) -> Result<Self, VkVecError> {
        let shape = Shape::vector(x.elements() as u32);
        Ok(Self {
            degree,
            coefficients: Array::filled(&x.context, Shape::vector(degree + 1), f32::NAN)?,
            predicted: Array::zeros(&x.context, shape)?,
            residuals: Array::zeros(&x.context, shape)?,
            r_squared: f32::NAN,
        })
    }
}

impl StationarityResult {
    fn placeholder(
        x: &Array,
        critical_values: [(f32, f32); 3],
    ) -> Result<Self, VkVecError> {
        Ok(Self {
            statistic: f32::NAN,
            gamma: f32::NAN,
            critical_values,
            is_stationary: false,
            residuals: Array::zeros(&x.context, Shape::vector(x.elements().saturating_sub(1) as u32))?,
        })
    }
}

impl Array {
    fn same_length(
        &self,
        other: &Array,
        operation: &str,
    ) -> bool {
        if self.elements() == other.elements() {
            return true;
        }
        log::warn!(
            "{operation}: series lengths differ ({} and {}), returning a placeholder result",
            self.elements(),
            other.elements()
        );
        false
    }

    /// Pearson correlation of two vectors of equal length.
    pub fn pearson(
        &self,
        y: &Array,
    ) -> Result<CorrelationResult, VkVecError> {
        self.require_vector("pearson")?;
        y.require_vector("pearson")?;
        if !self.same_length(y, "pearson") {
            return CorrelationResult::placeholder(self);
        }
        self.flatten()?.linear_fit(&y.flatten()?)
    }

    /// Pearson correlation of the ranks; the line is fitted in rank space.
    pub fn spearman(
        &self,
        y: &Array,
    ) -> Result<CorrelationResult, VkVecError> {
        self.require_vector("spearman")?;
        y.require_vector("spearman")?;
        if !self.same_length(y, "spearman") {
            return CorrelationResult::placeholder(self);
        }
        self.flatten()?.rank()?.linear_fit(&y.flatten()?.rank()?)
    }

    /// Both operands are column vectors of the same length.
    fn linear_fit(
        &self,
        y: &Array,
    ) -> Result<CorrelationResult, VkVecError> {
        let mean_x = self.mean()?;
        let mean_y = y.mean()?;
        let dx = self.sub_scalar(mean_x)?;
        let dy = y.sub_scalar(mean_y)?;
        let sxy = dx.scalar_product(&dy)?;
        let sxx = dx.scalar_product(&dx)?;
        let syy = dy.scalar_product(&dy)?;

        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
        let intercept = mean_y - slope * mean_x;
        let predicted = self.affine(slope, intercept)?;
        let residuals = y.sub(&predicted)?;
        Ok(CorrelationResult {
            coefficient: correlation_coefficient(sxy, sxx, syy),
            slope,
            intercept,
            predicted,
            residuals,
        })
    }

    /// Least-squares polynomial of `degree` through `(self[i], y[i])`,
    /// solved from the normal equations.
    pub fn polynomial_regression(
        &self,
        y: &Array,
        degree: u32,
    ) -> Result<RegressionResult, VkVecError> {
        self.require_vector("polynomial_regression")?;
        y.require_vector("polynomial_regression")?;
        if !self.same_length(y, "polynomial_regression") {
            return RegressionResult::placeholder(self, degree);
        }
        let terms = degree + 1;
        if self.elements() < terms as usize {
            return Err(VkVecError::InvalidArgument {
                operation: "polynomial_regression",
                reason: format!("{} points cannot determine {terms} coefficients", self.elements()),
            }
            .logged());
        }

        let x = self.flatten()?;
        let y = y.flatten()?;
        let vandermonde = x.power_matrix(terms)?;
        let transposed = vandermonde.transpose()?;
        let normal = transposed.matmul(&vandermonde)?;
        let rhs = transposed.matmul(&y)?;
        let coefficients = normal.inverse(REGRESSION_INVERSE)?.matmul(&rhs)?;

        let predicted = x.linear_predict(&coefficients)?;
        let residuals = y.sub(&predicted)?;
        let ss_res = residuals.scalar_product(&residuals)?;
        let centred = y.sub_scalar(y.mean()?)?;
        let ss_tot = centred.scalar_product(&centred)?;

        Ok(RegressionResult {
            degree,
            coefficients,
            predicted,
            residuals,
            r_squared: r_squared(ss_res, ss_tot),
        })
    }

    /// `(n x terms)` matrix of `x[r]^c`.
    fn power_matrix(
        &self,
        terms: u32,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(Shape::matrix(self.elements() as u32, terms))?;
        self.run(&[VkDispatch::new(Kernel::PowerMatrix)
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape))
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Evaluates the polynomial with `coefficients` (constant first) at
    /// every element.
    fn linear_predict(
        &self,
        coefficients: &Array,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(self.shape)?;
        self.run(&[VkDispatch::new(Kernel::LinearPredict)
            .buffers(&[&self.buffer, &coefficients.buffer, &out.buffer])
            .push_constants(
                PushConstants::new()
                    .shape(self.shape)
                    .shape(coefficients.shape)
                    .shape(out.shape),
            )
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Dickey-Fuller unit-root test of the series.
    pub fn dickey_fuller(&self) -> Result<StationarityResult, VkVecError> {
        self.stationarity("dickey_fuller", DICKEY_FULLER_CRITICAL_VALUES)
    }

    fn stationarity(
        &self,
        operation: &'static str,
        critical_values: [(f32, f32); 3],
    ) -> Result<StationarityResult, VkVecError> {
        self.require_vector(operation)?;
        let n = self.elements();
        if n < 4 {
            return Err(VkVecError::InvalidArgument {
                operation,
                reason: format!("{n} observations are too few"),
            }
            .logged());
        }
        let series = self.flatten()?;
        let lagged = series.segment(0, n - 1)?;
        let delta = series.diff()?;
        let fit = lagged.linear_fit(&delta)?;

        let m = n - 1;
        let sxx = lagged.variance()? * m as f32;
        let ss_res = fit.residuals.scalar_product(&fit.residuals)?;
        let statistic = t_statistic(fit.slope, sxx, ss_res, m);
        Ok(StationarityResult {
            statistic,
            gamma: fit.slope,
            critical_values,
            is_stationary: statistic < five_percent(&critical_values),
            residuals: fit.residuals,
        })
    }

    /// Engle-Granger test: regresses `y` on `self` and tests the residuals
    /// for stationarity.
    pub fn engle_granger(
        &self,
        y: &Array,
    ) -> Result<CointegrationResult, VkVecError> {
        self.require_vector("engle_granger")?;
        y.require_vector("engle_granger")?;
        if !self.same_length(y, "engle_granger") {
            return Ok(CointegrationResult {
                regression: RegressionResult::placeholder(self, 1)?,
                stationarity: StationarityResult::placeholder(self, ENGLE_GRANGER_CRITICAL_VALUES)?,
                is_cointegrated: false,
            });
        }
        let regression = self.polynomial_regression(y, 1)?;
        let stationarity = regression
            .residuals
            .stationarity("engle_granger", ENGLE_GRANGER_CRITICAL_VALUES)?;
        let is_cointegrated = stationarity.is_stationary;
        Ok(CointegrationResult {
            regression,
            stationarity,
            is_cointegrated,
        })
    }
}
