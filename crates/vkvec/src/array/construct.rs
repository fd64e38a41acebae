use std::sync::Arc;

use super::{Array, Shape};
use crate::backends::vulkan::{PushConstants, VkContext, VkDispatch};
use crate::error::VkVecError;
use crate::kernel::{FillOp, Kernel, RandomOp, UnaryOp};
use crate::utils::seed::time_seed;

/// Random fills evaluated on the device from a 32-bit seed.
///
/// Weight initialisers take fan-in from `rows` and fan-out from `cols`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    Gaussian { mean: f32, std_dev: f32 },
    Uniform { low: f32, high: f32 },
    /// Integers in `low..=high`.
    UniformInt { low: i32, high: i32 },
    /// 1 with `probability`, else 0.
    Binary { probability: f32 },
    /// -1 or 1 with equal odds.
    Sign,
    /// Inverted dropout mask: 0 with `rate`, else `1 / (1 - rate)`.
    Dropout { rate: f32 },
    XavierUniform,
    XavierNormal,
    HeUniform,
    HeNormal,
    LecunNormal,
}

impl Distribution {
    fn kernel_params(&self) -> (RandomOp, f32, f32) {
        match *self {
            Distribution::Gaussian { mean, std_dev } => (RandomOp::Gaussian, mean, std_dev),
            Distribution::Uniform { low, high } => (RandomOp::Uniform, low, high),
            Distribution::UniformInt { low, high } => (RandomOp::UniformInt, low as f32, high as f32),
            Distribution::Binary { probability } => (RandomOp::Binary, probability, 0.0),
            Distribution::Sign => (RandomOp::Sign, 0.0, 0.0),
            Distribution::Dropout { rate } => (RandomOp::Dropout, rate, 0.0),
            Distribution::XavierUniform => (RandomOp::XavierUniform, 0.0, 0.0),
            Distribution::XavierNormal => (RandomOp::XavierNormal, 0.0, 0.0),
            Distribution::HeUniform => (RandomOp::HeUniform, 0.0, 0.0),
            Distribution::HeNormal => (RandomOp::HeNormal, 0.0, 0.0),
            Distribution::LecunNormal => (RandomOp::LecunNormal, 0.0, 0.0),
        }
    }

    /// Why the parameters describe no distribution, if they don't.
    fn invalid_parameters(&self) -> Option<&'static str> {
        match *self {
            Distribution::Binary { probability: ratio } | Distribution::Dropout { rate: ratio }
                if !(0.0..=1.0).contains(&ratio) =>
            {
                Some("ratio must lie in [0, 1]")
            },
            Distribution::UniformInt { low, high } if high < low => Some("high must not be below low"),
            _ => None,
        }
    }
}

impl Array {
    /// Zero-filled array.
    pub fn new(
        context: &Arc<VkContext>,
        shape: impl Into<Shape>,
    ) -> Result<Self, VkVecError> {
        let array = Self::allocate(context, shape.into())?;
        array.buffer.fill_zero()?;
        Ok(array)
    }

    pub fn zeros(
        context: &Arc<VkContext>,
        shape: impl Into<Shape>,
    ) -> Result<Self, VkVecError> {
        Self::new(context, shape)
    }

    pub fn filled(
        context: &Arc<VkContext>,
        shape: impl Into<Shape>,
        value: f32,
    ) -> Result<Self, VkVecError> {
        let array = Self::allocate(context, shape.into())?;
        array.fill(value)?;
        Ok(array)
    }

    /// `n x n` identity matrix.
    pub fn identity(
        context: &Arc<VkContext>,
        n: u32,
    ) -> Result<Self, VkVecError> {
        let array = Self::allocate(context, Shape::matrix(n, n))?;
        array.fill_identity()?;
        Ok(array)
    }

    pub fn from_slice(
        context: &Arc<VkContext>,
        shape: impl Into<Shape>,
        values: &[f32],
    ) -> Result<Self, VkVecError> {
        let shape = shape.into();
        if values.len() != shape.elements() {
            return Err(VkVecError::LengthMismatch {
                operation: "from_slice",
                expected: shape.elements(),
                actual: values.len(),
            }
            .logged());
        }
        let array = Self::allocate(context, shape)?;
        array.buffer.write(values)?;
        Ok(array)
    }

    pub fn random(
        context: &Arc<VkContext>,
        shape: impl Into<Shape>,
        distribution: Distribution,
    ) -> Result<Self, VkVecError> {
        Self::random_seeded(context, shape, distribution, time_seed())
    }

    pub fn random_seeded(
        context: &Arc<VkContext>,
        shape: impl Into<Shape>,
        distribution: Distribution,
        seed: u32,
    ) -> Result<Self, VkVecError> {
        let array = Self::new(context, shape)?;
        array.fill_random_seeded(distribution, seed)?;
        Ok(array)
    }

    /// Deep copy through the copy kernel.
    pub fn try_clone(&self) -> Result<Self, VkVecError> {
        self.unary(UnaryOp::Copy, 0.0, 0.0)
    }

    pub fn fill(
        &self,
        value: f32,
    ) -> Result<(), VkVecError> {
        self.run(&[VkDispatch::new(Kernel::Fill(FillOp::Constant))
            .buffer(&self.buffer)
            .push_constants(PushConstants::new().shape(self.shape).f32(value))
            .invocations(self.elements())])
    }

    pub fn fill_zero(&self) -> Result<(), VkVecError> {
        Ok(self.buffer.fill_zero()?)
    }

    /// Ones where `row == col` in every depth slice, zeros elsewhere.
    pub fn fill_identity(&self) -> Result<(), VkVecError> {
        self.run(&[VkDispatch::new(Kernel::Fill(FillOp::Identity))
            .buffer(&self.buffer)
            .push_constants(PushConstants::new().shape(self.shape))
            .invocations(self.elements())])
    }

    pub fn fill_random(
        &self,
        distribution: Distribution,
    ) -> Result<(), VkVecError> {
        self.fill_random_seeded(distribution, time_seed())
    }

    /// Same seed and shape give the same values on the same device.
    pub fn fill_random_seeded(
        &self,
        distribution: Distribution,
        seed: u32,
    ) -> Result<(), VkVecError> {
        if let Some(reason) = distribution.invalid_parameters() {
            log::warn!("{distribution:?}: {reason}, array left unchanged");
            return Ok(());
        }
        let (op, p0, p1) = distribution.kernel_params();
        self.run(&[VkDispatch::new(Kernel::Random(op))
            .buffer(&self.buffer)
            .push_constants(PushConstants::new().shape(self.shape).u32(seed).f32(p0).f32(p1))
            .invocations(self.elements())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_validation() {
        assert_eq!(Distribution::Binary { probability: 0.5 }.invalid_parameters(), None);
        assert_eq!(Distribution::Dropout { rate: 1.0 }.invalid_parameters(), None);
        assert!(Distribution::Dropout { rate: 1.5 }.invalid_parameters().is_some());
        assert!(Distribution::Binary { probability: -0.1 }.invalid_parameters().is_some());
        assert_eq!(Distribution::UniformInt { low: 2, high: 2 }.invalid_parameters(), None);
        assert!(Distribution::UniformInt { low: 3, high: -3 }.invalid_parameters().is_some());
        assert_eq!(Distribution::HeNormal.invalid_parameters(), None);
    }

    #[test]
    fn kernel_parameters() {
        assert_eq!(
            Distribution::UniformInt { low: -3, high: 7 }.kernel_params(),
            (RandomOp::UniformInt, -3.0, 7.0)
        );
        assert_eq!(
            Distribution::Gaussian { mean: 1.0, std_dev: 2.0 }.kernel_params(),
            (RandomOp::Gaussian, 1.0, 2.0)
        );
    }
}
