use super::Array;
use crate::error::VkVecError;
use crate::kernel::{BinaryOp, ScalarOp, UnaryOp};
use crate::utils::angle::AngleUnit;

// Array with array. Operands of different shapes are narrowed to their
// overlap: the result has the axis-wise minimum shape.
impl Array {
    pub fn add(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Add)
    }

    pub fn sub(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Sub)
    }

    pub fn mul(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Mul)
    }

    pub fn div(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Div)
    }

    /// Remainder with the sign of the dividend.
    pub fn rem(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Rem)
    }

    pub fn pow(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Pow)
    }

    pub fn minimum(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Min)
    }

    pub fn maximum(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Max)
    }

    pub fn eq(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Eq)
    }

    pub fn ne(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Ne)
    }

    pub fn lt(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Lt)
    }

    pub fn le(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Le)
    }

    pub fn gt(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Gt)
    }

    pub fn ge(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Ge)
    }

    /// Logical ops treat any non-zero value as true.
    pub fn and(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::And)
    }

    pub fn or(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Or)
    }

    pub fn xor(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Xor)
    }

    pub fn hadamard(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Mul)
    }

    pub fn hadamard_div(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        self.binary(other, BinaryOp::Div)
    }
}

// Array with scalar.
impl Array {
    pub fn add_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Add, value)
    }

    pub fn sub_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Sub, value)
    }

    /// `value - self`
    pub fn rsub_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::RSub, value)
    }

    pub fn mul_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Mul, value)
    }

    /// Dividing by zero logs a warning and returns an unmodified copy.
    pub fn div_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        if value == 0.0 {
            log::warn!("Division of a {} array by zero, returning a copy", self.shape);
            return self.try_clone();
        }
        self.scalar(ScalarOp::Div, value)
    }

    /// `value / self`
    pub fn rdiv_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::RDiv, value)
    }

    pub fn rem_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Rem, value)
    }

    pub fn pow_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Pow, value)
    }

    /// `value ^ self`
    pub fn rpow_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::RPow, value)
    }

    pub fn min_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Min, value)
    }

    pub fn max_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Max, value)
    }

    pub fn eq_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Eq, value)
    }

    pub fn ne_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Ne, value)
    }

    pub fn lt_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Lt, value)
    }

    pub fn le_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Le, value)
    }

    pub fn gt_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Gt, value)
    }

    pub fn ge_scalar(
        &self,
        value: f32,
    ) -> Result<Array, VkVecError> {
        self.scalar(ScalarOp::Ge, value)
    }

    pub fn clamp(
        &self,
        low: f32,
        high: f32,
    ) -> Result<Array, VkVecError> {
        if low > high {
            return Err(VkVecError::InvalidArgument {
                operation: "clamp",
                reason: format!("lower bound {low} is above upper bound {high}"),
            }
            .logged());
        }
        self.unary(UnaryOp::Clamp, low, high)
    }

    /// `self * scale + offset`
    pub fn affine(
        &self,
        scale: f32,
        offset: f32,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Affine, scale, offset)
    }
}

// Unary.
impl Array {
    pub fn neg(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Neg, 0.0, 0.0)
    }

    pub fn abs(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Abs, 0.0, 0.0)
    }

    pub fn sqrt(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Sqrt, 0.0, 0.0)
    }

    pub fn exp(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Exp, 0.0, 0.0)
    }

    pub fn ln(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Ln, 0.0, 0.0)
    }

    pub fn log10(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Log10, 0.0, 0.0)
    }

    pub fn floor(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Floor, 0.0, 0.0)
    }

    pub fn ceil(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Ceil, 0.0, 0.0)
    }

    /// Half away from zero.
    pub fn round(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Round, 0.0, 0.0)
    }

    pub fn signum(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Sign, 0.0, 0.0)
    }

    /// 1 where the element is zero, 0 elsewhere.
    pub fn not(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Not, 0.0, 0.0)
    }

    pub fn reciprocal(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Reciprocal, 0.0, 0.0)
    }

    pub fn square(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Square, 0.0, 0.0)
    }

    pub fn sigmoid(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Sigmoid, 0.0, 0.0)
    }

    pub fn relu(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Relu, 0.0, 0.0)
    }

    pub fn leaky_relu(
        &self,
        alpha: f32,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::LeakyRelu, alpha, 0.0)
    }

    pub fn tanh(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Tanh, 0.0, 0.0)
    }

    pub fn sinh(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Sinh, 0.0, 0.0)
    }

    pub fn cosh(&self) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Cosh, 0.0, 0.0)
    }

    /// Elements are angles in `unit`.
    pub fn sin(
        &self,
        unit: AngleUnit,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Sin, unit.to_radians_factor(), 0.0)
    }

    pub fn cos(
        &self,
        unit: AngleUnit,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Cos, unit.to_radians_factor(), 0.0)
    }

    pub fn tan(
        &self,
        unit: AngleUnit,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Tan, unit.to_radians_factor(), 0.0)
    }

    /// Result angles are in `unit`.
    pub fn asin(
        &self,
        unit: AngleUnit,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Asin, unit.from_radians_factor(), 0.0)
    }

    pub fn acos(
        &self,
        unit: AngleUnit,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Acos, unit.from_radians_factor(), 0.0)
    }

    pub fn atan(
        &self,
        unit: AngleUnit,
    ) -> Result<Array, VkVecError> {
        self.unary(UnaryOp::Atan, unit.from_radians_factor(), 0.0)
    }
}
