use std::ops;

use super::Array;
use crate::error::VkVecError;

macro_rules! array_operator {
    ($trait:ident, $method:ident, $array_op:path, $scalar_op:path) => {
        impl ops::$trait<&Array> for &Array {
            type Output = Result<Array, VkVecError>;

            fn $method(
                self,
                rhs: &Array,
            ) -> Self::Output {
                $array_op(self, rhs)
            }
        }

        impl ops::$trait<f32> for &Array {
            type Output = Result<Array, VkVecError>;

            fn $method(
                self,
                rhs: f32,
            ) -> Self::Output {
                $scalar_op(self, rhs)
            }
        }
    };
}

array_operator!(Add, add, Array::add, Array::add_scalar);
array_operator!(Sub, sub, Array::sub, Array::sub_scalar);
array_operator!(Mul, mul, Array::mul, Array::mul_scalar);
array_operator!(Div, div, Array::div, Array::div_scalar);
array_operator!(Rem, rem, Array::rem, Array::rem_scalar);

impl ops::Neg for &Array {
    type Output = Result<Array, VkVecError>;

    fn neg(self) -> Self::Output {
        Array::neg(self)
    }
}
