use super::{Array, Shape};
use crate::backends::vulkan::{PushConstants, VkDispatch};
use crate::error::VkVecError;
use crate::kernel::{BinaryOp, Kernel, ReduceOp};

/// Stopping rule for `Array::inverse`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseOptions {
    pub max_iterations: u32,
    /// Largest accepted `|I - A X|` element.
    pub tolerance: f32,
}

impl Default for InverseOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-5,
        }
    }
}

/// The current Newton-Schulz iterate and the one before it.
struct Iterates<T> {
    current: T,
    previous: Option<T>,
}

impl<T> Iterates<T> {
    fn new(first: T) -> Self {
        Self {
            current: first,
            previous: None,
        }
    }

    /// Makes `next` current and hands back the buffer it retired, if any.
    fn advance(
        &mut self,
        next: T,
    ) -> Option<T> {
        let retired = std::mem::replace(&mut self.current, next);
        self.previous.replace(retired)
    }

    /// The iterate before the current one, or the current one at the start.
    fn before_current(self) -> T {
        self.previous.unwrap_or(self.current)
    }
}

fn matmul_dispatch<'a>(
    a: &'a Array,
    b: &'a Array,
    out: &'a Array,
) -> VkDispatch<'a> {
    VkDispatch::new(Kernel::Matmul)
        .buffers(&[&a.buffer, &b.buffer, &out.buffer])
        .push_constants(PushConstants::new().shape(a.shape).shape(b.shape).shape(out.shape))
        .invocations(out.elements())
}

impl Array {
    /// `(m x k) . (k x n)` for every depth slice; depths must match.
    pub fn matmul(
        &self,
        other: &Array,
    ) -> Result<Array, VkVecError> {
        if self.shape.cols != other.shape.rows || self.shape.depth != other.shape.depth {
            return Err(VkVecError::ShapeMismatch {
                operation: "matmul",
                left: self.shape,
                right: other.shape,
            }
            .logged());
        }
        let out = self.alike(Shape::new(self.shape.rows, other.shape.cols, self.shape.depth))?;
        self.run(&[matmul_dispatch(self, other, &out)])?;
        Ok(out)
    }

    /// Newton-Schulz iteration `X <- X (2I - A X)` from `X0 = A^T / |A|_F^2`.
    ///
    /// Each iteration is recorded as a single batch. When the residual of an
    /// iterate is not finite, a warning is logged and the iterate before it
    /// is returned. Reaching `max_iterations` logs a warning and returns the
    /// latest iterate.
    pub fn inverse(
        &self,
        options: InverseOptions,
    ) -> Result<Array, VkVecError> {
        let n = self.shape.rows;
        if n == 0 || self.shape.cols != n || self.shape.depth != 1 {
            return Err(VkVecError::InvalidArgument {
                operation: "inverse",
                reason: format!("expected a non-empty square matrix, got {}", self.shape),
            }
            .logged());
        }
        let norm_squared = self.scalar_product(self)?;
        if norm_squared == 0.0 || !norm_squared.is_finite() {
            return Err(VkVecError::InvalidArgument {
                operation: "inverse",
                reason: format!("matrix norm is {}", norm_squared.sqrt()),
            }
            .logged());
        }

        let shape = self.shape;
        let identity = Array::identity(&self.context, n)?;
        let mut iterates = Iterates::new(self.transpose()?.mul_scalar(1.0 / norm_squared)?);
        let mut next = self.alike(shape)?;
        let product = self.alike(shape)?;
        let error = self.alike(shape)?;
        let correction = self.alike(shape)?;
        let scratch = self.scratch(error.reduce_scratch_words())?;
        let residual = self.scratch(1)?;

        for iteration in 1..=options.max_iterations {
            scratch.fill_zero()?;
            let x = &iterates.current;
            self.run(&[
                matmul_dispatch(self, x, &product),
                Array::binary_dispatch(&identity, &product, BinaryOp::Sub, &error),
                error.reduce_dispatch(ReduceOp::MaxAbs, &scratch, &residual, 0.0, 0.0),
                Array::binary_dispatch(&error, &identity, BinaryOp::Add, &correction),
                matmul_dispatch(x, &correction, &next),
            ])?;

            let value = residual.get(0)?;
            if !value.is_finite() {
                log::warn!("inverse diverged at iteration {iteration}, returning the previous iterate");
                return Ok(iterates.before_current());
            }
            next = match iterates.advance(next) {
                Some(retired) => retired,
                None => self.alike(shape)?,
            };
            if value < options.tolerance {
                log::debug!("inverse converged after {iteration} iterations (residual {value:e})");
                return Ok(iterates.current);
            }
        }
        log::warn!(
            "inverse did not reach tolerance {} in {} iterations",
            options.tolerance,
            options.max_iterations
        );
        Ok(iterates.current)
    }
}
