mod construct;
mod elementwise;
mod linalg;
mod ops;
mod print;
mod reduce;
mod shape;
mod stats;
mod transform;

use std::sync::{Arc, Mutex, PoisonError};

pub use construct::Distribution;
pub use linalg::InverseOptions;
pub use print::{PrintLayout, PrintOptions, format_values};
pub use shape::Shape;
pub use stats::{CointegrationResult, CorrelationResult, RegressionResult, StationarityResult};
pub use transform::Padding;

pub use crate::kernel::{Axis, PoolKind};
use crate::backends::vulkan::{PushConstants, VkBuffer, VkCommandBuffer, VkContext, VkDispatch};
use crate::error::VkVecError;
use crate::kernel::{BinaryOp, Kernel, ReduceOp, ScalarOp, UnaryOp};

/// Dense `f32` array of up to three axes living in a Vulkan storage buffer.
///
/// Every operation records one or more kernel dispatches on the array's own
/// command buffer, submits them and waits for completion before returning.
/// Results are new arrays; the `fill*` family and `set*` write in place.
pub struct Array {
    buffer: VkBuffer,
    command_buffer: Mutex<VkCommandBuffer>,
    context: Arc<VkContext>,
    shape: Shape,
}

impl Array {
    pub(crate) fn allocate(
        context: &Arc<VkContext>,
        shape: Shape,
    ) -> Result<Self, VkVecError> {
        // kernels index with 32-bit words
        if shape.elements() > u32::MAX as usize {
            return Err(VkVecError::InvalidArgument {
                operation: "allocate",
                reason: format!("shape {shape} has more than {} elements", u32::MAX),
            }
            .logged());
        }
        let buffer = VkBuffer::new_storage(context.clone(), shape.elements())?;
        let command_buffer = VkCommandBuffer::new(context)?;
        Ok(Self {
            buffer,
            command_buffer: Mutex::new(command_buffer),
            context: context.clone(),
            shape,
        })
    }

    /// Uninitialised array on the same context.
    pub(crate) fn alike(
        &self,
        shape: Shape,
    ) -> Result<Self, VkVecError> {
        Self::allocate(&self.context, shape)
    }

    pub(crate) fn scratch(
        &self,
        words: usize,
    ) -> Result<VkBuffer, VkVecError> {
        let buffer = VkBuffer::new_storage(self.context.clone(), words)?;
        buffer.fill_zero()?;
        Ok(buffer)
    }

    pub(crate) fn run(
        &self,
        dispatches: &[VkDispatch<'_>],
    ) -> Result<(), VkVecError> {
        let mut command_buffer = self.command_buffer.lock().unwrap_or_else(PoisonError::into_inner);
        command_buffer.compute(dispatches)?;
        Ok(())
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.shape.cols as usize
    }

    pub fn depth(&self) -> usize {
        self.shape.depth as usize
    }

    pub fn dimensions(&self) -> u32 {
        self.shape.dimensions()
    }

    pub fn elements(&self) -> usize {
        self.shape.elements()
    }

    pub fn is_empty(&self) -> bool {
        self.elements() == 0
    }

    pub fn buffer(&self) -> &VkBuffer {
        &self.buffer
    }

    pub fn context(&self) -> &Arc<VkContext> {
        &self.context
    }

    pub fn get(
        &self,
        row: usize,
        col: usize,
        depth: usize,
    ) -> Result<f32, VkVecError> {
        let index = self.checked_index(row, col, depth)?;
        Ok(self.buffer.get(index)?)
    }

    pub fn set(
        &self,
        value: f32,
        row: usize,
        col: usize,
        depth: usize,
    ) -> Result<(), VkVecError> {
        let index = self.checked_index(row, col, depth)?;
        Ok(self.buffer.set(value, index)?)
    }

    pub fn get_flat(
        &self,
        index: usize,
    ) -> Result<f32, VkVecError> {
        self.check_flat(index)?;
        Ok(self.buffer.get(index)?)
    }

    pub fn set_flat(
        &self,
        value: f32,
        index: usize,
    ) -> Result<(), VkVecError> {
        self.check_flat(index)?;
        Ok(self.buffer.set(value, index)?)
    }

    /// Copies the elements back to the host in flat order.
    pub fn read(&self) -> Result<Vec<f32>, VkVecError> {
        let mut values = self.buffer.read()?;
        values.truncate(self.elements());
        Ok(values)
    }

    pub fn write(
        &self,
        values: &[f32],
    ) -> Result<(), VkVecError> {
        if values.len() != self.elements() {
            return Err(VkVecError::LengthMismatch {
                operation: "write",
                expected: self.elements(),
                actual: values.len(),
            }
            .logged());
        }
        Ok(self.buffer.write(values)?)
    }

    fn checked_index(
        &self,
        row: usize,
        col: usize,
        depth: usize,
    ) -> Result<usize, VkVecError> {
        if !self.shape.contains(row, col, depth) {
            return Err(VkVecError::IndexOutOfRange {
                row,
                col,
                depth,
                shape: self.shape,
            }
            .logged());
        }
        Ok(self.shape.flat_index(row, col, depth))
    }

    fn check_flat(
        &self,
        index: usize,
    ) -> Result<(), VkVecError> {
        if index < self.elements() {
            return Ok(());
        }
        let plane = self.cols() * self.depth();
        Err(VkVecError::IndexOutOfRange {
            row: index / plane,
            col: index % plane / self.depth(),
            depth: index % self.depth(),
            shape: self.shape,
        }
        .logged())
    }

    pub(crate) fn require_vector(
        &self,
        operation: &'static str,
    ) -> Result<(), VkVecError> {
        if self.shape.is_vector() {
            return Ok(());
        }
        Err(VkVecError::NotAVector {
            operation,
            shape: self.shape,
        }
        .logged())
    }

    pub(crate) fn unary(
        &self,
        op: UnaryOp,
        p0: f32,
        p1: f32,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(self.shape)?;
        self.run(&[self.unary_dispatch(op, &out, p0, p1)])?;
        Ok(out)
    }

    pub(crate) fn unary_dispatch<'a>(
        &'a self,
        op: UnaryOp,
        out: &'a Array,
        p0: f32,
        p1: f32,
    ) -> VkDispatch<'a> {
        VkDispatch::new(Kernel::Unary(op))
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape).f32(p0).f32(p1))
            .invocations(self.elements().min(out.elements()))
    }

    /// Elementwise op over the overlap of both shapes.
    pub(crate) fn binary(
        &self,
        other: &Array,
        op: BinaryOp,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(self.shape.overlap(&other.shape))?;
        self.run(&[Self::binary_dispatch(self, other, op, &out)])?;
        Ok(out)
    }

    pub(crate) fn binary_dispatch<'a>(
        a: &'a Array,
        b: &'a Array,
        op: BinaryOp,
        out: &'a Array,
    ) -> VkDispatch<'a> {
        VkDispatch::new(Kernel::Binary(op))
            .buffers(&[&a.buffer, &b.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(a.shape).shape(b.shape).shape(out.shape))
            .invocations(out.elements())
    }

    pub(crate) fn scalar(
        &self,
        op: ScalarOp,
        value: f32,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(self.shape)?;
        self.run(&[VkDispatch::new(Kernel::Scalar(op))
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape).f32(value))
            .invocations(self.elements())])?;
        Ok(out)
    }

    /// Runs a two-phase reduction and reads back its single result.
    pub(crate) fn reduce(
        &self,
        op: ReduceOp,
        mean: f32,
        power: f32,
    ) -> Result<f32, VkVecError> {
        let scratch = self.scratch(self.reduce_scratch_words())?;
        let result = self.scratch(1)?;
        self.run(&[self.reduce_dispatch(op, &scratch, &result, mean, power)])?;
        Ok(result.get(0)?)
    }

    /// A counter word followed by one partial per workgroup.
    pub(crate) fn reduce_scratch_words(&self) -> usize {
        1 + self.context.workgroup_count(self.elements()) as usize
    }

    /// `scratch` must be zeroed before every submission.
    pub(crate) fn reduce_dispatch<'a>(
        &'a self,
        op: ReduceOp,
        scratch: &'a VkBuffer,
        result: &'a VkBuffer,
        mean: f32,
        power: f32,
    ) -> VkDispatch<'a> {
        VkDispatch::new(Kernel::Reduce(op))
            .buffers(&[&self.buffer, scratch, result])
            .push_constants(PushConstants::new().shape(self.shape).f32(mean).f32(power))
            .invocations(self.elements())
    }
}

impl std::fmt::Debug for Array {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Array").field("shape", &self.shape).finish_non_exhaustive()
    }
}
