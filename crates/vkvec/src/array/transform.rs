use super::{Array, Axis, PoolKind, Shape};
use crate::backends::vulkan::{PushConstants, VkBuffer, VkDispatch};
use crate::error::VkVecError;
use crate::kernel::{BinaryOp, Kernel, TriangularPart, UnaryOp};

/// Extra rows and columns added around a matrix by `Array::pad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Padding {
    pub fn uniform(width: u32) -> Self {
        Self {
            top: width,
            bottom: width,
            left: width,
            right: width,
        }
    }
}

/// Places `input` at `(row_offset, col_offset)` inside `out`; cells outside
/// the input get `fill`. Negative offsets crop the input.
pub(super) fn embed_dispatch<'a>(
    input: &'a VkBuffer,
    in_shape: Shape,
    out: &'a VkBuffer,
    out_shape: Shape,
    (row_offset, col_offset): (i32, i32),
    fill: f32,
) -> VkDispatch<'a> {
    VkDispatch::new(Kernel::Embed)
        .buffers(&[input, out])
        .push_constants(
            PushConstants::new()
                .shape(in_shape)
                .shape(out_shape)
                .i32(row_offset)
                .i32(col_offset)
                .f32(fill),
        )
        .invocations(out_shape.elements())
}

fn checked_extent(
    operation: &'static str,
    extent: u32,
    delta: i64,
    min: i64,
) -> Result<u32, VkVecError> {
    let target = extent as i64 + delta;
    if target < min || target > u32::MAX as i64 {
        return Err(VkVecError::InvalidArgument {
            operation,
            reason: format!("cannot change an extent of {extent} by {delta}"),
        }
        .logged());
    }
    Ok(target as u32)
}

impl Array {
    /// Swaps rows and cols of every depth slice.
    pub fn transpose(&self) -> Result<Array, VkVecError> {
        let out = self.alike(self.shape.transposed())?;
        self.run(&[VkDispatch::new(Kernel::Transpose)
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape))
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Column vector of all elements in flat order.
    pub fn flatten(&self) -> Result<Array, VkVecError> {
        self.reshape(Shape::vector(self.elements() as u32))
    }

    /// Same elements in flat order under a new shape.
    pub fn reshape(
        &self,
        shape: impl Into<Shape>,
    ) -> Result<Array, VkVecError> {
        let shape = shape.into();
        if shape.elements() != self.elements() {
            return Err(VkVecError::ShapeMismatch {
                operation: "reshape",
                left: self.shape,
                right: shape,
            }
            .logged());
        }
        let out = self.alike(shape)?;
        self.run(&[self.unary_dispatch(UnaryOp::Copy, &out, 0.0, 0.0)])?;
        Ok(out)
    }

    /// Keeps the overlapping top-left corner, zero-fills the rest.
    pub fn resize(
        &self,
        shape: impl Into<Shape>,
    ) -> Result<Array, VkVecError> {
        self.embedded(shape.into(), (0, 0), 0.0)
    }

    /// Appends zero rows, or removes trailing rows when `count` is negative.
    pub fn add_rows(
        &self,
        count: i64,
    ) -> Result<Array, VkVecError> {
        let rows = checked_extent("add_rows", self.shape.rows, count, 0)?;
        self.resize(self.shape.with_axis(Axis::Rows, rows))
    }

    pub fn add_cols(
        &self,
        count: i64,
    ) -> Result<Array, VkVecError> {
        let cols = checked_extent("add_cols", self.shape.cols, count, 1)?;
        self.resize(self.shape.with_axis(Axis::Cols, cols))
    }

    pub fn add_depth(
        &self,
        count: i64,
    ) -> Result<Array, VkVecError> {
        let depth = checked_extent("add_depth", self.shape.depth, count, 1)?;
        self.resize(self.shape.with_axis(Axis::Depth, depth))
    }

    pub fn erase_row(
        &self,
        index: usize,
    ) -> Result<Array, VkVecError> {
        self.erase(Axis::Rows, index)
    }

    pub fn erase_col(
        &self,
        index: usize,
    ) -> Result<Array, VkVecError> {
        self.erase(Axis::Cols, index)
    }

    pub fn erase_depth(
        &self,
        index: usize,
    ) -> Result<Array, VkVecError> {
        self.erase(Axis::Depth, index)
    }

    fn erase(
        &self,
        axis: Axis,
        index: usize,
    ) -> Result<Array, VkVecError> {
        let extent = self.shape.extent(axis);
        // cols and depth cannot drop below one
        let min_extent = if axis == Axis::Rows { 1 } else { 2 };
        if index >= extent as usize || extent < min_extent {
            let (row, col, depth) = match axis {
                Axis::Rows => (index, 0, 0),
                Axis::Cols => (0, index, 0),
                Axis::Depth => (0, 0, index),
            };
            return Err(VkVecError::IndexOutOfRange {
                row,
                col,
                depth,
                shape: self.shape,
            }
            .logged());
        }
        let out = self.alike(self.shape.with_axis(axis, extent - 1))?;
        self.run(&[VkDispatch::new(Kernel::Erase(axis))
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape).u32(index as u32))
            .invocations(out.elements())])?;
        Ok(out)
    }

    pub fn pad(
        &self,
        padding: Padding,
        fill: f32,
    ) -> Result<Array, VkVecError> {
        let rows = self.shape.rows as u64 + padding.top as u64 + padding.bottom as u64;
        let cols = self.shape.cols as u64 + padding.left as u64 + padding.right as u64;
        let offsets = (i32::try_from(padding.top), i32::try_from(padding.left));
        let (Ok(rows), Ok(cols), (Ok(top), Ok(left))) = (u32::try_from(rows), u32::try_from(cols), offsets) else {
            return Err(VkVecError::InvalidArgument {
                operation: "pad",
                reason: format!("{padding:?} is too large for shape {}", self.shape),
            }
            .logged());
        };
        self.embedded(Shape::new(rows, cols, self.shape.depth), (top, left), fill)
    }

    fn embedded(
        &self,
        shape: Shape,
        offsets: (i32, i32),
        fill: f32,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(shape)?;
        self.run(&[embed_dispatch(&self.buffer, self.shape, &out.buffer, shape, offsets, fill)])?;
        Ok(out)
    }

    /// Window statistic over every `window` of each depth slice, moving by
    /// `stride` along rows and cols.
    pub fn pool(
        &self,
        kind: PoolKind,
        (window_rows, window_cols): (u32, u32),
        stride: u32,
    ) -> Result<Array, VkVecError> {
        if window_rows == 0 || window_cols == 0 || stride == 0 {
            return Err(VkVecError::InvalidArgument {
                operation: "pool",
                reason: "window and stride must be positive".to_string(),
            }
            .logged());
        }
        if window_rows > self.shape.rows || window_cols > self.shape.cols {
            return Err(VkVecError::ShapeMismatch {
                operation: "pool",
                left: self.shape,
                right: Shape::matrix(window_rows, window_cols),
            }
            .logged());
        }
        let out = self.alike(Shape::new(
            (self.shape.rows - window_rows) / stride + 1,
            (self.shape.cols - window_cols) / stride + 1,
            self.shape.depth,
        ))?;
        self.run(&[VkDispatch::new(Kernel::Pool(kind))
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(
                PushConstants::new()
                    .shape(self.shape)
                    .shape(out.shape)
                    .u32(window_rows)
                    .u32(window_cols)
                    .u32(stride),
            )
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Valid (unpadded) 2-D cross-correlation of every depth slice with
    /// `kernel`. Depth slice `d` uses kernel slice `d % kernel.depth()`.
    pub fn convolve(
        &self,
        kernel: &Array,
        stride: u32,
    ) -> Result<Array, VkVecError> {
        if stride == 0 {
            return Err(VkVecError::InvalidArgument {
                operation: "convolve",
                reason: "stride must be positive".to_string(),
            }
            .logged());
        }
        if kernel.shape.rows == 0 || kernel.shape.rows > self.shape.rows || kernel.shape.cols > self.shape.cols {
            return Err(VkVecError::ShapeMismatch {
                operation: "convolve",
                left: self.shape,
                right: kernel.shape,
            }
            .logged());
        }
        let out = self.alike(Shape::new(
            (self.shape.rows - kernel.shape.rows) / stride + 1,
            (self.shape.cols - kernel.shape.cols) / stride + 1,
            self.shape.depth,
        ))?;
        self.run(&[VkDispatch::new(Kernel::Convolve)
            .buffers(&[&self.buffer, &kernel.buffer, &out.buffer])
            .push_constants(
                PushConstants::new()
                    .shape(self.shape)
                    .shape(kernel.shape)
                    .shape(out.shape)
                    .u32(stride),
            )
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Joins `other` after `self` along `axis`; the other extents must match.
    pub fn concatenate(
        &self,
        other: &Array,
        axis: Axis,
    ) -> Result<Array, VkVecError> {
        let matches = Axis::ALL
            .iter()
            .filter(|&&other_axis| other_axis != axis)
            .all(|&other_axis| self.shape.extent(other_axis) == other.shape.extent(other_axis));
        let extent = self.shape.extent(axis).checked_add(other.shape.extent(axis));
        let Some(extent) = extent.filter(|_| matches) else {
            return Err(VkVecError::ShapeMismatch {
                operation: "concatenate",
                left: self.shape,
                right: other.shape,
            }
            .logged());
        };
        let out = self.alike(self.shape.with_axis(axis, extent))?;
        self.run(&[VkDispatch::new(Kernel::Concat(axis))
            .buffers(&[&self.buffer, &other.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(other.shape).shape(out.shape))
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Reverses the order along `axis`.
    pub fn mirror(
        &self,
        axis: Axis,
    ) -> Result<Array, VkVecError> {
        self.same_shape(Kernel::Mirror(axis))
    }

    /// Column of `(i, i)` elements for every depth slice.
    pub fn diagonal(&self) -> Result<Array, VkVecError> {
        let n = self.shape.rows.min(self.shape.cols);
        let out = self.alike(Shape::new(n, 1, self.shape.depth))?;
        self.run(&[VkDispatch::new(Kernel::Diagonal)
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape))
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Zeroes everything below the main diagonal.
    pub fn upper_triangular(&self) -> Result<Array, VkVecError> {
        self.same_shape(Kernel::Triangular(TriangularPart::Upper))
    }

    /// Zeroes everything above the main diagonal.
    pub fn lower_triangular(&self) -> Result<Array, VkVecError> {
        self.same_shape(Kernel::Triangular(TriangularPart::Lower))
    }

    fn same_shape(
        &self,
        kernel: Kernel,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(self.shape)?;
        self.run(&[VkDispatch::new(kernel)
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape))
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// Gathers `self[map[i]]` into an array shaped like `map`. Negative or
    /// out-of-range indices produce 0.
    pub fn remap(
        &self,
        map: &Array,
    ) -> Result<Array, VkVecError> {
        let out = self.alike(map.shape)?;
        self.run(&[VkDispatch::new(Kernel::Remap)
            .buffers(&[&self.buffer, &map.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(map.shape).shape(out.shape))
            .invocations(out.elements())])?;
        Ok(out)
    }

    /// `x[i + 1] - x[i]` along the vector, one element shorter.
    pub fn diff(&self) -> Result<Array, VkVecError> {
        self.require_vector("diff")?;
        let n = self.elements();
        if n <= 1 {
            return self.alike(Shape::vector(0));
        }
        let axis = self.long_axis();
        let flat = Shape::vector(n as u32);
        let shorter = Shape::vector(n as u32 - 1);
        let head = self.alike(shorter)?;
        let tail = self.alike(shorter)?;
        let out = self.alike(self.shape.with_axis(axis, n as u32 - 1))?;
        self.run(&[
            embed_dispatch(&self.buffer, flat, &head.buffer, shorter, (0, 0), 0.0),
            embed_dispatch(&self.buffer, flat, &tail.buffer, shorter, (-1, 0), 0.0),
            Array::binary_dispatch(&tail, &head, BinaryOp::Sub, &out),
        ])?;
        Ok(out)
    }

    /// `len` consecutive flat elements starting at `start`, as a vector.
    pub(crate) fn segment(
        &self,
        start: usize,
        len: usize,
    ) -> Result<Array, VkVecError> {
        let n = self.elements();
        if start + len > n {
            return Err(VkVecError::InvalidArgument {
                operation: "segment",
                reason: format!("{start}..{} exceeds {n} elements", start + len),
            }
            .logged());
        }
        let out = self.alike(Shape::vector(len as u32))?;
        self.run(&[embed_dispatch(
            &self.buffer,
            Shape::vector(n as u32),
            &out.buffer,
            out.shape,
            (-(start as i32), 0),
            0.0,
        )])?;
        Ok(out)
    }

    fn long_axis(&self) -> Axis {
        Axis::ALL
            .iter()
            .copied()
            .find(|&axis| self.shape.extent(axis) > 1)
            .unwrap_or(Axis::Rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_changes() {
        assert_eq!(checked_extent("t", 3, 2, 0).unwrap(), 5);
        assert_eq!(checked_extent("t", 3, -3, 0).unwrap(), 0);
        assert!(checked_extent("t", 3, -3, 1).is_err());
        assert!(checked_extent("t", u32::MAX, 1, 0).is_err());
    }

    #[test]
    fn uniform_padding() {
        assert_eq!(
            Padding::uniform(2),
            Padding {
                top: 2,
                bottom: 2,
                left: 2,
                right: 2
            }
        );
    }
}
