use std::fmt;

/// Extent of an array along rows, cols and depth.
///
/// `cols` and `depth` are at least 1; `rows` may be 0 for an empty array.
/// Elements are stored row-major with depth varying fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: u32,
    pub cols: u32,
    pub depth: u32,
}

impl Shape {
    pub fn new(
        rows: u32,
        cols: u32,
        depth: u32,
    ) -> Self {
        Self {
            rows,
            cols: cols.max(1),
            depth: depth.max(1),
        }
    }

    /// Column vector of `len` elements.
    pub fn vector(len: u32) -> Self {
        Self::new(len, 1, 1)
    }

    pub fn matrix(
        rows: u32,
        cols: u32,
    ) -> Self {
        Self::new(rows, cols, 1)
    }

    pub fn elements(&self) -> usize {
        self.rows as usize * self.cols as usize * self.depth as usize
    }

    pub fn dimensions(&self) -> u32 {
        if self.depth > 1 {
            3
        } else if self.cols > 1 {
            2
        } else if self.rows > 0 {
            1
        } else {
            0
        }
    }

    pub fn flat_index(
        &self,
        row: usize,
        col: usize,
        depth: usize,
    ) -> usize {
        (row * self.cols as usize + col) * self.depth as usize + depth
    }

    pub fn contains(
        &self,
        row: usize,
        col: usize,
        depth: usize,
    ) -> bool {
        row < self.rows as usize && col < self.cols as usize && depth < self.depth as usize
    }

    /// At most one axis is longer than 1.
    pub fn is_vector(&self) -> bool {
        [self.rows, self.cols, self.depth].iter().filter(|&&extent| extent > 1).count() <= 1
    }

    /// Axis-wise minimum of both shapes.
    pub fn overlap(
        &self,
        other: &Shape,
    ) -> Shape {
        Shape::new(self.rows.min(other.rows), self.cols.min(other.cols), self.depth.min(other.depth))
    }

    /// Rows and cols swapped, depth kept.
    pub fn transposed(&self) -> Shape {
        Shape::new(self.cols, self.rows, self.depth)
    }

    pub(crate) fn with_axis(
        &self,
        axis: super::Axis,
        extent: u32,
    ) -> Shape {
        match axis {
            super::Axis::Rows => Shape::new(extent, self.cols, self.depth),
            super::Axis::Cols => Shape::new(self.rows, extent, self.depth),
            super::Axis::Depth => Shape::new(self.rows, self.cols, extent),
        }
    }

    pub(crate) fn extent(
        &self,
        axis: super::Axis,
    ) -> u32 {
        match axis {
            super::Axis::Rows => self.rows,
            super::Axis::Cols => self.cols,
            super::Axis::Depth => self.depth,
        }
    }
}

impl From<(u32, u32)> for Shape {
    fn from((rows, cols): (u32, u32)) -> Self {
        Shape::matrix(rows, cols)
    }
}

impl From<(u32, u32, u32)> for Shape {
    fn from((rows, cols, depth): (u32, u32, u32)) -> Self {
        Shape::new(rows, cols, depth)
    }
}

impl fmt::Display for Shape {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}x{}x{}", self.rows, self.cols, self.depth)
    }
}
