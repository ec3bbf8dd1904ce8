//! Layout: shape, strides, and offset for 2-D matrix memory
//!
//! Strides are in elements, not bytes. The address of element `(i, j)` is
//! `offset + i * strides[0] + j * strides[1]`.

use std::fmt;

/// Storage order of a dense matrix that is usable by BLAS primitives
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StorageOrder {
    /// Innermost stride runs along columns (C order)
    RowMajor,
    /// Innermost stride runs along rows (Fortran order)
    ColumnMajor,
}

/// Classification of a matrix layout against the canonical BLAS orders
///
/// `Incompatible` layouts are not an error anywhere in this crate; they are
/// handled by materializing a contiguous copy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatrixOrder {
    /// BLAS-compatible row-major: unit column stride, row stride ≥ cols
    RowMajor,
    /// BLAS-compatible column-major: unit row stride, column stride ≥ rows
    ColumnMajor,
    /// Any other stride pattern; requires a copy before BLAS use
    Incompatible,
}

/// Memory layout of a 2-D matrix
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: [usize; 2],
    strides: [isize; 2],
    offset: usize,
}

impl Layout {
    /// Create a layout with explicit shape, strides, and offset
    pub fn new(shape: [usize; 2], strides: [isize; 2], offset: usize) -> Self {
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Create a contiguous row-major layout
    pub fn row_major(shape: [usize; 2]) -> Self {
        Self {
            shape,
            strides: [shape[1] as isize, 1],
            offset: 0,
        }
    }

    /// Create a contiguous column-major layout
    pub fn column_major(shape: [usize; 2]) -> Self {
        Self {
            shape,
            strides: [1, shape[0] as isize],
            offset: 0,
        }
    }

    /// Create a contiguous layout in the given order
    pub fn contiguous(order: StorageOrder, shape: [usize; 2]) -> Self {
        match order {
            StorageOrder::RowMajor => Self::row_major(shape),
            StorageOrder::ColumnMajor => Self::column_major(shape),
        }
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> [isize; 2] {
        self.strides
    }

    /// Get the offset (in elements)
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total number of logical elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape[0] * self.shape[1]
    }

    /// Classify this layout against the canonical BLAS orders
    ///
    /// Row-major is checked first, so degenerate shapes (1×1, 1×n with unit
    /// strides) classify as row-major. This is a pure function of shape and
    /// strides; it never touches device memory.
    pub fn classify(&self) -> MatrixOrder {
        let [rows, cols] = self.shape;
        let [s0, s1] = self.strides;
        if s1 == 1 && s0 >= cols.max(1) as isize {
            MatrixOrder::RowMajor
        } else if s0 == 1 && s1 >= rows.max(1) as isize {
            MatrixOrder::ColumnMajor
        } else {
            MatrixOrder::Incompatible
        }
    }

    /// Whether the innermost (column) stride is 1
    ///
    /// This is the row-majorness test used for transpose resolution: a
    /// prepared matrix is treated as row-major exactly when its last-axis
    /// stride is unit.
    #[inline]
    pub fn has_unit_column_stride(&self) -> bool {
        self.strides[1] == 1
    }

    /// Transposed layout: swap the two extents and their strides
    ///
    /// This is a zero-copy view transformation; the underlying storage is
    /// unchanged.
    pub fn transpose(&self) -> Self {
        Self {
            shape: [self.shape[1], self.shape[0]],
            strides: [self.strides[1], self.strides[0]],
            offset: self.offset,
        }
    }

    /// Linear element index of `(i, j)` in the underlying storage
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.shape[0] && j < self.shape[1]);
        (self.offset as isize + i as isize * self.strides[0] + j as isize * self.strides[1])
            as usize
    }

    /// Number of storage elements the layout can address
    ///
    /// Used to validate that a buffer is large enough to back this layout.
    /// Assumes non-negative strides.
    pub fn required_span(&self) -> usize {
        if self.shape[0] == 0 || self.shape[1] == 0 {
            return self.offset;
        }
        let last = self.offset as isize
            + (self.shape[0] as isize - 1) * self.strides[0]
            + (self.shape[1] as isize - 1) * self.strides[1];
        last as usize + 1
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape, self.strides, self.offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_classification() {
        let layout = Layout::row_major([3, 4]);
        assert_eq!(layout.strides(), [4, 1]);
        assert_eq!(layout.classify(), MatrixOrder::RowMajor);
        assert!(layout.has_unit_column_stride());
    }

    #[test]
    fn test_column_major_classification() {
        let layout = Layout::column_major([3, 4]);
        assert_eq!(layout.strides(), [1, 3]);
        assert_eq!(layout.classify(), MatrixOrder::ColumnMajor);
        assert!(!layout.has_unit_column_stride());
    }

    #[test]
    fn test_padded_leading_dimension_is_compatible() {
        // Row-major with ld > cols (padded rows) is BLAS-compatible
        let layout = Layout::new([3, 4], [6, 1], 0);
        assert_eq!(layout.classify(), MatrixOrder::RowMajor);

        // Column-major with ld > rows
        let layout = Layout::new([3, 4], [1, 5], 0);
        assert_eq!(layout.classify(), MatrixOrder::ColumnMajor);
    }

    #[test]
    fn test_incompatible_layouts() {
        // Every-other-column slice: no unit stride
        let layout = Layout::new([3, 4], [8, 2], 0);
        assert_eq!(layout.classify(), MatrixOrder::Incompatible);

        // Row stride too small to be a valid leading dimension
        let layout = Layout::new([3, 4], [2, 1], 0);
        assert_eq!(layout.classify(), MatrixOrder::Incompatible);
    }

    #[test]
    fn test_degenerate_shapes_prefer_row_major() {
        let layout = Layout::new([1, 1], [1, 1], 0);
        assert_eq!(layout.classify(), MatrixOrder::RowMajor);
    }

    #[test]
    fn test_transpose_swaps_extents_and_strides() {
        let layout = Layout::row_major([2, 5]);
        let t = layout.transpose();
        assert_eq!(t.shape(), [5, 2]);
        assert_eq!(t.strides(), [1, 5]);
        assert_eq!(t.classify(), MatrixOrder::ColumnMajor);
    }

    #[test]
    fn test_index_and_span() {
        let layout = Layout::new([2, 3], [4, 1], 2);
        assert_eq!(layout.index(0, 0), 2);
        assert_eq!(layout.index(1, 2), 8);
        assert_eq!(layout.required_span(), 9);
    }
}
