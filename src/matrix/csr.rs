//! CSR (Compressed Sparse Row) matrix

use super::storage::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;

/// Integer width of the CSR index buffers
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexWidth {
    /// 32-bit signed indices
    I32,
    /// 64-bit signed indices
    I64,
}

impl IndexWidth {
    /// The matching index dtype
    #[inline]
    pub fn dtype(self) -> DType {
        match self {
            Self::I32 => DType::I32,
            Self::I64 => DType::I64,
        }
    }
}

/// CSR sparse matrix: row pointers, column indices, values
///
/// Immutable for the duration of a multiply call. Cloning shares the
/// underlying buffers.
#[derive(Debug, Clone)]
pub struct CsrMatrix<R: Runtime> {
    row_ptrs: Storage<R>,
    col_indices: Storage<R>,
    values: Storage<R>,
    shape: [usize; 2],
}

impl<R: Runtime> CsrMatrix<R> {
    /// Create a CSR matrix from its component buffers
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `row_ptrs` does not hold `rows + 1` entries
    /// - `col_indices` and `values` lengths differ
    /// - the index buffers are not I32 or I64, or their widths differ
    ///
    /// Content validity (monotonic row pointers, in-range column indices) is
    /// the producer's concern.
    pub fn new(
        row_ptrs: Storage<R>,
        col_indices: Storage<R>,
        values: Storage<R>,
        shape: [usize; 2],
    ) -> Result<Self> {
        let [rows, _cols] = shape;
        let nnz = values.len();

        if row_ptrs.len() != rows + 1 {
            return Err(Error::shape_mismatch(&[rows + 1], &[row_ptrs.len()]));
        }
        if col_indices.len() != nnz {
            return Err(Error::shape_mismatch(&[nnz], &[col_indices.len()]));
        }
        if !matches!(row_ptrs.dtype(), DType::I32 | DType::I64) {
            return Err(Error::DTypeMismatch {
                lhs: DType::I64,
                rhs: row_ptrs.dtype(),
            });
        }
        if col_indices.dtype() != row_ptrs.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: row_ptrs.dtype(),
                rhs: col_indices.dtype(),
            });
        }

        Ok(Self {
            row_ptrs,
            col_indices,
            values,
            shape,
        })
    }

    /// Create a CSR matrix from host slices with 64-bit indices
    pub fn from_slices<T: Element>(
        row_ptrs: &[i64],
        col_indices: &[i64],
        values: &[T],
        shape: [usize; 2],
        device: &R::Device,
    ) -> Result<Self> {
        Self::new(
            Storage::from_slice(row_ptrs, device)?,
            Storage::from_slice(col_indices, device)?,
            Storage::from_slice(values, device)?,
            shape,
        )
    }

    /// Logical shape `[rows, cols]`
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

    /// Number of stored non-zeros
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Element type of the values
    #[inline]
    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    /// Width of the index buffers
    #[inline]
    pub fn index_width(&self) -> IndexWidth {
        match self.row_ptrs.dtype() {
            DType::I32 => IndexWidth::I32,
            _ => IndexWidth::I64,
        }
    }

    /// Row pointer buffer (`rows + 1` entries)
    #[inline]
    pub fn row_ptrs(&self) -> &Storage<R> {
        &self.row_ptrs
    }

    /// Column index buffer (`nnz` entries)
    #[inline]
    pub fn col_indices(&self) -> &Storage<R> {
        &self.col_indices
    }

    /// Values buffer (`nnz` entries)
    #[inline]
    pub fn values(&self) -> &Storage<R> {
        &self.values
    }

    /// Device the matrix lives on
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.values.device()
    }
}
