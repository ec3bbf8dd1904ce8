//! Dense 2-D matrix with explicit layout

use super::layout::{Layout, MatrixOrder, StorageOrder};
use super::storage::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::blas::DenseOperand;
use crate::runtime::Runtime;

/// Dense matrix: device storage plus a 2-D shape/stride layout
///
/// Cloning is cheap; the storage is reference counted and shared. Distinct
/// views (e.g. [`DenseMatrix::transposed`]) alias the same buffer.
#[derive(Debug, Clone)]
pub struct DenseMatrix<R: Runtime> {
    storage: Storage<R>,
    layout: Layout,
}

impl<R: Runtime> DenseMatrix<R> {
    /// Create a matrix from existing storage and layout
    ///
    /// Fails if the layout addresses elements beyond the storage.
    pub fn new(storage: Storage<R>, layout: Layout) -> Result<Self> {
        if layout.required_span() > storage.len() {
            return Err(Error::Internal(format!(
                "layout spans {} elements but storage holds {}",
                layout.required_span(),
                storage.len()
            )));
        }
        Ok(Self { storage, layout })
    }

    /// Create a row-major matrix from a host slice
    pub fn from_slice<T: Element>(data: &[T], shape: [usize; 2], device: &R::Device) -> Result<Self> {
        if data.len() != shape[0] * shape[1] {
            return Err(Error::shape_mismatch(&[shape[0] * shape[1]], &[data.len()]));
        }
        let storage = Storage::from_slice(data, device)?;
        Ok(Self {
            storage,
            layout: Layout::row_major(shape),
        })
    }

    /// Create a matrix from a host slice with an explicit layout
    ///
    /// `data` is the raw backing buffer; the layout determines which of its
    /// elements are logical matrix entries.
    pub fn from_slice_layout<T: Element>(
        data: &[T],
        layout: Layout,
        device: &R::Device,
    ) -> Result<Self> {
        let storage = Storage::from_slice(data, device)?;
        Self::new(storage, layout)
    }

    /// Create a zero-filled row-major matrix
    pub fn zeros(shape: [usize; 2], dtype: DType, device: &R::Device) -> Result<Self> {
        let storage = Storage::new(shape[0] * shape[1], dtype, device)?;
        Ok(Self {
            storage,
            layout: Layout::row_major(shape),
        })
    }

    /// Logical shape `[rows, cols]`
    #[inline]
    pub fn shape(&self) -> [usize; 2] {
        self.layout.shape()
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.layout.rows()
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.layout.cols()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Memory layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Backing storage
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// Device the matrix lives on
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// Classify the layout against the canonical BLAS orders
    #[inline]
    pub fn classify(&self) -> MatrixOrder {
        self.layout.classify()
    }

    /// Zero-copy transposed view: same storage, swapped extents and strides
    pub fn transposed(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            layout: self.layout.transpose(),
        }
    }

    /// Materialize a contiguous copy of this matrix in the given order
    ///
    /// The copy is a new, separately owned matrix with the same shape and
    /// values.
    pub fn contiguous_copy(&self, order: StorageOrder) -> Result<Self> {
        let shape = self.shape();
        let dst_layout = Layout::contiguous(order, shape);
        let storage = Storage::new(self.layout.elem_count(), self.dtype(), self.device())?;
        R::copy_translate(
            self.storage.ptr(),
            self.layout.offset(),
            self.layout.strides(),
            storage.ptr(),
            dst_layout.offset(),
            dst_layout.strides(),
            shape,
            self.dtype().size_in_bytes(),
            self.device(),
        )?;
        Ok(Self {
            storage,
            layout: dst_layout,
        })
    }

    /// Copy this matrix's logical elements into `dst`, respecting both
    /// layouts
    ///
    /// Shapes and dtypes must match. This is the reconciliation step that
    /// writes computed values back into caller-owned strided storage.
    pub fn copy_into(&self, dst: &DenseMatrix<R>) -> Result<()> {
        if self.shape() != dst.shape() {
            return Err(Error::shape_mismatch(&dst.shape(), &self.shape()));
        }
        if self.dtype() != dst.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: dst.dtype(),
                rhs: self.dtype(),
            });
        }
        R::copy_translate(
            self.storage.ptr(),
            self.layout.offset(),
            self.layout.strides(),
            dst.storage.ptr(),
            dst.layout.offset(),
            dst.layout.strides(),
            self.shape(),
            self.dtype().size_in_bytes(),
            self.device(),
        )
    }

    /// Describe this matrix as a BLAS dense operand
    ///
    /// Fails with an internal error if the layout is not BLAS-compatible;
    /// callers are expected to have prepared the matrix first.
    pub fn blas_operand(&self) -> Result<DenseOperand> {
        let (order, ld) = match self.classify() {
            MatrixOrder::RowMajor => (StorageOrder::RowMajor, self.layout.strides()[0]),
            MatrixOrder::ColumnMajor => (StorageOrder::ColumnMajor, self.layout.strides()[1]),
            MatrixOrder::Incompatible => {
                return Err(Error::Internal(
                    "dense operand layout is not BLAS-compatible".to_string(),
                ))
            }
        };
        let elem = self.dtype().size_in_bytes() as u64;
        Ok(DenseOperand {
            ptr: self.storage.ptr() + self.layout.offset() as u64 * elem,
            rows: self.rows(),
            cols: self.cols(),
            ld: ld as usize,
            order,
            dtype: self.dtype(),
        })
    }

    /// Read the matrix back to the host in logical row-major order
    pub fn to_row_major_vec<T: Element>(&self) -> Vec<T> {
        debug_assert_eq!(T::DTYPE, self.dtype());
        let raw: Vec<T> = self.storage.to_vec();
        let [rows, cols] = self.shape();
        let mut out = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                out.push(raw[self.layout.index(i, j)]);
            }
        }
        out
    }
}
