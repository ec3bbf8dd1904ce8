//! cuSPARSE handle and descriptor wrappers
//!
//! RAII wrappers around the cuSPARSE generic API objects used by the SpMM
//! path. Descriptors are created per call and destroyed on drop.

#![allow(unsafe_op_in_unsafe_fn)]

use super::device::CudaError;
use crate::dtype::DType;
use crate::matrix::StorageOrder;
use crate::runtime::blas::DenseOperand;
use cudarc::cusparse::sys::*;
use cudarc::driver::CudaStream;
use std::ptr::null_mut;
use std::sync::Arc;

/// RAII wrapper for a cuSPARSE handle bound to a stream
pub struct CudaSparse {
    handle: cusparseHandle_t,
    stream: Arc<CudaStream>,
}

impl CudaSparse {
    /// Create a new cuSPARSE handle associated with the given stream
    pub fn new(stream: Arc<CudaStream>) -> Result<Self, CudaError> {
        unsafe {
            let mut handle = null_mut();
            check_cusparse(cusparseCreate(&mut handle))?;
            check_cusparse(cusparseSetStream(
                handle,
                stream.cu_stream() as cudaStream_t,
            ))?;
            Ok(Self { handle, stream })
        }
    }

    /// Get the raw cuSPARSE handle
    #[inline]
    pub fn handle(&self) -> cusparseHandle_t {
        self.handle
    }

    /// Get the associated CUDA stream
    #[inline]
    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }
}

impl Drop for CudaSparse {
    fn drop(&mut self) {
        unsafe {
            let _ = cusparseDestroy(self.handle);
        }
    }
}

// cusparseHandle_t is a raw pointer, so we need to manually implement
// Send/Sync.
// SAFETY: cuSPARSE operations are synchronized by the associated CUDA
// stream, which ensures ordering across threads.
unsafe impl Send for CudaSparse {}
unsafe impl Sync for CudaSparse {}

/// Check a cuSPARSE status and convert to Result
pub fn check_cusparse(status: cusparseStatus_t) -> Result<(), CudaError> {
    if status == cusparseStatus_t::CUSPARSE_STATUS_SUCCESS {
        Ok(())
    } else {
        Err(CudaError::CusparseError(format!("{:?}", status)))
    }
}

/// Convert DType to cudaDataType for cuSPARSE
pub fn dtype_to_cusparse(dtype: DType) -> Result<cudaDataType, CudaError> {
    match dtype {
        DType::F64 => Ok(cudaDataType::CUDA_R_64F),
        DType::F32 => Ok(cudaDataType::CUDA_R_32F),
        DType::F16 => Ok(cudaDataType::CUDA_R_16F),
        DType::BF16 => Ok(cudaDataType::CUDA_R_16BF),
        DType::Complex64 => Ok(cudaDataType::CUDA_C_32F),
        DType::Complex128 => Ok(cudaDataType::CUDA_C_64F),
        other => Err(CudaError::CusparseError(format!(
            "no cudaDataType for dtype {:?}",
            other
        ))),
    }
}

/// RAII wrapper for a CSR sparse matrix descriptor
pub struct CsrDescriptor {
    descr: cusparseSpMatDescr_t,
}

impl CsrDescriptor {
    /// Create a new CSR matrix descriptor with 32-bit indices
    ///
    /// # Safety
    /// - `row_ptrs` must point to valid device memory with `rows + 1` elements
    /// - `col_indices` and `values` must point to valid device memory with
    ///   `nnz` elements
    pub unsafe fn new(
        rows: i64,
        cols: i64,
        nnz: i64,
        row_ptrs: *const i32,
        col_indices: *const i32,
        values: *const std::ffi::c_void,
        data_type: cudaDataType,
    ) -> Result<Self, CudaError> {
        let mut descr = null_mut();
        check_cusparse(cusparseCreateCsr(
            &mut descr,
            rows,
            cols,
            nnz,
            row_ptrs as *mut std::ffi::c_void, // cusparse requires mutable pointers
            col_indices as *mut std::ffi::c_void,
            values as *mut std::ffi::c_void,
            cusparseIndexType_t::CUSPARSE_INDEX_32I,
            cusparseIndexType_t::CUSPARSE_INDEX_32I,
            cusparseIndexBase_t::CUSPARSE_INDEX_BASE_ZERO,
            data_type,
        ))?;
        Ok(Self { descr })
    }

    /// Get the raw descriptor handle
    #[inline]
    pub fn handle(&self) -> cusparseSpMatDescr_t {
        self.descr
    }
}

impl Drop for CsrDescriptor {
    fn drop(&mut self) {
        unsafe {
            let _ = cusparseDestroySpMat(self.descr);
        }
    }
}

/// RAII wrapper for a dense matrix descriptor
pub struct DnMatDescriptor {
    descr: cusparseDnMatDescr_t,
}

impl DnMatDescriptor {
    /// Create a dense matrix descriptor from a BLAS operand view
    ///
    /// # Safety
    /// The operand's pointer must address valid device memory spanning its
    /// extents under the given leading dimension.
    pub unsafe fn new(operand: &DenseOperand) -> Result<Self, CudaError> {
        let data_type = dtype_to_cusparse(operand.dtype)?;
        let order = match operand.order {
            StorageOrder::RowMajor => cusparseOrder_t::CUSPARSE_ORDER_ROW,
            StorageOrder::ColumnMajor => cusparseOrder_t::CUSPARSE_ORDER_COL,
        };

        let mut descr = null_mut();
        check_cusparse(cusparseCreateDnMat(
            &mut descr,
            operand.rows as i64,
            operand.cols as i64,
            operand.ld as i64,
            operand.ptr as *mut std::ffi::c_void,
            data_type,
            order,
        ))?;
        Ok(Self { descr })
    }

    /// Get the raw descriptor handle
    #[inline]
    pub fn handle(&self) -> cusparseDnMatDescr_t {
        self.descr
    }
}

impl Drop for DnMatDescriptor {
    fn drop(&mut self) {
        unsafe {
            let _ = cusparseDestroyDnMat(self.descr);
        }
    }
}
