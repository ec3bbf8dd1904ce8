//! cuSPARSE-backed sparse BLAS implementation
//!
//! Implements the sparse BLAS boundary on top of the cuSPARSE generic API.
//! cudarc targets toolkit 11+, where the generic API, row-major dense
//! layouts, and the CSR algorithm are all present, so this backend always
//! reports the current capability tier.

use super::client::CudaClient;
use super::cusparse::{check_cusparse, dtype_to_cusparse, CsrDescriptor, DnMatDescriptor};
use super::kernels;
use super::runtime::CudaRuntime;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::matrix::{CsrMatrix, DenseMatrix, IndexWidth, Storage};
use crate::runtime::blas::{DenseOperand, Operation, SparseBlas, SpmmAlg, SpmmCapability};
use cudarc::cusparse::sys::*;

fn to_cusparse_op(op: Operation) -> cusparseOperation_t {
    match op {
        Operation::NonTranspose => cusparseOperation_t::CUSPARSE_OPERATION_NON_TRANSPOSE,
        Operation::Transpose => cusparseOperation_t::CUSPARSE_OPERATION_TRANSPOSE,
    }
}

fn to_cusparse_alg(alg: SpmmAlg) -> cusparseSpMMAlg_t {
    match alg {
        SpmmAlg::Default => cusparseSpMMAlg_t::CUSPARSE_SPMM_ALG_DEFAULT,
        SpmmAlg::CsrAlg2 => cusparseSpMMAlg_t::CUSPARSE_SPMM_CSR_ALG2,
    }
}

impl SparseBlas<CudaRuntime> for CudaClient {
    type SpMat = CsrDescriptor;
    type DnMat = DnMatDescriptor;

    fn spmm_capability(&self) -> SpmmCapability {
        SpmmCapability::GENERIC_V2
    }

    fn csr_with_i32_indices(
        &self,
        mat: &CsrMatrix<CudaRuntime>,
    ) -> Result<CsrMatrix<CudaRuntime>> {
        if mat.index_width() == IndexWidth::I32 {
            return Ok(mat.clone());
        }

        let narrow = |buf: &Storage<CudaRuntime>| -> Result<Storage<CudaRuntime>> {
            let out = Storage::new(buf.len(), DType::I32, &self.device)?;
            kernels::cast_i64_to_i32(self, buf.ptr(), out.ptr(), buf.len())?;
            Ok(out)
        };

        CsrMatrix::new(
            narrow(mat.row_ptrs())?,
            narrow(mat.col_indices())?,
            mat.values().clone(),
            mat.shape(),
        )
    }

    fn csr_descriptor(&self, mat: &CsrMatrix<CudaRuntime>) -> Result<CsrDescriptor> {
        if mat.index_width() != IndexWidth::I32 {
            return Err(Error::Internal(
                "sparse descriptor requires 32-bit indices".to_string(),
            ));
        }
        if mat.rows() > i32::MAX as usize
            || mat.cols() > i32::MAX as usize
            || mat.nnz() > i32::MAX as usize
        {
            return Err(Error::Internal(format!(
                "matrix dimensions ({}, {}, nnz {}) exceed the cuSPARSE i32 limit",
                mat.rows(),
                mat.cols(),
                mat.nnz()
            )));
        }

        let data_type = dtype_to_cusparse(mat.dtype())
            .map_err(|e| Error::primitive("cusparseCreateCsr", e))?;
        // SAFETY: the buffers are live device allocations with the lengths
        // the descriptor declares.
        unsafe {
            CsrDescriptor::new(
                mat.rows() as i64,
                mat.cols() as i64,
                mat.nnz() as i64,
                mat.row_ptrs().ptr() as *const i32,
                mat.col_indices().ptr() as *const i32,
                mat.values().ptr() as *const std::ffi::c_void,
                data_type,
            )
            .map_err(|e| Error::primitive("cusparseCreateCsr", e))
        }
    }

    fn dense_descriptor(&self, operand: DenseOperand) -> Result<DnMatDescriptor> {
        // SAFETY: the operand describes a live device buffer spanning its
        // extents under the given leading dimension.
        unsafe {
            DnMatDescriptor::new(&operand).map_err(|e| Error::primitive("cusparseCreateDnMat", e))
        }
    }

    fn spmm_buffer_size<T: Element>(
        &self,
        op_a: Operation,
        op_b: Operation,
        alpha: T,
        a: &CsrDescriptor,
        b: &DnMatDescriptor,
        beta: T,
        c: &DnMatDescriptor,
        alg: SpmmAlg,
    ) -> Result<usize> {
        let compute_type =
            dtype_to_cusparse(T::DTYPE).map_err(|e| Error::primitive("cusparseSpMM", e))?;
        let mut buffer_size: usize = 0;
        // SAFETY: descriptors are live for this scope; alpha/beta are host
        // scalars of the declared compute type.
        unsafe {
            check_cusparse(cusparseSpMM_bufferSize(
                self.cusparse.handle(),
                to_cusparse_op(op_a),
                to_cusparse_op(op_b),
                &alpha as *const T as *const std::ffi::c_void,
                a.handle(),
                b.handle(),
                &beta as *const T as *const std::ffi::c_void,
                c.handle(),
                compute_type,
                to_cusparse_alg(alg),
                &mut buffer_size,
            ))
            .map_err(|e| Error::primitive("cusparseSpMM_bufferSize", e))?;
        }
        Ok(buffer_size)
    }

    fn spmm<T: Element>(
        &self,
        op_a: Operation,
        op_b: Operation,
        alpha: T,
        a: &CsrDescriptor,
        b: &DnMatDescriptor,
        beta: T,
        c: &DnMatDescriptor,
        alg: SpmmAlg,
        workspace: u64,
    ) -> Result<()> {
        let compute_type =
            dtype_to_cusparse(T::DTYPE).map_err(|e| Error::primitive("cusparseSpMM", e))?;
        // SAFETY: descriptors and the workspace buffer are live for the
        // duration of the call; the stream orders the work.
        unsafe {
            check_cusparse(cusparseSpMM(
                self.cusparse.handle(),
                to_cusparse_op(op_a),
                to_cusparse_op(op_b),
                &alpha as *const T as *const std::ffi::c_void,
                a.handle(),
                b.handle(),
                &beta as *const T as *const std::ffi::c_void,
                c.handle(),
                compute_type,
                to_cusparse_alg(alg),
                workspace as *mut std::ffi::c_void,
            ))
            .map_err(|e| Error::primitive("cusparseSpMM", e))?;
        }
        Ok(())
    }

    fn spmm_legacy<T: Element>(
        &self,
        _nnz: usize,
        _m: usize,
        _n: usize,
        _k: usize,
        _beta: T,
        _alpha: T,
        _row_ptrs: &Storage<CudaRuntime>,
        _col_indices: &Storage<CudaRuntime>,
        _values: &Storage<CudaRuntime>,
        _b: &DenseMatrix<CudaRuntime>,
        _c: &DenseMatrix<CudaRuntime>,
    ) -> Result<()> {
        // Unreachable through the dispatcher: this backend always reports
        // generic_api = true.
        Err(Error::Internal(
            "legacy sparse BLAS worker is not available on the CUDA backend".to_string(),
        ))
    }
}
