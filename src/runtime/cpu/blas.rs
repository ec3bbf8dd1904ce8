//! Host sparse BLAS primitive
//!
//! A reference implementation of the sparse BLAS boundary: descriptor
//! structs are plain metadata, the workspace size query returns a small
//! deterministic request, and the compute entry points run a row-parallel
//! CSR kernel directly on host memory. Every capability tier shares this
//! kernel, which is what makes the tiers numerically interchangeable.

use super::client::CpuClient;
use super::runtime::CpuRuntime;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::matrix::{CsrMatrix, DenseMatrix, IndexWidth, Storage, StorageOrder};
use crate::runtime::blas::{DenseOperand, Operation, SparseBlas, SpmmAlg, SpmmCapability};
use crate::runtime::RuntimeClient;

/// Host sparse matrix descriptor
#[derive(Debug)]
pub struct HostSpMat {
    rows: usize,
    cols: usize,
    row_ptrs: u64,
    col_indices: u64,
    values: u64,
    dtype: DType,
}

/// Host dense matrix descriptor
#[derive(Debug)]
pub struct HostDnMat(DenseOperand);

/// Element strides of a dense operand derived from its order and leading
/// dimension
fn operand_strides(op: &DenseOperand) -> [isize; 2] {
    match op.order {
        StorageOrder::RowMajor => [op.ld as isize, 1],
        StorageOrder::ColumnMajor => [1, op.ld as isize],
    }
}

/// Scale one row of C by beta, then accumulate `alpha * A[i, :] @ op(B)`
///
/// # Safety
/// All pointers must address valid host buffers consistent with `n`, the
/// row-pointer slice at `i`, and the given strides.
unsafe fn scale_and_accumulate_row<T: Element>(
    i: usize,
    n: usize,
    beta_is_zero: bool,
    beta: T,
    alpha: T,
    row_ptrs: *const i32,
    col_indices: *const i32,
    values: *const T,
    b: *const T,
    b_strides: [isize; 2],
    c: *mut T,
    c_strides: [isize; 2],
) {
    let row = i as isize * c_strides[0];
    for j in 0..n {
        let cij = c.offset(row + j as isize * c_strides[1]);
        // BLAS convention: beta == 0 overwrites, so uninitialized output
        // never contaminates the result
        *cij = if beta_is_zero { T::zero() } else { beta * *cij };
    }

    let start = *row_ptrs.add(i) as usize;
    let end = *row_ptrs.add(i + 1) as usize;
    for p in start..end {
        let k = *col_indices.add(p) as isize;
        let scaled = alpha * *values.add(p);
        for j in 0..n {
            let cij = c.offset(row + j as isize * c_strides[1]);
            let bkj = *b.offset(k * b_strides[0] + j as isize * b_strides[1]);
            *cij = *cij + scaled * bkj;
        }
    }
}

/// CSR × dense multiply-accumulate worker: `C = alpha * A @ B + beta * C`
///
/// Rows of C are independent, so the outer loop parallelizes over them.
///
/// # Safety
/// See [`scale_and_accumulate_row`]; additionally `row_ptrs` must hold
/// `m + 1` entries.
#[allow(clippy::too_many_arguments)]
unsafe fn addmm_csr_dense_worker<T: Element>(
    m: usize,
    n: usize,
    beta: T,
    alpha: T,
    row_ptrs: *const i32,
    col_indices: *const i32,
    values: *const T,
    b: *const T,
    b_strides: [isize; 2],
    c: *mut T,
    c_strides: [isize; 2],
) {
    let beta_is_zero = beta.to_f64() == 0.0;

    #[cfg(feature = "rayon")]
    {
        if m > 1 {
            use rayon::prelude::*;
            let rp_addr = row_ptrs as usize;
            let ci_addr = col_indices as usize;
            let va_addr = values as usize;
            let b_addr = b as usize;
            let c_addr = c as usize;
            (0..m).into_par_iter().for_each(|i| unsafe {
                scale_and_accumulate_row::<T>(
                    i,
                    n,
                    beta_is_zero,
                    beta,
                    alpha,
                    rp_addr as *const i32,
                    ci_addr as *const i32,
                    va_addr as *const T,
                    b_addr as *const T,
                    b_strides,
                    c_addr as *mut T,
                    c_strides,
                );
            });
            return;
        }
    }

    for i in 0..m {
        scale_and_accumulate_row::<T>(
            i,
            n,
            beta_is_zero,
            beta,
            alpha,
            row_ptrs,
            col_indices,
            values,
            b,
            b_strides,
            c,
            c_strides,
        );
    }
}

impl SparseBlas<CpuRuntime> for CpuClient {
    type SpMat = HostSpMat;
    type DnMat = HostDnMat;

    fn spmm_capability(&self) -> SpmmCapability {
        self.capability
    }

    fn csr_with_i32_indices(
        &self,
        mat: &CsrMatrix<CpuRuntime>,
    ) -> Result<CsrMatrix<CpuRuntime>> {
        if mat.index_width() == IndexWidth::I32 {
            return Ok(mat.clone());
        }

        let narrow = |buf: &Storage<CpuRuntime>| -> Result<Storage<CpuRuntime>> {
            let wide: Vec<i64> = buf.to_vec();
            let narrow: Vec<i32> = wide
                .iter()
                .map(|&x| {
                    i32::try_from(x).map_err(|_| {
                        Error::Internal(format!(
                            "sparse index {} exceeds the 32-bit range required by the primitive",
                            x
                        ))
                    })
                })
                .collect::<Result<_>>()?;
            Storage::from_slice(&narrow, self.device())
        };

        CsrMatrix::new(
            narrow(mat.row_ptrs())?,
            narrow(mat.col_indices())?,
            mat.values().clone(),
            mat.shape(),
        )
    }

    fn csr_descriptor(&self, mat: &CsrMatrix<CpuRuntime>) -> Result<HostSpMat> {
        if mat.index_width() != IndexWidth::I32 {
            return Err(Error::Internal(
                "sparse descriptor requires 32-bit indices".to_string(),
            ));
        }
        Ok(HostSpMat {
            rows: mat.rows(),
            cols: mat.cols(),
            row_ptrs: mat.row_ptrs().ptr(),
            col_indices: mat.col_indices().ptr(),
            values: mat.values().ptr(),
            dtype: mat.dtype(),
        })
    }

    fn dense_descriptor(&self, operand: DenseOperand) -> Result<HostDnMat> {
        Ok(HostDnMat(operand))
    }

    fn spmm_buffer_size<T: Element>(
        &self,
        _op_a: Operation,
        _op_b: Operation,
        _alpha: T,
        a: &HostSpMat,
        _b: &HostDnMat,
        _beta: T,
        _c: &HostDnMat,
        _alg: SpmmAlg,
    ) -> Result<usize> {
        // Per-row scratch, mirroring how vendor kernels size their workspace
        Ok(a.rows * std::mem::size_of::<T>())
    }

    fn spmm<T: Element>(
        &self,
        op_a: Operation,
        op_b: Operation,
        alpha: T,
        a: &HostSpMat,
        b: &HostDnMat,
        beta: T,
        c: &HostDnMat,
        _alg: SpmmAlg,
        _workspace: u64,
    ) -> Result<()> {
        if op_a != Operation::NonTranspose {
            return Err(Error::primitive("spmm", "STATUS_NOT_SUPPORTED"));
        }

        let (bk, bn, b_strides) = {
            let strides = operand_strides(&b.0);
            match op_b {
                Operation::NonTranspose => (b.0.rows, b.0.cols, strides),
                Operation::Transpose => (b.0.cols, b.0.rows, [strides[1], strides[0]]),
            }
        };

        if bk != a.cols || c.0.rows != a.rows || c.0.cols != bn {
            return Err(Error::primitive("spmm", "STATUS_INVALID_VALUE"));
        }
        if a.dtype != b.0.dtype || a.dtype != c.0.dtype || a.dtype != T::DTYPE {
            return Err(Error::primitive("spmm", "STATUS_INVALID_VALUE"));
        }

        let c_strides = operand_strides(&c.0);
        unsafe {
            addmm_csr_dense_worker::<T>(
                a.rows,
                bn,
                beta,
                alpha,
                a.row_ptrs as *const i32,
                a.col_indices as *const i32,
                a.values as *const T,
                b.0.ptr as *const T,
                b_strides,
                c.0.ptr as *mut T,
                c_strides,
            );
        }
        Ok(())
    }

    fn spmm_legacy<T: Element>(
        &self,
        _nnz: usize,
        m: usize,
        n: usize,
        k: usize,
        beta: T,
        alpha: T,
        row_ptrs: &Storage<CpuRuntime>,
        col_indices: &Storage<CpuRuntime>,
        values: &Storage<CpuRuntime>,
        b: &DenseMatrix<CpuRuntime>,
        c: &DenseMatrix<CpuRuntime>,
    ) -> Result<()> {
        if row_ptrs.dtype() != DType::I32 || col_indices.dtype() != DType::I32 {
            return Err(Error::primitive("spmm_legacy", "STATUS_INVALID_VALUE"));
        }
        if b.shape() != [k, n] || c.shape() != [m, n] {
            return Err(Error::primitive("spmm_legacy", "STATUS_INVALID_VALUE"));
        }
        if values.dtype() != b.dtype() || values.dtype() != c.dtype() {
            return Err(Error::primitive("spmm_legacy", "STATUS_INVALID_VALUE"));
        }

        // The legacy worker addresses operands through their raw strides and
        // needs no layout negotiation.
        let elem = c.dtype().size_in_bytes() as u64;
        let b_ptr = b.storage().ptr() + b.layout().offset() as u64 * elem;
        let c_ptr = c.storage().ptr() + c.layout().offset() as u64 * elem;
        unsafe {
            addmm_csr_dense_worker::<T>(
                m,
                n,
                beta,
                alpha,
                row_ptrs.ptr() as *const i32,
                col_indices.ptr() as *const i32,
                values.ptr() as *const T,
                b_ptr as *const T,
                b.layout().strides(),
                c_ptr as *mut T,
                c.layout().strides(),
            );
        }
        Ok(())
    }
}
