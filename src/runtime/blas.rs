//! Vendor sparse BLAS primitive boundary
//!
//! The multiply itself is delegated to an external sparse BLAS primitive.
//! This module specifies that primitive at its interface boundary: opaque
//! descriptors, a capability report, a workspace size query, the compute
//! entry point, and a legacy fixed-algorithm worker. Every status a backend
//! receives from the underlying library is checked and converted into this
//! crate's error taxonomy before it crosses this boundary.

use super::{Runtime, RuntimeClient};
use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::matrix::{CsrMatrix, DenseMatrix, Storage, StorageOrder};

/// Capability report of a sparse BLAS backend
///
/// Fixed per backend construction; read once per call to select the code
/// path. The two paths must produce numerically equivalent results: the
/// choice is a capability concern, never a behavioral one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpmmCapability {
    /// The generic descriptor-based API is available
    pub generic_api: bool,
    /// Dense operands may be described in row-major order
    pub row_major_layout: bool,
    /// The CSR-specific algorithm identifier is available
    pub csr_alg2: bool,
}

impl SpmmCapability {
    /// Oldest tier: no generic API; calls route to the legacy worker
    pub const LEGACY: Self = Self {
        generic_api: false,
        row_major_layout: false,
        csr_alg2: false,
    };

    /// First generic-API revision: column-major only, default algorithm
    pub const GENERIC_V1: Self = Self {
        generic_api: true,
        row_major_layout: false,
        csr_alg2: false,
    };

    /// Current generic API: row-major support and the CSR algorithm
    pub const GENERIC_V2: Self = Self {
        generic_api: true,
        row_major_layout: true,
        csr_alg2: true,
    };
}

/// Transpose operation applied to an operand by the primitive
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Use the operand as described
    NonTranspose,
    /// Use the transpose of the operand
    Transpose,
}

/// Algorithm identifier passed to the generic-API compute entry point
///
/// One algorithm per capability tier, never per element type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpmmAlg {
    /// Library-selected default
    Default,
    /// CSR-specialized algorithm (deterministic, available on newer tiers)
    CsrAlg2,
}

/// Backend-neutral description of a dense operand
///
/// Carries everything a backend needs to build its opaque dense descriptor:
/// base pointer, extents, leading dimension, and storage order.
#[derive(Copy, Clone, Debug)]
pub struct DenseOperand {
    /// Base device pointer of the first logical element
    pub ptr: u64,
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Leading dimension: stride between consecutive rows (row-major) or
    /// columns (column-major)
    pub ld: usize,
    /// Storage order
    pub order: StorageOrder,
    /// Element type
    pub dtype: DType,
}

/// Sparse BLAS backend: the external primitive behind the multiply
///
/// Descriptors are constructed fresh per call and never cached. The generic
/// methods are only invoked with element types accepted by the type
/// dispatcher, so backends may assume a supported `T`.
pub trait SparseBlas<R: Runtime>: RuntimeClient<R> {
    /// Opaque sparse matrix descriptor
    type SpMat;
    /// Opaque dense matrix descriptor
    type DnMat;

    /// Report which API generation this backend implements
    fn spmm_capability(&self) -> SpmmCapability;

    /// Return a CSR matrix whose index buffers are 32-bit
    ///
    /// Shares the source buffers when they are already 32-bit; otherwise
    /// makes width-converted copies owned by the returned matrix. The
    /// caller's matrix is never modified.
    fn csr_with_i32_indices(&self, mat: &CsrMatrix<R>) -> Result<CsrMatrix<R>>;

    /// Build the sparse operand descriptor
    ///
    /// The matrix must carry 32-bit indices.
    fn csr_descriptor(&self, mat: &CsrMatrix<R>) -> Result<Self::SpMat>;

    /// Build a dense operand descriptor
    fn dense_descriptor(&self, operand: DenseOperand) -> Result<Self::DnMat>;

    /// Query the workspace size in bytes required by the compute call
    #[allow(clippy::too_many_arguments)]
    fn spmm_buffer_size<T: Element>(
        &self,
        op_a: Operation,
        op_b: Operation,
        alpha: T,
        a: &Self::SpMat,
        b: &Self::DnMat,
        beta: T,
        c: &Self::DnMat,
        alg: SpmmAlg,
    ) -> Result<usize>;

    /// Compute `C = alpha * op(A) @ op(B) + beta * C`
    ///
    /// `workspace` must point to at least the number of bytes reported by
    /// [`SparseBlas::spmm_buffer_size`] for the same arguments.
    #[allow(clippy::too_many_arguments)]
    fn spmm<T: Element>(
        &self,
        op_a: Operation,
        op_b: Operation,
        alpha: T,
        a: &Self::SpMat,
        b: &Self::DnMat,
        beta: T,
        c: &Self::DnMat,
        alg: SpmmAlg,
        workspace: u64,
    ) -> Result<()>;

    /// Legacy fixed-algorithm worker: `C = alpha * A @ B + beta * C`
    ///
    /// Used when the generic API is unavailable. Takes 32-bit index buffers,
    /// performs no descriptor or workspace negotiation, and manages its own
    /// scratch memory.
    #[allow(clippy::too_many_arguments)]
    fn spmm_legacy<T: Element>(
        &self,
        nnz: usize,
        m: usize,
        n: usize,
        k: usize,
        beta: T,
        alpha: T,
        row_ptrs: &Storage<R>,
        col_indices: &Storage<R>,
        values: &Storage<R>,
        b: &DenseMatrix<R>,
        c: &DenseMatrix<R>,
    ) -> Result<()>;
}
