//! CSR sparse × dense multiply-accumulate
//!
//! Computes `result = alpha * (mat1 @ mat2) + beta * result` where `mat1` is
//! CSR sparse and `mat2`/`result` are dense. The numeric work is delegated
//! to the client's sparse BLAS primitive; this module owns the surrounding
//! decision logic: layout preparation, transpose resolution, index
//! narrowing, capability dispatch, workspace scoping, and result
//! reconciliation.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::matrix::{CsrMatrix, DenseMatrix, Layout, MatrixOrder, StorageOrder};
use crate::runtime::blas::{Operation, SparseBlas, SpmmAlg, SpmmCapability};
use crate::runtime::{Device, Runtime, RuntimeClient, Workspace};

/// Compute `result = alpha * (mat1 @ mat2) + beta * result` in place
///
/// `mat1` is `m × k` CSR sparse; `mat2` is `k × n` dense; `result` is
/// `m × n` dense and is the only caller-owned storage this call mutates.
/// Dense operands in canonical row-major or column-major order (including
/// padded leading dimensions) are used without copying; any other stride
/// pattern is transparently staged through a contiguous copy. Mixed
/// majorness between `mat2` and `result` is reconciled by flipping the
/// primitive's transpose flag rather than moving data.
///
/// # Errors
///
/// - `UnsupportedDType` for element types outside {f32, f64, f16, bf16,
///   c64, c128}, raised before any device work
/// - `Primitive` when the backend primitive reports a non-success status
/// - `OutOfMemory` when the scratch buffer cannot be acquired
///
/// All errors abort the call; nothing is retried or downgraded.
pub fn spmm_accumulate<R, B>(
    client: &B,
    mat1: &CsrMatrix<R>,
    mat2: &DenseMatrix<R>,
    beta: f64,
    alpha: f64,
    result: &mut DenseMatrix<R>,
) -> Result<()>
where
    R: Runtime,
    B: SparseBlas<R>,
{
    let [m, k] = mat1.shape();
    let n = mat2.cols();
    if mat2.rows() != k {
        return Err(Error::shape_mismatch(&[k, n], &mat2.shape()));
    }
    if result.shape() != [m, n] {
        return Err(Error::shape_mismatch(&[m, n], &result.shape()));
    }
    if mat1.dtype() != mat2.dtype() {
        return Err(Error::DTypeMismatch {
            lhs: mat1.dtype(),
            rhs: mat2.dtype(),
        });
    }
    if mat1.dtype() != result.dtype() {
        return Err(Error::DTypeMismatch {
            lhs: mat1.dtype(),
            rhs: result.dtype(),
        });
    }
    if !mat1.device().is_same(mat2.device()) || !mat1.device().is_same(result.device()) {
        return Err(Error::DeviceMismatch);
    }

    let dtype = result.dtype();
    let cap = client.spmm_capability();

    crate::dispatch_float_complex!(dtype, T => {
        let alpha = T::from_f64(alpha);
        let beta = T::from_f64(beta);
        if cap.generic_api {
            spmm_generic::<R, B, T>(client, cap, mat1, mat2, beta, alpha, result)
        } else {
            spmm_legacy::<R, B, T>(client, mat1, mat2, beta, alpha, result)
        }
    }, "spmm_accumulate")
}

/// Generic-API path: layout negotiation, descriptors, scoped workspace
fn spmm_generic<R, B, T>(
    client: &B,
    cap: SpmmCapability,
    mat1: &CsrMatrix<R>,
    mat2: &DenseMatrix<R>,
    beta: T,
    alpha: T,
    result: &mut DenseMatrix<R>,
) -> Result<()>
where
    R: Runtime,
    B: SparseBlas<R>,
    T: Element,
{
    let (result_work, result_copied) = prepare_dense_matrix(result, cap)?;
    let (mat2_work, _mat2_copied) = prepare_dense_matrix(mat2, cap)?;

    // For mixed majorness we cast mat2 to the order of result without a
    // copy: a column-major matrix read as row-major is exactly its
    // transpose, so presenting the transposed view and flipping the
    // transpose flag leaves the numerics unchanged. The sparse operand is
    // always non-transposed.
    let transpose_b = resolve_transpose(result_work.layout(), mat2_work.layout());
    let (op_b, mat2_view) = if transpose_b {
        (Operation::Transpose, mat2_work.transposed())
    } else {
        (Operation::NonTranspose, mat2_work.clone())
    };

    // The primitive is driven with 32-bit indices on every tier.
    // TODO: revisit once wider index support is wired through the backends
    let mat1_32 = client.csr_with_i32_indices(mat1)?;

    let desc_a = client.csr_descriptor(&mat1_32)?;
    let desc_b = client.dense_descriptor(mat2_view.blas_operand()?)?;
    let desc_c = client.dense_descriptor(result_work.blas_operand()?)?;

    let alg = if cap.csr_alg2 {
        SpmmAlg::CsrAlg2
    } else {
        SpmmAlg::Default
    };

    let buffer_size = client.spmm_buffer_size::<T>(
        Operation::NonTranspose,
        op_b,
        alpha,
        &desc_a,
        &desc_b,
        beta,
        &desc_c,
        alg,
    )?;
    let workspace = Workspace::acquire(client.allocator(), buffer_size)?;
    client.spmm::<T>(
        Operation::NonTranspose,
        op_b,
        alpha,
        &desc_a,
        &desc_b,
        beta,
        &desc_c,
        alg,
        workspace.ptr(),
    )?;
    drop(workspace);

    if result_copied {
        result_work.copy_into(result)?;
    }
    Ok(())
}

/// Legacy path: narrow indices and hand everything to the fixed worker
fn spmm_legacy<R, B, T>(
    client: &B,
    mat1: &CsrMatrix<R>,
    mat2: &DenseMatrix<R>,
    beta: T,
    alpha: T,
    result: &mut DenseMatrix<R>,
) -> Result<()>
where
    R: Runtime,
    B: SparseBlas<R>,
    T: Element,
{
    let [m, k] = mat1.shape();
    let n = mat2.cols();
    let mat1_32 = client.csr_with_i32_indices(mat1)?;
    client.spmm_legacy::<T>(
        mat1.nnz(),
        m,
        n,
        k,
        beta,
        alpha,
        mat1_32.row_ptrs(),
        mat1_32.col_indices(),
        mat1_32.values(),
        mat2,
        result,
    )
}

/// Borrow a dense matrix if its layout is usable by the primitive, or stage
/// it through a contiguous copy
///
/// Returns the matrix to operate on and whether a copy was made. On tiers
/// without row-major support only column-major layouts pass through; the
/// staging copy is then column-major as well.
pub(crate) fn prepare_dense_matrix<R: Runtime>(
    matrix: &DenseMatrix<R>,
    cap: SpmmCapability,
) -> Result<(DenseMatrix<R>, bool)> {
    if cap.row_major_layout {
        match matrix.classify() {
            MatrixOrder::RowMajor | MatrixOrder::ColumnMajor => Ok((matrix.clone(), false)),
            MatrixOrder::Incompatible => {
                Ok((matrix.contiguous_copy(StorageOrder::RowMajor)?, true))
            }
        }
    } else {
        match matrix.classify() {
            MatrixOrder::ColumnMajor => Ok((matrix.clone(), false)),
            _ => Ok((matrix.contiguous_copy(StorageOrder::ColumnMajor)?, true)),
        }
    }
}

/// Decide the transpose flag for the second operand
///
/// True exactly when the prepared result and second operand differ in
/// majorness, judged by their innermost stride.
pub(crate) fn resolve_transpose(result: &Layout, mat2: &Layout) -> bool {
    result.has_unit_column_stride() != mat2.has_unit_column_stride()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::CpuRuntime;

    type M = DenseMatrix<CpuRuntime>;

    fn device() -> crate::runtime::cpu::CpuDevice {
        crate::runtime::cpu::CpuDevice::new()
    }

    #[test]
    fn test_prepare_borrows_compatible_layouts() {
        let dev = device();
        let row_major = M::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3], &dev).unwrap();
        let (prepared, copied) =
            prepare_dense_matrix(&row_major, SpmmCapability::GENERIC_V2).unwrap();
        assert!(!copied);
        assert!(prepared.storage().same_buffer(row_major.storage()));

        let col_major = row_major.transposed();
        let (prepared, copied) =
            prepare_dense_matrix(&col_major, SpmmCapability::GENERIC_V2).unwrap();
        assert!(!copied);
        assert!(prepared.storage().same_buffer(col_major.storage()));

        // Padded leading dimension is BLAS-compatible, not a copy trigger
        let backing = vec![0.0f32; 10];
        let padded =
            M::from_slice_layout(&backing, Layout::new([2, 3], [5, 1], 0), &dev).unwrap();
        let (prepared, copied) =
            prepare_dense_matrix(&padded, SpmmCapability::GENERIC_V2).unwrap();
        assert!(!copied);
        assert!(prepared.storage().same_buffer(padded.storage()));
    }

    #[test]
    fn test_prepare_copies_incompatible_layouts() {
        let dev = device();
        // Every-other-column view over a 2x6 buffer: no unit stride
        let backing: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let layout = Layout::new([2, 3], [6, 2], 0);
        let strided = M::from_slice_layout(&backing, layout, &dev).unwrap();
        assert_eq!(strided.classify(), MatrixOrder::Incompatible);

        let (prepared, copied) =
            prepare_dense_matrix(&strided, SpmmCapability::GENERIC_V2).unwrap();
        assert!(copied);
        assert!(!prepared.storage().same_buffer(strided.storage()));
        assert_eq!(prepared.classify(), MatrixOrder::RowMajor);
        assert_eq!(
            prepared.to_row_major_vec::<f32>(),
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]
        );
    }

    #[test]
    fn test_prepare_without_row_major_support() {
        let dev = device();
        let row_major = M::from_slice(&[1.0f32, 2.0, 3.0, 4.0], [2, 2], &dev).unwrap();
        // Row-major input is treated as incompatible on this tier
        let (prepared, copied) =
            prepare_dense_matrix(&row_major, SpmmCapability::GENERIC_V1).unwrap();
        assert!(copied);
        assert_eq!(prepared.classify(), MatrixOrder::ColumnMajor);
        assert_eq!(
            prepared.to_row_major_vec::<f32>(),
            row_major.to_row_major_vec::<f32>()
        );

        let col_major = row_major.transposed();
        let (_, copied) = prepare_dense_matrix(&col_major, SpmmCapability::GENERIC_V1).unwrap();
        assert!(!copied);
    }

    #[test]
    fn test_resolve_transpose_truth_table() {
        let row = Layout::row_major([2, 3]);
        let col = Layout::column_major([2, 3]);
        assert!(!resolve_transpose(&row, &row));
        assert!(!resolve_transpose(&col, &col));
        assert!(resolve_transpose(&row, &col));
        assert!(resolve_transpose(&col, &row));
    }
}
