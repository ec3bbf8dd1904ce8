//! Integration tests for the sparse × dense multiply-accumulate operation
//!
//! All tests run against the host backend, which implements every
//! capability tier of the sparse BLAS boundary, so the legacy and both
//! generic code paths are exercised and checked against a dense reference.

use csrmm::dtype::{Complex64, DType};
use csrmm::error::{Error, Result};
use csrmm::matrix::{CsrMatrix, DenseMatrix, Layout, MatrixOrder, StorageOrder};
use csrmm::ops::spmm_accumulate;
use csrmm::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use csrmm::runtime::SpmmCapability;

type Dense = DenseMatrix<CpuRuntime>;
type Csr = CsrMatrix<CpuRuntime>;

const TIERS: [SpmmCapability; 3] = [
    SpmmCapability::GENERIC_V2,
    SpmmCapability::GENERIC_V1,
    SpmmCapability::LEGACY,
];

fn client_at(tier: SpmmCapability) -> CpuClient {
    CpuClient::with_capability(CpuDevice::new(), tier)
}

/// Deterministic pseudo-random fill
fn fill(len: usize, seed: usize) -> Vec<f64> {
    (0..len)
        .map(|i| (((i * 31 + seed * 17 + 3) % 13) as f64) - 6.0)
        .collect()
}

/// Convert a row-major dense matrix to CSR form, dropping exact zeros
fn csr_from_dense(data: &[f64], shape: [usize; 2], device: &CpuDevice) -> Result<Csr> {
    let [rows, cols] = shape;
    let mut row_ptrs = vec![0i64];
    let mut col_indices = Vec::new();
    let mut values = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            let v = data[i * cols + j];
            if v != 0.0 {
                col_indices.push(j as i64);
                values.push(v);
            }
        }
        row_ptrs.push(col_indices.len() as i64);
    }
    Csr::from_slices(&row_ptrs, &col_indices, &values, shape, device)
}

/// Build a dense matrix holding `data` (given row-major) in the requested
/// storage order
fn dense_in_order(
    data: &[f64],
    shape: [usize; 2],
    order: StorageOrder,
    device: &CpuDevice,
) -> Result<Dense> {
    let [rows, cols] = shape;
    match order {
        StorageOrder::RowMajor => Dense::from_slice(data, shape, device),
        StorageOrder::ColumnMajor => {
            let mut backing = vec![0.0f64; rows * cols];
            for i in 0..rows {
                for j in 0..cols {
                    backing[j * rows + i] = data[i * cols + j];
                }
            }
            Dense::from_slice_layout(&backing, Layout::column_major(shape), device)
        }
    }
}

/// Dense reference: `alpha * (A @ B) + beta * C`, all row-major
fn dense_reference(
    a: &[f64],
    b: &[f64],
    c: &[f64],
    m: usize,
    k: usize,
    n: usize,
    alpha: f64,
    beta: f64,
) -> Vec<f64> {
    let mut out = vec![0.0f64; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0;
            for p in 0..k {
                acc += a[i * k + p] * b[p * n + j];
            }
            out[i * n + j] = alpha * acc + beta * c[i * n + j];
        }
    }
    out
}

fn assert_allclose(got: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(got.len(), expected.len());
    for (idx, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
        assert!(
            (g - e).abs() <= tol,
            "mismatch at {}: got {}, expected {}",
            idx,
            g,
            e
        );
    }
}

#[test]
fn test_csr_identity_times_ones() -> Result<()> {
    let device = CpuDevice::new();
    let client = client_at(SpmmCapability::GENERIC_V2);

    let a = Csr::from_slices(&[0, 1, 2], &[0, 1], &[1.0f64, 1.0], [2, 2], &device)?;
    let b = Dense::from_slice(&[1.0f64; 4], [2, 2], &device)?;
    let mut c = Dense::zeros([2, 2], DType::F64, &device)?;

    spmm_accumulate(&client, &a, &b, 0.0, 1.0, &mut c)?;
    assert_eq!(c.to_row_major_vec::<f64>(), vec![1.0; 4]);
    Ok(())
}

#[test]
fn test_all_layout_combinations_match_reference() -> Result<()> {
    let device = CpuDevice::new();
    let (m, k, n) = (4, 5, 3);
    let a_data = fill(m * k, 1);
    let b_data = fill(k * n, 2);
    let c_data = fill(m * n, 3);
    let (alpha, beta) = (0.5, 2.0);
    let expected = dense_reference(&a_data, &b_data, &c_data, m, k, n, alpha, beta);

    let orders = [StorageOrder::RowMajor, StorageOrder::ColumnMajor];
    for tier in TIERS {
        let client = client_at(tier);
        for b_order in orders {
            for c_order in orders {
                let a = csr_from_dense(&a_data, [m, k], &device)?;
                let b = dense_in_order(&b_data, [k, n], b_order, &device)?;
                let mut c = dense_in_order(&c_data, [m, n], c_order, &device)?;

                spmm_accumulate(&client, &a, &b, beta, alpha, &mut c)?;
                assert_allclose(&c.to_row_major_vec::<f64>(), &expected, 1e-12);
            }
        }
    }
    Ok(())
}

#[test]
fn test_beta_one_alpha_zero_is_idempotent() -> Result<()> {
    let device = CpuDevice::new();
    let (m, k, n) = (3, 4, 2);
    let a = csr_from_dense(&fill(m * k, 4), [m, k], &device)?;
    let b = Dense::from_slice(&fill(k * n, 5), [k, n], &device)?;
    let c_data = fill(m * n, 6);
    let mut c = Dense::from_slice(&c_data, [m, n], &device)?;

    for tier in TIERS {
        let client = client_at(tier);
        spmm_accumulate(&client, &a, &b, 1.0, 0.0, &mut c)?;
        spmm_accumulate(&client, &a, &b, 1.0, 0.0, &mut c)?;
        assert_eq!(c.to_row_major_vec::<f64>(), c_data);
    }
    Ok(())
}

#[test]
fn test_incompatible_result_layout_round_trips() -> Result<()> {
    let device = CpuDevice::new();
    let (m, k, n) = (2, 3, 3);
    let a_data = fill(m * k, 7);
    let b_data = fill(k * n, 8);
    let a = csr_from_dense(&a_data, [m, k], &device)?;
    let b = Dense::from_slice(&b_data, [k, n], &device)?;

    // Result is an every-other-element view over a larger buffer: no unit
    // stride in either axis, so the copy-and-reconcile path must run.
    let backing: Vec<f64> = (0..2 * m * n).map(|v| 100.0 + v as f64).collect();
    let layout = Layout::new([m, n], [(2 * n) as isize, 2], 0);
    let mut c = Dense::from_slice_layout(&backing, layout, &device)?;
    assert_eq!(c.classify(), MatrixOrder::Incompatible);

    let c_initial = c.to_row_major_vec::<f64>();
    let expected = dense_reference(&a_data, &b_data, &c_initial, m, k, n, 1.0, 1.0);

    let client = client_at(SpmmCapability::GENERIC_V2);
    spmm_accumulate(&client, &a, &b, 1.0, 1.0, &mut c)?;
    assert_allclose(&c.to_row_major_vec::<f64>(), &expected, 1e-12);

    // Storage between the logical elements is untouched by the write-back
    let raw: Vec<f64> = c.storage().to_vec();
    assert_eq!(raw[1], 101.0);
    assert_eq!(raw[3], 103.0);
    Ok(())
}

#[test]
fn test_empty_sparse_matrix_scales_result() -> Result<()> {
    let device = CpuDevice::new();
    let (m, k, n) = (3, 2, 2);
    let a = Csr::from_slices(&[0, 0, 0, 0], &[], &[] as &[f64], [m, k], &device)?;
    let b = Dense::from_slice(&fill(k * n, 9), [k, n], &device)?;
    let c_data = fill(m * n, 10);

    for tier in TIERS {
        let client = client_at(tier);
        let mut c = Dense::from_slice(&c_data, [m, n], &device)?;
        spmm_accumulate(&client, &a, &b, 0.5, 1.0, &mut c)?;
        let expected: Vec<f64> = c_data.iter().map(|v| 0.5 * v).collect();
        assert_allclose(&c.to_row_major_vec::<f64>(), &expected, 1e-12);
    }
    Ok(())
}

#[test]
fn test_integer_dtype_fails_fast() -> Result<()> {
    let device = CpuDevice::new();
    let client = client_at(SpmmCapability::GENERIC_V2);

    let a = Csr::from_slices(&[0, 1], &[0], &[1i32], [1, 1], &device)?;
    let b = Dense::from_slice(&[1i32], [1, 1], &device)?;
    let mut c = Dense::from_slice(&[0i32], [1, 1], &device)?;

    match spmm_accumulate(&client, &a, &b, 0.0, 1.0, &mut c) {
        Err(Error::UnsupportedDType { dtype, op }) => {
            assert_eq!(dtype, DType::I32);
            assert_eq!(op, "spmm_accumulate");
        }
        other => panic!("expected UnsupportedDType, got {:?}", other),
    }
    // The output was never touched
    assert_eq!(c.to_row_major_vec::<i32>(), vec![0]);
    Ok(())
}

#[test]
fn test_shape_mismatch_is_rejected() -> Result<()> {
    let device = CpuDevice::new();
    let client = client_at(SpmmCapability::GENERIC_V2);

    let a = Csr::from_slices(&[0, 1, 2], &[0, 1], &[1.0f64, 1.0], [2, 2], &device)?;
    let b = Dense::from_slice(&fill(6, 1), [3, 2], &device)?;
    let mut c = Dense::zeros([2, 2], DType::F64, &device)?;

    assert!(matches!(
        spmm_accumulate(&client, &a, &b, 0.0, 1.0, &mut c),
        Err(Error::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_f32_matches_f64_reference() -> Result<()> {
    let device = CpuDevice::new();
    let (m, k, n) = (3, 3, 4);
    let a_data = fill(m * k, 11);
    let b_data = fill(k * n, 12);
    let c_data = fill(m * n, 13);
    let expected = dense_reference(&a_data, &b_data, &c_data, m, k, n, 1.0, -1.0);

    let a32: Vec<f32> = a_data.iter().map(|&v| v as f32).collect();
    let b32: Vec<f32> = b_data.iter().map(|&v| v as f32).collect();
    let c32: Vec<f32> = c_data.iter().map(|&v| v as f32).collect();

    let mut row_ptrs = vec![0i64];
    let mut col_indices = Vec::new();
    let mut values = Vec::new();
    for i in 0..m {
        for j in 0..k {
            if a32[i * k + j] != 0.0 {
                col_indices.push(j as i64);
                values.push(a32[i * k + j]);
            }
        }
        row_ptrs.push(col_indices.len() as i64);
    }
    let a = Csr::from_slices(&row_ptrs, &col_indices, &values, [m, k], &device)?;
    let b = Dense::from_slice(&b32, [k, n], &device)?;
    let mut c = Dense::from_slice(&c32, [m, n], &device)?;

    let client = client_at(SpmmCapability::GENERIC_V2);
    spmm_accumulate(&client, &a, &b, -1.0, 1.0, &mut c)?;

    let got: Vec<f64> = c
        .to_row_major_vec::<f32>()
        .iter()
        .map(|&v| v as f64)
        .collect();
    assert_allclose(&got, &expected, 1e-4);
    Ok(())
}

#[test]
fn test_complex_multiply_accumulate() -> Result<()> {
    let device = CpuDevice::new();
    let client = client_at(SpmmCapability::GENERIC_V2);

    // A = [[i, 0], [0, 2]] in CSR
    let a = Csr::from_slices(
        &[0, 1, 2],
        &[0, 1],
        &[Complex64::new(0.0, 1.0), Complex64::new(2.0, 0.0)],
        [2, 2],
        &device,
    )?;
    // B = [[1+i, 0], [1, 1]]
    let b = Dense::from_slice(
        &[
            Complex64::new(1.0, 1.0),
            Complex64::ZERO,
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
        ],
        [2, 2],
        &device,
    )?;
    let mut c = Dense::zeros([2, 2], DType::Complex64, &device)?;

    spmm_accumulate(&client, &a, &b, 0.0, 1.0, &mut c)?;

    // A @ B = [[i*(1+i), 0], [2, 2]] = [[-1+i, 0], [2, 2]]
    let got = c.to_row_major_vec::<Complex64>();
    assert_eq!(got[0], Complex64::new(-1.0, 1.0));
    assert_eq!(got[1], Complex64::ZERO);
    assert_eq!(got[2], Complex64::new(2.0, 0.0));
    assert_eq!(got[3], Complex64::new(2.0, 0.0));
    Ok(())
}

#[cfg(feature = "f16")]
#[test]
fn test_half_precision_types() -> Result<()> {
    use half::{bf16, f16};

    let device = CpuDevice::new();
    let client = client_at(SpmmCapability::GENERIC_V2);

    // Identity sparse matrix: the multiply must preserve B exactly
    let a16 = Csr::from_slices(
        &[0, 1, 2],
        &[0, 1],
        &[f16::ONE, f16::ONE],
        [2, 2],
        &device,
    )?;
    let b16_data = [
        f16::from_f64(0.5),
        f16::from_f64(1.5),
        f16::from_f64(-2.0),
        f16::from_f64(4.0),
    ];
    let b16 = Dense::from_slice(&b16_data, [2, 2], &device)?;
    let mut c16 = Dense::zeros([2, 2], DType::F16, &device)?;
    spmm_accumulate(&client, &a16, &b16, 0.0, 1.0, &mut c16)?;
    assert_eq!(c16.to_row_major_vec::<f16>(), b16_data);

    let abf = Csr::from_slices(
        &[0, 1, 2],
        &[0, 1],
        &[bf16::ONE, bf16::ONE],
        [2, 2],
        &device,
    )?;
    let bbf_data = [
        bf16::from_f64(1.0),
        bf16::from_f64(-1.0),
        bf16::from_f64(2.0),
        bf16::from_f64(0.25),
    ];
    let bbf = Dense::from_slice(&bbf_data, [2, 2], &device)?;
    let mut cbf = Dense::zeros([2, 2], DType::BF16, &device)?;
    spmm_accumulate(&client, &abf, &bbf, 0.0, 1.0, &mut cbf)?;
    assert_eq!(cbf.to_row_major_vec::<bf16>(), bbf_data);
    Ok(())
}

#[test]
fn test_padded_leading_dimension_used_without_copy() -> Result<()> {
    let device = CpuDevice::new();
    let client = client_at(SpmmCapability::GENERIC_V2);
    let (m, k, n) = (2, 2, 3);
    let a_data = fill(m * k, 14);
    let b_data = fill(k * n, 15);
    let a = csr_from_dense(&a_data, [m, k], &device)?;
    let b = Dense::from_slice(&b_data, [k, n], &device)?;

    // Row-major result with ld = 5 > n: BLAS-compatible, no staging copy
    let backing = vec![0.0f64; m * 5];
    let layout = Layout::new([m, n], [5, 1], 0);
    let mut c = Dense::from_slice_layout(&backing, layout, &device)?;
    assert_eq!(c.classify(), MatrixOrder::RowMajor);

    spmm_accumulate(&client, &a, &b, 0.0, 1.0, &mut c)?;

    let expected = dense_reference(&a_data, &b_data, &vec![0.0; m * n], m, k, n, 1.0, 0.0);
    assert_allclose(&c.to_row_major_vec::<f64>(), &expected, 1e-12);

    // Padding columns beyond ld stay zero
    let raw: Vec<f64> = c.storage().to_vec();
    assert_eq!(raw[3], 0.0);
    assert_eq!(raw[4], 0.0);
    Ok(())
}
