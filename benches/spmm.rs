use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use csrmm::dtype::DType;
use csrmm::matrix::{CsrMatrix, DenseMatrix};
use csrmm::ops::spmm_accumulate;
use csrmm::runtime::cpu::{CpuDevice, CpuRuntime};
use csrmm::runtime::Runtime;

/// Tridiagonal sparse matrix of the given size
fn banded_csr(size: usize, device: &CpuDevice) -> CsrMatrix<CpuRuntime> {
    let mut row_ptrs = vec![0i64];
    let mut col_indices = Vec::new();
    let mut values = Vec::new();
    for i in 0..size {
        for j in i.saturating_sub(1)..(i + 2).min(size) {
            col_indices.push(j as i64);
            values.push(if i == j { 2.0f32 } else { -1.0 });
        }
        row_ptrs.push(col_indices.len() as i64);
    }
    CsrMatrix::from_slices(&row_ptrs, &col_indices, &values, [size, size], device).unwrap()
}

fn dense_f32(rows: usize, cols: usize, device: &CpuDevice) -> DenseMatrix<CpuRuntime> {
    let data: Vec<f32> = (0..rows * cols)
        .map(|i| ((i * 17 + 3) % 1000) as f32 / 1000.0)
        .collect();
    DenseMatrix::from_slice(&data, [rows, cols], device).unwrap()
}

fn bench_spmm(criterion: &mut Criterion) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);

    let mut group = criterion.benchmark_group("spmm_accumulate_f32");
    for size in [64usize, 256, 1024] {
        let a = banded_csr(size, &device);
        let b = dense_f32(size, 32, &device);
        group.bench_function(format!("tridiag_{size}x{size}_n32"), |bencher| {
            bencher.iter(|| {
                let mut c = DenseMatrix::zeros([size, 32], DType::F32, &device).unwrap();
                spmm_accumulate(&client, &a, &b, 0.0, 1.0, &mut c).unwrap();
                black_box(c)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_spmm);
criterion_main!(benches);
