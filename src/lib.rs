//! # csrmm
//!
//! **CSR sparse × dense matrix multiply-accumulate with layout negotiation.**
//!
//! csrmm implements one fused operation,
//! `result = alpha * (A @ B) + beta * result`, where `A` is a CSR sparse
//! matrix and `B`/`result` are dense matrices in row-major or column-major
//! order with BLAS-compatible strides. The multiply itself is delegated to a
//! sparse BLAS backend; this crate owns the decision logic around it:
//!
//! - **Layout classification**: dense operands already in a canonical layout
//!   are used as-is; anything else is transparently copied and, for the
//!   result, copied back afterwards.
//! - **Transpose resolution**: mixed row-major/column-major operand pairs are
//!   reconciled by flipping a transpose flag instead of copying data.
//! - **Capability dispatch**: backends report which API generation they
//!   implement; the legacy tier routes to a fixed-algorithm worker, the
//!   generic tiers negotiate descriptors, algorithms, and scratch space.
//! - **Type dispatch**: floating point, complex, and reduced-precision
//!   element types share a single code path; everything else fails fast.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csrmm::prelude::*;
//!
//! let device = CpuDevice::new();
//! let client = CpuRuntime::default_client(&device);
//!
//! let a = CsrMatrix::<CpuRuntime>::from_slices(&[0, 1, 2], &[0, 1], &[1.0f32, 1.0], [2, 2], &device)?;
//! let b = DenseMatrix::<CpuRuntime>::from_slice(&[1.0f32; 4], [2, 2], &device)?;
//! let mut c = DenseMatrix::<CpuRuntime>::zeros([2, 2], DType::F32, &device)?;
//!
//! spmm_accumulate(&client, &a, &b, 0.0, 1.0, &mut c)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `f16` (default): half-precision element types (F16, BF16)
//! - `rayon` (default): multi-threaded host worker loops
//! - `cuda`: NVIDIA cuSPARSE backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod matrix;
pub mod ops;
pub mod runtime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::matrix::{CsrMatrix, DenseMatrix, Layout, MatrixOrder, StorageOrder};
    pub use crate::ops::spmm_accumulate;
    pub use crate::runtime::cpu::{CpuDevice, CpuRuntime};
    pub use crate::runtime::{Device, Runtime, RuntimeClient, SparseBlas, SpmmCapability};

    #[cfg(feature = "cuda")]
    pub use crate::runtime::cuda::{CudaDevice, CudaRuntime};
}
