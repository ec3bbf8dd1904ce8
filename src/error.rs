//! Error types for csrmm

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using csrmm's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in csrmm operations
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch between operands
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// DType requires a crate feature that is not enabled
    #[error("DType {dtype:?} requires the '{feature}' feature")]
    FeatureRequired {
        /// The dtype that needs the feature
        dtype: DType,
        /// The required feature name
        feature: &'static str,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Device mismatch between operands
    #[error("Device mismatch: operands must be on the same device")]
    DeviceMismatch,

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// A sparse BLAS primitive returned a non-success status
    #[error("Sparse BLAS call '{call}' returned status {status}")]
    Primitive {
        /// Name of the failing primitive entry point
        call: &'static str,
        /// The status code, formatted verbatim
        status: String,
    },

    /// CUDA driver error
    #[cfg(feature = "cuda")]
    #[error("CUDA error: {0}")]
    Cuda(#[from] cudarc::driver::DriverError),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create a primitive status error from any debug-printable status
    pub fn primitive(call: &'static str, status: impl std::fmt::Debug) -> Self {
        Self::Primitive {
            call,
            status: format!("{:?}", status),
        }
    }
}
