//! CUDA device identification

use crate::runtime::Device;
use thiserror::Error;

/// A single CUDA GPU device, identified by its ordinal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CudaDevice {
    /// Index of the GPU device (0, 1, 2, ...)
    pub(crate) index: usize,
}

impl CudaDevice {
    /// Create a new CUDA device handle
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Device ordinal
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Device for CudaDevice {
    fn id(&self) -> usize {
        self.index
    }

    fn name(&self) -> String {
        format!("cuda:{}", self.index)
    }
}

/// Errors raised by the CUDA backend internals
#[derive(Error, Debug)]
pub enum CudaError {
    /// Driver or context level failure
    #[error("CUDA device error: {0}")]
    DeviceError(String),

    /// cuSPARSE returned a non-success status
    #[error("cuSPARSE error: {0}")]
    CusparseError(String),
}
