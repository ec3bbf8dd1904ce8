//! CUDA runtime implementation
//!
//! GPU backend via NVIDIA CUDA using cudarc, with the multiply delegated to
//! the cuSPARSE generic API.
//!
//! # Panics
//!
//! `Runtime::default_client` panics if the CUDA context, stream, or
//! cuSPARSE handle cannot be created; construct [`CudaClient`] directly to
//! handle initialization errors. Memory and compute errors after
//! initialization are reported through `Result`.

mod blas;
mod client;
mod cusparse;
mod device;
mod kernels;
mod runtime;

pub use client::{CudaAllocator, CudaClient};
pub use cusparse::{CsrDescriptor, CudaSparse, DnMatDescriptor};
pub use device::{CudaDevice, CudaError};
pub use runtime::CudaRuntime;
