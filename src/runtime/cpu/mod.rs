//! Host runtime implementation
//!
//! The host backend serves two roles: the default runtime on machines
//! without a GPU, and the reference sparse BLAS primitive that the
//! integration tests validate the negotiation logic against. Its client can
//! be constructed at any capability tier, so the legacy and both generic
//! code paths are all exercisable without vendor hardware.

mod blas;
mod client;
mod device;
mod runtime;

pub use blas::{HostDnMat, HostSpMat};
pub use client::{CpuAllocator, CpuClient};
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
