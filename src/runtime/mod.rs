//! Runtime backends for device memory and sparse BLAS dispatch
//!
//! This module defines the `Runtime` trait family and provides
//! implementations for the host backend (always built) and CUDA (behind the
//! `cuda` feature).
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity, static memory primitives)
//! ├── Device (identifies a specific GPU/CPU)
//! ├── Client (dispatches operations, owns stream/handles)
//! ├── Allocator (scratch memory management)
//! └── SparseBlas (the vendor sparse BLAS primitive boundary)
//! ```

mod allocator;
pub mod blas;
mod workspace;

pub mod cpu;

#[cfg(feature = "cuda")]
pub mod cuda;

pub use allocator::{Allocator, DefaultAllocator};
pub use blas::{DenseOperand, Operation, SparseBlas, SpmmAlg, SpmmCapability};
pub use workspace::Workspace;

use crate::error::Result;

/// Core trait for compute backends
///
/// `Runtime` abstracts over different compute devices (CPU, GPU). It uses
/// static dispatch via generics for zero-cost abstraction. Offsets and
/// strides below are in elements; sizes are in bytes.
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier type
    type Device: Device;

    /// Client for dispatching operations
    type Client: RuntimeClient<Self>;

    /// Memory allocator type
    type Allocator: Allocator;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Allocate device memory
    ///
    /// Returns a device pointer (u64). Returns `Err(OutOfMemory)` if the
    /// allocation fails.
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Deallocate device memory
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Copy data from host to device
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Copy data from device to host
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Copy a 2-D array of elements between two strided device buffers
    ///
    /// For each logical index `(i, j)` in `shape`, the element at
    /// `src + (src_offset + i*src_strides[0] + j*src_strides[1]) * elem_size`
    /// is copied to the corresponding destination address. Both the
    /// make-contiguous gather and the strided write-back scatter are
    /// expressed through this one primitive.
    #[allow(clippy::too_many_arguments)]
    fn copy_translate(
        src: u64,
        src_offset: usize,
        src_strides: [isize; 2],
        dst: u64,
        dst_offset: usize,
        dst_strides: [isize; 2],
        shape: [usize; 2],
        elem_size: usize,
        device: &Self::Device,
    ) -> Result<()>;

    /// Get the default device
    fn default_device() -> Self::Device;

    /// Get the default client for a device
    fn default_client(device: &Self::Device) -> Self::Client;
}

/// Trait for device identification
pub trait Device: Clone + Send + Sync + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}

/// Trait for runtime clients that handle operation dispatch
///
/// All work dispatched through one client is ordered on that client's
/// execution stream: calls return once work is enqueued, not necessarily
/// completed. `synchronize` is the host-side wait at the stream boundary.
pub trait RuntimeClient<R: Runtime>: Clone + Send + Sync {
    /// Get the device this client operates on
    fn device(&self) -> &R::Device;

    /// Wait for all pending operations on this client's stream to complete
    fn synchronize(&self);

    /// Get the allocator for this client
    fn allocator(&self) -> &R::Allocator;
}
