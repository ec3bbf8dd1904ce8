//! CUDA client implementation
//!
//! `CudaClient` owns the context, stream, and cuSPARSE handle. All work
//! dispatched through one client launches on its stream; calls return once
//! work is enqueued. Scratch deallocation is stream-ordered, so freed
//! regions are not reused until outstanding enqueued work has retired.

use super::cusparse::CudaSparse;
use super::device::CudaDevice;
use super::runtime::CudaRuntime;
use crate::error::{Error, Result};
use crate::runtime::{Allocator, RuntimeClient};
use cudarc::driver::safe::{CudaContext, CudaStream};
use std::sync::Arc;

/// CUDA runtime client
#[derive(Clone)]
pub struct CudaClient {
    pub(crate) device: CudaDevice,
    pub(crate) context: Arc<CudaContext>,
    pub(crate) stream: Arc<CudaStream>,
    pub(crate) cusparse: Arc<CudaSparse>,
    allocator: CudaAllocator,
}

impl CudaClient {
    /// Create a new client for the given device
    pub fn new(device: CudaDevice) -> Result<Self> {
        let context = CudaContext::new(device.index)?;
        let stream = context.default_stream();
        let cusparse = Arc::new(
            CudaSparse::new(stream.clone())
                .map_err(|e| Error::primitive("cusparseCreate", e))?,
        );
        let allocator = CudaAllocator {
            stream: stream.clone(),
        };
        Ok(Self {
            device,
            context,
            stream,
            cusparse,
            allocator,
        })
    }
}

impl std::fmt::Debug for CudaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaClient")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl RuntimeClient<CudaRuntime> for CudaClient {
    fn device(&self) -> &CudaDevice {
        &self.device
    }

    fn synchronize(&self) {
        let _ = self.stream.synchronize();
    }

    fn allocator(&self) -> &CudaAllocator {
        &self.allocator
    }
}

/// CUDA allocator using stream-ordered allocation
///
/// Uses `cuMemAllocAsync` / `cuMemFreeAsync`: deallocation enqueues the
/// release on the stream, so buffers stay valid for all previously enqueued
/// work that references them.
#[derive(Clone)]
pub struct CudaAllocator {
    stream: Arc<CudaStream>,
}

impl Allocator for CudaAllocator {
    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        unsafe {
            let mut ptr: u64 = 0;
            let result = cudarc::driver::sys::cuMemAllocAsync(
                &mut ptr,
                size_bytes,
                self.stream.cu_stream(),
            );
            if result != cudarc::driver::sys::CUresult::CUDA_SUCCESS {
                return Err(Error::OutOfMemory { size: size_bytes });
            }
            Ok(ptr)
        }
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        unsafe {
            let _ = cudarc::driver::sys::cuMemFreeAsync(ptr, self.stream.cu_stream());
        }
    }
}
