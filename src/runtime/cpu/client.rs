//! Host client and allocator implementation

use super::device::CpuDevice;
use super::runtime::CpuRuntime;
use crate::error::{Error, Result};
use crate::runtime::{DefaultAllocator, RuntimeClient, SpmmCapability};
use std::alloc::{alloc_zeroed, dealloc, Layout as AllocLayout};

/// Host client for operation dispatch
///
/// Host operations are synchronous; the stream-ordering contract of
/// [`RuntimeClient`] degenerates to program order.
#[derive(Clone, Debug)]
pub struct CpuClient {
    pub(crate) device: CpuDevice,
    allocator: CpuAllocator,
    pub(crate) capability: SpmmCapability,
}

impl CpuClient {
    /// Create a new host client at the current capability tier
    pub fn new(device: CpuDevice) -> Self {
        Self::with_capability(device, SpmmCapability::GENERIC_V2)
    }

    /// Create a host client reporting a specific capability tier
    ///
    /// The host primitive implements every tier, so older vendor library
    /// generations (legacy worker, column-major-only generic API) can be
    /// exercised for parity testing.
    pub fn with_capability(device: CpuDevice, capability: SpmmCapability) -> Self {
        let allocator = create_cpu_allocator(device.clone());
        Self {
            device,
            allocator,
            capability,
        }
    }
}

impl RuntimeClient<CpuRuntime> for CpuClient {
    fn device(&self) -> &CpuDevice {
        &self.device
    }

    fn synchronize(&self) {
        // Host operations are synchronous, nothing to do
    }

    fn allocator(&self) -> &CpuAllocator {
        &self.allocator
    }
}

/// Host-specific allocator type alias
pub type CpuAllocator = DefaultAllocator<CpuDevice>;

/// Create a host allocator for the given device
fn create_cpu_allocator(device: CpuDevice) -> CpuAllocator {
    DefaultAllocator::new(
        device,
        |size, _dev| -> Result<u64> {
            if size == 0 {
                return Ok(0);
            }
            let align = 64;
            let layout = AllocLayout::from_size_align(size, align)
                .map_err(|_| Error::OutOfMemory { size })?;
            let ptr = unsafe { alloc_zeroed(layout) };
            if ptr.is_null() {
                return Err(Error::OutOfMemory { size });
            }
            Ok(ptr as u64)
        },
        |ptr, size, _dev| {
            if ptr == 0 || size == 0 {
                return;
            }
            let align = 64;
            let layout =
                AllocLayout::from_size_align(size, align).expect("Invalid deallocation layout");
            unsafe {
                dealloc(ptr as *mut u8, layout);
            }
        },
    )
}
