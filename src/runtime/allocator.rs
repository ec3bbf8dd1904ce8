//! Memory allocator trait and default implementation
//!
//! Scratch buffers for the sparse BLAS primitive are acquired through an
//! `Allocator`. Backends typically wire this to a caching, stream-ordered
//! device allocator: "deallocate" returns the region to the pool, and the
//! pool guarantees the region is not reused until outstanding enqueued work
//! referencing it has retired.

use crate::error::Result;

/// Memory allocator trait for runtime backends
pub trait Allocator: Clone + Send + Sync {
    /// Allocate memory of given size
    ///
    /// Returns a device pointer (u64). A zero-size request returns the null
    /// pointer. Fails with `OutOfMemory` when the request cannot be
    /// satisfied.
    fn allocate(&self, size_bytes: usize) -> Result<u64>;

    /// Deallocate (or return to the pool) previously allocated memory
    fn deallocate(&self, ptr: u64, size_bytes: usize);
}

/// Default allocator that delegates to a pair of functions
///
/// A simple allocator for backends without a pooling layer.
#[derive(Clone, Debug)]
pub struct DefaultAllocator<D> {
    device: D,
    allocate_fn: fn(usize, &D) -> Result<u64>,
    deallocate_fn: fn(u64, usize, &D),
}

impl<D: Clone + Send + Sync> DefaultAllocator<D> {
    /// Create a new default allocator
    pub fn new(
        device: D,
        allocate_fn: fn(usize, &D) -> Result<u64>,
        deallocate_fn: fn(u64, usize, &D),
    ) -> Self {
        Self {
            device,
            allocate_fn,
            deallocate_fn,
        }
    }

    /// Get the device this allocator is associated with
    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: Clone + Send + Sync> Allocator for DefaultAllocator<D> {
    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        (self.allocate_fn)(size_bytes, &self.device)
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        (self.deallocate_fn)(ptr, size_bytes, &self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allocator_trait_bounds() {
        fn assert_allocator<A: Allocator>() {}
        assert_allocator::<DefaultAllocator<()>>();
    }
}
