//! Scoped scratch buffer with guaranteed release

use super::allocator::Allocator;
use crate::error::Result;

/// A transient workspace buffer acquired from an allocator
///
/// The buffer is released on drop, so it is returned to the allocator on
/// every exit path, including error propagation via `?` after acquisition.
/// One workspace is exclusively owned by one compute call.
pub struct Workspace<'a, A: Allocator> {
    allocator: &'a A,
    ptr: u64,
    size_bytes: usize,
}

impl<'a, A: Allocator> Workspace<'a, A> {
    /// Acquire a workspace of `size_bytes` from the allocator
    ///
    /// A zero-size workspace is valid and holds the null pointer.
    pub fn acquire(allocator: &'a A, size_bytes: usize) -> Result<Self> {
        let ptr = if size_bytes == 0 {
            0
        } else {
            allocator.allocate(size_bytes)?
        };
        Ok(Self {
            allocator,
            ptr,
            size_bytes,
        })
    }

    /// Raw device pointer to the workspace
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Size of the workspace in bytes
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

impl<A: Allocator> Drop for Workspace<'_, A> {
    fn drop(&mut self) {
        if self.size_bytes > 0 {
            self.allocator.deallocate(self.ptr, self.size_bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct CountingAllocator {
        live: Arc<AtomicUsize>,
    }

    impl CountingAllocator {
        fn new() -> Self {
            Self {
                live: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn live(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }
    }

    impl Allocator for CountingAllocator {
        fn allocate(&self, size_bytes: usize) -> crate::error::Result<u64> {
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(size_bytes as u64)
        }

        fn deallocate(&self, _ptr: u64, _size_bytes: usize) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn failing_compute(allocator: &CountingAllocator) -> crate::error::Result<()> {
        let _workspace = Workspace::acquire(allocator, 1024)?;
        Err(Error::primitive("test_compute", "STATUS_INTERNAL_ERROR"))
    }

    #[test]
    fn test_workspace_released_on_success() {
        let allocator = CountingAllocator::new();
        {
            let workspace = Workspace::acquire(&allocator, 256).unwrap();
            assert_eq!(workspace.size_bytes(), 256);
            assert_eq!(allocator.live(), 1);
        }
        assert_eq!(allocator.live(), 0);
    }

    #[test]
    fn test_workspace_released_on_error_path() {
        let allocator = CountingAllocator::new();
        let result = failing_compute(&allocator);
        assert!(result.is_err());
        assert_eq!(allocator.live(), 0);
    }

    #[test]
    fn test_zero_size_workspace_skips_allocation() {
        let allocator = CountingAllocator::new();
        let workspace = Workspace::acquire(&allocator, 0).unwrap();
        assert_eq!(workspace.ptr(), 0);
        assert_eq!(allocator.live(), 0);
    }
}
