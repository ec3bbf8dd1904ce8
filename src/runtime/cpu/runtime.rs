//! Host runtime implementation

use super::client::CpuClient;
use super::device::CpuDevice;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::alloc::{alloc_zeroed, dealloc, Layout as AllocLayout};

/// Host compute runtime
///
/// This is the default runtime that works on any platform. Memory is
/// allocated on the heap using the system allocator, 64-byte aligned for
/// SIMD compatibility.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

/// Allocation alignment for SIMD compatibility
const ALIGN: usize = 64;

impl Runtime for CpuRuntime {
    type Device = CpuDevice;
    type Client = CpuClient;
    type Allocator = super::client::CpuAllocator;

    fn name() -> &'static str {
        "cpu"
    }

    fn allocate(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = AllocLayout::from_size_align(size_bytes, ALIGN)
            .map_err(|_| Error::OutOfMemory { size: size_bytes })?;
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        Ok(ptr as u64)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        let layout = AllocLayout::from_size_align(size_bytes, ALIGN)
            .expect("Invalid deallocation layout");
        unsafe {
            dealloc(ptr as *mut u8, layout);
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> Result<()> {
        if src.is_empty() || dst == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> Result<()> {
        if dst.is_empty() || src == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn copy_translate(
        src: u64,
        src_offset: usize,
        src_strides: [isize; 2],
        dst: u64,
        dst_offset: usize,
        dst_strides: [isize; 2],
        shape: [usize; 2],
        elem_size: usize,
        _device: &Self::Device,
    ) -> Result<()> {
        let [rows, cols] = shape;
        if src == 0 || dst == 0 || rows == 0 || cols == 0 {
            return Ok(());
        }

        let src_base = src as *const u8;
        let dst_base = dst as *mut u8;

        for i in 0..rows {
            for j in 0..cols {
                let src_elem = src_offset as isize
                    + i as isize * src_strides[0]
                    + j as isize * src_strides[1];
                let dst_elem = dst_offset as isize
                    + i as isize * dst_strides[0]
                    + j as isize * dst_strides[1];
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        src_base.offset(src_elem * elem_size as isize),
                        dst_base.offset(dst_elem * elem_size as isize),
                        elem_size,
                    );
                }
            }
        }
        Ok(())
    }

    fn default_device() -> Self::Device {
        CpuDevice::new()
    }

    fn default_client(device: &Self::Device) -> Self::Client {
        CpuClient::new(device.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_roundtrip() {
        let device = CpuDevice::new();
        let ptr = CpuRuntime::allocate(128, &device).unwrap();
        assert_ne!(ptr, 0);

        let data = [1u8, 2, 3, 4];
        CpuRuntime::copy_to_device(&data, ptr, &device).unwrap();
        let mut back = [0u8; 4];
        CpuRuntime::copy_from_device(ptr, &mut back, &device).unwrap();
        assert_eq!(back, data);

        CpuRuntime::deallocate(ptr, 128, &device);
    }

    #[test]
    fn test_copy_translate_row_to_column_major() {
        let device = CpuDevice::new();
        let src = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2x3 row-major
        let src_ptr = CpuRuntime::allocate(24, &device).unwrap();
        let dst_ptr = CpuRuntime::allocate(24, &device).unwrap();
        CpuRuntime::copy_to_device(bytemuck::cast_slice(&src), src_ptr, &device).unwrap();

        CpuRuntime::copy_translate(src_ptr, 0, [3, 1], dst_ptr, 0, [1, 2], [2, 3], 4, &device)
            .unwrap();

        let mut out = [0.0f32; 6];
        CpuRuntime::copy_from_device(dst_ptr, bytemuck::cast_slice_mut(&mut out), &device)
            .unwrap();
        // Column-major layout of the same logical matrix
        assert_eq!(out, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        CpuRuntime::deallocate(src_ptr, 24, &device);
        CpuRuntime::deallocate(dst_ptr, 24, &device);
    }
}
