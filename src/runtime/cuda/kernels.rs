//! Index-narrowing kernel
//!
//! cuSPARSE is driven with 32-bit indices, while CSR producers commonly
//! materialize 64-bit index buffers. The narrowing cast runs on the device
//! so index data never bounces through the host.

use super::client::CudaClient;
use crate::error::{Error, Result};
use cudarc::driver::{LaunchConfig, PushKernelArg};
use cudarc::nvrtc::Ptx;
use std::sync::OnceLock;

const CAST_SRC: &str = r#"
extern "C" __global__ void cast_i64_to_i32(const long long* src, int* dst, unsigned long long n) {
    unsigned long long i = (unsigned long long)blockIdx.x * blockDim.x + threadIdx.x;
    if (i < n) {
        dst[i] = (int)src[i];
    }
}
"#;

static CAST_PTX: OnceLock<Ptx> = OnceLock::new();

fn cast_ptx() -> Result<Ptx> {
    if let Some(ptx) = CAST_PTX.get() {
        return Ok(ptx.clone());
    }
    let ptx = cudarc::nvrtc::compile_ptx(CAST_SRC)
        .map_err(|e| Error::Internal(format!("nvrtc compilation failed: {:?}", e)))?;
    Ok(CAST_PTX.get_or_init(|| ptx).clone())
}

/// Cast `n` i64 elements at `src` to i32 at `dst`, on the client's stream
pub(super) fn cast_i64_to_i32(client: &CudaClient, src: u64, dst: u64, n: usize) -> Result<()> {
    if n == 0 {
        return Ok(());
    }

    let module = client.context.load_module(cast_ptx()?)?;
    let func = module.load_function("cast_i64_to_i32")?;

    let n_arg = n as u64;
    let cfg = LaunchConfig::for_num_elems(n as u32);
    let mut builder = client.stream.launch_builder(&func);
    builder.arg(&src).arg(&dst).arg(&n_arg);
    // SAFETY: src and dst address live device buffers of at least n i64/i32
    // elements, matching the kernel signature.
    unsafe { builder.launch(cfg) }?;
    Ok(())
}
