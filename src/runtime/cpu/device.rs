//! Host device identification

use crate::runtime::Device;

/// The host CPU device
///
/// There is only one host device; all instances compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuDevice;

impl CpuDevice {
    /// Create a new CPU device handle
    pub fn new() -> Self {
        Self
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        0
    }

    fn name(&self) -> String {
        "cpu".to_string()
    }
}
