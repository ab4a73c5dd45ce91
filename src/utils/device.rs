//! Device, data type and capability utilities.

use candle_core::{Device as CandleDevice, DType as CandleDType};

/// Re-export candle Device for convenience
pub type Device = CandleDevice;

/// Re-export candle DType for convenience
pub type DType = CandleDType;

/// Capability query consulted by the quantizer before choosing a path.
pub trait DeviceCapabilities: Send + Sync {
    /// Whether the device has native half-precision arithmetic
    fn supports_half(&self, device: &Device) -> bool;

    /// Whether the device can hold F64 tensors
    fn supports_double(&self, device: &Device) -> bool;
}

/// Capabilities derived from the device kind.
///
/// CPU numeric units are treated as lacking native half precision, and Metal
/// has no F64 kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeCapabilities;

impl DeviceCapabilities for RuntimeCapabilities {
    fn supports_half(&self, device: &Device) -> bool {
        !is_cpu(device)
    }

    fn supports_double(&self, device: &Device) -> bool {
        !is_metal(device)
    }
}

/// Get the best available device (CUDA > Metal > CPU)
pub fn get_device(device_id: Option<usize>) -> crate::Result<Device> {
    #[cfg(feature = "cuda")]
    {
        let id = device_id.unwrap_or(0);
        match CandleDevice::new_cuda(id) {
            Ok(device) => {
                tracing::info!("Using CUDA device {}", id);
                return Ok(device);
            }
            Err(e) => {
                tracing::warn!("CUDA not available: {}", e);
            }
        }
    }

    #[cfg(feature = "metal")]
    {
        match CandleDevice::new_metal(device_id.unwrap_or(0)) {
            Ok(device) => {
                tracing::info!("Using Metal device");
                return Ok(device);
            }
            Err(e) => {
                tracing::warn!("Metal not available: {}", e);
            }
        }
    }

    #[cfg(not(any(feature = "cuda", feature = "metal")))]
    let _ = device_id;

    tracing::info!("Using CPU device");
    Ok(CandleDevice::Cpu)
}

/// Check if a device is CPU
pub fn is_cpu(device: &Device) -> bool {
    matches!(device, Device::Cpu)
}

/// Check if a device is Metal
pub fn is_metal(device: &Device) -> bool {
    device.is_metal()
}
