//! Utility modules for devices, capabilities and error metrics.

mod device;
mod metrics;

pub use device::{
    get_device, is_cpu, is_metal, DType, Device, DeviceCapabilities,
    RuntimeCapabilities,
};
pub use metrics::QuantErrorStats;
