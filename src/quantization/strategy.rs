//! Bit-width dispatch between native casts and the simulated quantizer.

use candle_core::{DType, Device};

use crate::config::QuantizationRequest;
use crate::utils::DeviceCapabilities;

/// Why a call was routed to the simulated quantizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationReason {
    /// B = 16 on a device without native half precision
    NoHalfSupport,
    /// Caller set `simulate` for a bit-width that has a native layout
    Forced,
    /// No native layout exists for the bit-width
    NonStandardWidth,
}

/// Quantization strategy, resolved once per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Cast to F64
    Native64,
    /// Cast to F32
    Native32,
    /// Cast to F16
    Native16,
    /// Cast to BF16
    Native16Wide,
    /// Explicit uniform quantizer over `2^bits` levels
    Simulated { bits: u32, reason: SimulationReason },
}

impl Strategy {
    /// Pick the strategy for `request` on `device`.
    ///
    /// Emits the fallback warnings; the request must already be validated.
    pub fn select(
        request: &QuantizationRequest,
        device: &Device,
        caps: &dyn DeviceCapabilities,
    ) -> Self {
        let bits = request.bits;
        let mut simulate = request.simulate;
        let mut reason = SimulationReason::Forced;

        if bits == 16 && !caps.supports_half(device) {
            tracing::warn!(
                "Setting simulate = true as half precision is not supported on {:?}",
                device
            );
            if request.force {
                tracing::debug!("force is set but does not override the half precision fallback");
            }
            simulate = true;
            reason = SimulationReason::NoHalfSupport;
        }

        if simulate || !request.has_native_width() {
            if simulate {
                tracing::warn!("Forced quantization simulation to {} bits", bits);
            } else {
                tracing::warn!("Using simulation to quantize to {} bits", bits);
                reason = SimulationReason::NonStandardWidth;
            }
            return Strategy::Simulated { bits, reason };
        }

        match bits {
            64 => Strategy::Native64,
            32 => Strategy::Native32,
            _ if request.full_range => Strategy::Native16Wide,
            _ => Strategy::Native16,
        }
    }

    /// Target dtype of a native cast, `None` for the simulated path
    pub fn native_dtype(&self) -> Option<DType> {
        match self {
            Strategy::Native64 => Some(DType::F64),
            Strategy::Native32 => Some(DType::F32),
            Strategy::Native16 => Some(DType::F16),
            Strategy::Native16Wide => Some(DType::BF16),
            Strategy::Simulated { .. } => None,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Strategy::Simulated { .. })
    }
}
