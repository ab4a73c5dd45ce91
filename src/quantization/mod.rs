//! Element-wise matrix quantization for a general bit-budget.
//!
//! Two paths are available:
//! - Native casts for B in {64, 32, 16}
//! - A simulated uniform quantizer for every other B, or when forced

mod range;
mod strategy;
mod uniform;

pub use range::{DynamicRange, UNIT_RANGE};
pub use strategy::{SimulationReason, Strategy};
pub use uniform::{LevelLattice, UniformQuantizer};

use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};

use crate::config::QuantizationRequest;
use crate::utils::{DeviceCapabilities, RuntimeCapabilities};

/// Scalar quantizer that consults a device capability query
#[derive(Clone)]
pub struct ScalarQuantizer {
    caps: Arc<dyn DeviceCapabilities>,
}

impl ScalarQuantizer {
    /// Create a quantizer using capabilities derived from the device kind
    pub fn new() -> Self {
        Self::with_capabilities(RuntimeCapabilities)
    }

    /// Create with a custom capability query
    pub fn with_capabilities(caps: impl DeviceCapabilities + 'static) -> Self {
        Self { caps: Arc::new(caps) }
    }

    /// Validate `request` and pick the strategy for `device`
    pub fn plan(&self, device: &Device, request: &QuantizationRequest) -> crate::Result<Strategy> {
        request.validate()?;
        Ok(Strategy::select(request, device, self.caps.as_ref()))
    }

    /// Quantize `tensor` according to `request`.
    ///
    /// The input is never modified. The output has the input's shape and
    /// lives on the input's device.
    pub fn quantize(&self, tensor: &Tensor, request: &QuantizationRequest) -> crate::Result<Tensor> {
        let span = tracing::debug_span!("quantize", bits = request.bits);
        let _enter = span.enter();
        let start = Instant::now();

        let orig_dtype = tensor.dtype();
        let strategy = self.plan(tensor.device(), request)?;
        tracing::debug!("Quantizing {:?} {:?} with {:?}", tensor.dims(), orig_dtype, strategy);

        let out = match strategy.native_dtype() {
            Some(dtype) => tensor.to_dtype(dtype)?,
            None => {
                let working = self.working_dtype(tensor.device());
                UniformQuantizer::with_working_dtype(request.bits, working).quantize(tensor)?
            }
        };

        let out = if request.preserve_original_dtype {
            out.to_dtype(orig_dtype)?
        } else {
            out
        };

        tracing::debug!("quantize finished in {:?}", start.elapsed());
        Ok(out)
    }

    fn working_dtype(&self, device: &Device) -> DType {
        if self.caps.supports_double(device) {
            DType::F64
        } else {
            DType::F32
        }
    }
}

impl Default for ScalarQuantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScalarQuantizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarQuantizer").finish_non_exhaustive()
    }
}

/// Quantize `tensor` with the default device capabilities
pub fn quantize(tensor: &Tensor, request: &QuantizationRequest) -> crate::Result<Tensor> {
    ScalarQuantizer::new().quantize(tensor, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::{QuantErrorStats, QuantError};

    struct Accelerator;

    impl DeviceCapabilities for Accelerator {
        fn supports_half(&self, _device: &Device) -> bool {
            true
        }

        fn supports_double(&self, _device: &Device) -> bool {
            true
        }
    }

    /// Half precision but no F64, like Metal
    struct NoDouble;

    impl DeviceCapabilities for NoDouble {
        fn supports_half(&self, _device: &Device) -> bool {
            true
        }

        fn supports_double(&self, _device: &Device) -> bool {
            false
        }
    }

    fn ramp(n: usize) -> Tensor {
        let data: Vec<f32> = (0..n).map(|i| ((i * 37 % 101) as f32) / 7.0 - 3.0).collect();
        Tensor::from_vec(data, (n / 8, 8), &Device::Cpu).unwrap()
    }

    #[test]
    fn test_native_32_is_plain_cast() {
        let x = Tensor::new(&[[0.1f64, -2.7], [3.3, 1e-9]], &Device::Cpu).unwrap();
        let q = quantize(&x, &QuantizationRequest::new(32)).unwrap();
        assert_eq!(q.dtype(), DType::F32);

        let expected: Vec<Vec<f32>> = x.to_dtype(DType::F32).unwrap().to_vec2().unwrap();
        assert_eq!(q.to_vec2::<f32>().unwrap(), expected);
    }

    #[test]
    fn test_native_64() {
        let x = ramp(64);
        let q = quantize(&x, &QuantizationRequest::new(64)).unwrap();
        assert_eq!(q.dtype(), DType::F64);
        assert_eq!(QuantErrorStats::between(&x, &q).unwrap().max_error, 0.0);
    }

    #[test]
    fn test_native_16_with_half_support() {
        let quantizer = ScalarQuantizer::with_capabilities(Accelerator);
        let x = ramp(32);

        let q = quantizer.quantize(&x, &QuantizationRequest::new(16)).unwrap();
        assert_eq!(q.dtype(), DType::F16);

        let q = quantizer
            .quantize(&x, &QuantizationRequest::new(16).with_full_range(true))
            .unwrap();
        assert_eq!(q.dtype(), DType::BF16);
    }

    #[test]
    fn test_half_on_cpu_is_simulated() {
        let x = ramp(32);
        let q = quantize(&x, &QuantizationRequest::new(16)).unwrap();
        assert_eq!(q.dtype(), DType::F64);
        assert_eq!(q.dims(), x.dims());
        let stats = QuantErrorStats::between(&x, &q).unwrap();
        assert!(stats.max_error < 1e-3, "16-bit simulation too coarse: {:?}", stats);
    }

    #[test]
    fn test_preserve_original_dtype() {
        let x = ramp(16);
        for request in [
            QuantizationRequest::simulated(4),
            QuantizationRequest::new(64),
            QuantizationRequest::new(16),
            QuantizationRequest::new(7),
        ] {
            let q = quantize(&x, &request.with_preserve_dtype(true)).unwrap();
            assert_eq!(q.dtype(), DType::F32, "{:?}", request);
            assert_eq!(q.dims(), x.dims());
        }
    }

    #[test]
    fn test_working_dtype_follows_capabilities() {
        let x = ramp(16);
        let q = ScalarQuantizer::with_capabilities(NoDouble)
            .quantize(&x, &QuantizationRequest::new(5))
            .unwrap();
        assert_eq!(q.dtype(), DType::F32);
    }

    #[test]
    fn test_invalid_bits_rejected() {
        let x = ramp(8);
        let err = quantize(&x, &QuantizationRequest::new(0)).unwrap_err();
        assert!(matches!(err, QuantError::InvalidBitBudget { bits: 0, .. }));
        let err = quantize(&x, &QuantizationRequest::new(65)).unwrap_err();
        assert!(matches!(err, QuantError::InvalidBitBudget { bits: 65, .. }));
    }

    #[test]
    fn test_input_not_modified() {
        let x = ramp(24);
        let before: Vec<Vec<f32>> = x.to_vec2().unwrap();
        let _ = quantize(&x, &QuantizationRequest::simulated(2)).unwrap();
        assert_eq!(x.to_vec2::<f32>().unwrap(), before);
    }

    #[test]
    fn test_error_decreases_with_bits() {
        let x = ramp(256);
        let mut last = f64::INFINITY;
        for bits in [1, 2, 4, 8, 12, 16] {
            let q = quantize(&x, &QuantizationRequest::simulated(bits)).unwrap();
            let mae = QuantErrorStats::between(&x, &q).unwrap().mae;
            assert!(mae <= last, "mae rose from {} to {} at {} bits", last, mae, bits);
            last = mae;
        }
        assert_abs_diff_eq!(last, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_plan() {
        let quantizer = ScalarQuantizer::new();
        assert_eq!(
            quantizer.plan(&Device::Cpu, &QuantizationRequest::new(32)).unwrap(),
            Strategy::Native32
        );
        assert!(quantizer.plan(&Device::Cpu, &QuantizationRequest::new(0)).is_err());
    }

    #[test]
    fn test_output_dtype_matches_plan() {
        let quantizer = ScalarQuantizer::with_capabilities(Accelerator);
        let x = ramp(16);
        for request in [
            QuantizationRequest::new(64),
            QuantizationRequest::new(32),
            QuantizationRequest::new(16),
            QuantizationRequest::new(16).with_full_range(true),
            QuantizationRequest::new(3),
        ] {
            let strategy = quantizer.plan(x.device(), &request).unwrap();
            assert_eq!(strategy.is_simulated(), !request.has_native_width());

            let q = quantizer.quantize(&x, &request).unwrap();
            let expected = strategy.native_dtype().unwrap_or(DType::F64);
            assert_eq!(q.dtype(), expected, "{:?}", strategy);
        }
    }
}
