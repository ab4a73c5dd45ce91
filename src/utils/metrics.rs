//! Error statistics between a matrix and its quantized approximation.

use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

/// Error statistics for a quantized matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantErrorStats {
    /// Mean absolute error
    pub mae: f64,
    /// Maximum absolute error
    pub max_error: f64,
    /// Mean squared error
    pub mse: f64,
    /// `||X - Q||_F / ||X||_F`, zero when `X` is all zeros
    pub relative_frobenius: f64,
    /// Number of compared elements
    pub num_samples: usize,
}

impl QuantErrorStats {
    /// Compare two tensors of identical shape.
    ///
    /// Both sides are widened to F64 first, so mixed dtypes are fine.
    pub fn between(original: &Tensor, quantized: &Tensor) -> crate::Result<Self> {
        if original.dims() != quantized.dims() {
            return Err(crate::QuantError::ShapeMismatch(format!(
                "{:?} vs {:?}",
                original.dims(),
                quantized.dims()
            )));
        }

        let a: Vec<f64> = original.flatten_all()?.to_dtype(DType::F64)?.to_vec1()?;
        let b: Vec<f64> = quantized.flatten_all()?.to_dtype(DType::F64)?.to_vec1()?;
        if a.is_empty() {
            return Ok(Self::default());
        }

        let n = a.len() as f64;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut max_error = 0.0f64;
        let mut norm_sq = 0.0;

        for (x, q) in a.iter().zip(b.iter()) {
            let err = (x - q).abs();
            abs_sum += err;
            sq_sum += err * err;
            max_error = max_error.max(err);
            norm_sq += x * x;
        }

        let relative_frobenius = if norm_sq > 0.0 {
            (sq_sum / norm_sq).sqrt()
        } else {
            0.0
        };

        Ok(Self {
            mae: abs_sum / n,
            max_error,
            mse: sq_sum / n,
            relative_frobenius,
            num_samples: a.len(),
        })
    }

    /// Root mean squared error
    pub fn rmse(&self) -> f64 {
        self.mse.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use candle_core::Device;

    #[test]
    fn test_identical_tensors() {
        let x = Tensor::new(&[1.0f32, -2.0, 3.0], &Device::Cpu).unwrap();
        let stats = QuantErrorStats::between(&x, &x).unwrap();
        assert_eq!(stats.mae, 0.0);
        assert_eq!(stats.max_error, 0.0);
        assert_eq!(stats.relative_frobenius, 0.0);
        assert_eq!(stats.num_samples, 3);
    }

    #[test]
    fn test_known_errors() {
        let x = Tensor::new(&[[3.0f64, 0.0], [0.0, 4.0]], &Device::Cpu).unwrap();
        let q = Tensor::new(&[[3.0f64, 1.0], [0.0, 2.0]], &Device::Cpu).unwrap();
        let stats = QuantErrorStats::between(&x, &q).unwrap();

        assert_abs_diff_eq!(stats.mae, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.max_error, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.mse, 1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.rmse(), 1.25f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(stats.relative_frobenius, (5.0f64 / 25.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let x = Tensor::zeros((2, 2), DType::F32, &Device::Cpu).unwrap();
        let q = Tensor::zeros((4,), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            QuantErrorStats::between(&x, &q),
            Err(crate::QuantError::ShapeMismatch(_))
        ));
    }
}
