//! Simulated uniform scalar quantization.
//!
//! Every element is normalized into `[-1, 1]` using the tensor's own range,
//! snapped to the nearest of `2^B` evenly spaced levels, and mapped back onto
//! the original range. All elementwise work stays on the tensor's device; the
//! only host reads are the min/max reductions.

use candle_core::{DType, Tensor};

use super::range::{DynamicRange, UNIT_RANGE};

/// The `2^B` evenly spaced points covering `[-1, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelLattice {
    bits: u32,
    resolution: f64,
}

impl LevelLattice {
    pub fn new(bits: u32) -> Self {
        let count = 2f64.powi(bits as i32);
        Self {
            bits,
            resolution: 2.0 / (count - 1.0),
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of levels, `2^B`
    pub fn count(&self) -> f64 {
        2f64.powi(self.bits as i32)
    }

    /// Spacing between neighbouring levels
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// The `index`-th level, counting up from -1
    pub fn level(&self, index: f64) -> f64 {
        UNIT_RANGE.min + index * self.resolution
    }

    /// Snap normalized values onto the lattice.
    ///
    /// Values below -1 or above 1 clamp to the end levels. In between, each
    /// value goes to the lower point of its cell when it lies within half a
    /// step of it (ties included), otherwise to the upper point.
    pub fn snap(&self, normalized: &Tensor) -> crate::Result<Tensor> {
        let res = self.resolution;
        let half = res / 2.0;

        let cell = normalized.affine(1.0, -UNIT_RANGE.min)?.affine(1.0 / res, 0.0)?.floor()?;
        let lower = cell.affine(res, UNIT_RANGE.min)?;
        let upper = cell.affine(res, UNIT_RANGE.min + res)?;

        let near_lower = normalized.sub(&lower)?.abs()?.le(half)?;
        let snapped = near_lower.where_cond(&lower, &upper)?;

        let below = normalized.lt(UNIT_RANGE.min)?;
        let above = normalized.gt(UNIT_RANGE.max)?;
        let snapped = below.where_cond(&filled_like(normalized, UNIT_RANGE.min)?, &snapped)?;
        let snapped = above.where_cond(&filled_like(normalized, UNIT_RANGE.max)?, &snapped)?;
        Ok(snapped)
    }
}

/// Explicit level-lattice quantizer for an arbitrary bit-budget
#[derive(Debug, Clone, Copy)]
pub struct UniformQuantizer {
    lattice: LevelLattice,
    /// Intermediate dtype, F64 unless the device lacks it
    working_dtype: DType,
}

impl UniformQuantizer {
    pub fn new(bits: u32) -> Self {
        Self::with_working_dtype(bits, DType::F64)
    }

    pub fn with_working_dtype(bits: u32, working_dtype: DType) -> Self {
        Self {
            lattice: LevelLattice::new(bits),
            working_dtype,
        }
    }

    pub fn lattice(&self) -> &LevelLattice {
        &self.lattice
    }

    pub fn working_dtype(&self) -> DType {
        self.working_dtype
    }

    /// Quantize `tensor`, returning a tensor of the same shape in the working dtype.
    ///
    /// A constant tensor, or one whose quantized values collapse onto a single
    /// level, is returned unchanged.
    pub fn quantize(&self, tensor: &Tensor) -> crate::Result<Tensor> {
        let x = tensor.to_dtype(self.working_dtype)?;
        if x.elem_count() == 0 {
            return Ok(x);
        }

        let input_range = DynamicRange::of(&x)?;
        tracing::trace!("input range [{}, {}]", input_range.min, input_range.max);

        let Some(normalized) = input_range.remap(&x, &UNIT_RANGE)? else {
            tracing::debug!("constant input, returning it unchanged");
            return Ok(x);
        };

        let quantized = self.lattice.snap(&normalized)?;

        let quantized_range = DynamicRange::of(&quantized)?;
        match quantized_range.remap(&quantized, &input_range)? {
            Some(out) => {
                tracing::trace!("output dtype {:?}, device {:?}", out.dtype(), out.device());
                Ok(out)
            }
            None => {
                tracing::debug!("quantized values collapsed onto one level, returning input unchanged");
                Ok(x)
            }
        }
    }
}

fn filled_like(tensor: &Tensor, value: f64) -> crate::Result<Tensor> {
    Ok(tensor.ones_like()?.affine(0.0, value)?)
}
