//! Dynamic-range discovery and linear remapping between intervals.

use candle_core::{DType, Tensor};

/// Observed `[min, max]` of a tensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicRange {
    pub min: f64,
    pub max: f64,
}

/// The canonical range every matrix is normalized into
pub const UNIT_RANGE: DynamicRange = DynamicRange { min: -1.0, max: 1.0 };

impl DynamicRange {
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min <= max, "inverted range [{}, {}]", min, max);
        Self { min, max }
    }

    /// Reduce a non-empty tensor to its min and max
    pub fn of(tensor: &Tensor) -> crate::Result<Self> {
        let flat = tensor.flatten_all()?;
        let min = to_f64(&flat.min(0)?)?;
        let max = to_f64(&flat.max(0)?)?;
        Ok(Self::new(min, max))
    }

    /// `max - min`, which overflows to infinity for ranges wider than `f64::MAX`
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Largest absolute endpoint
    pub fn magnitude(&self) -> f64 {
        self.min.abs().max(self.max.abs())
    }

    /// Both endpoints divided by `by`
    pub fn scaled(&self, by: f64) -> Self {
        Self::new(self.min / by, self.max / by)
    }

    /// All elements are equal
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Divisor that brings both endpoints into `[-1, 1]`, 1 for an all-zero range
    pub fn unit_scale(&self) -> f64 {
        let magnitude = self.magnitude();
        if magnitude > 0.0 { magnitude } else { 1.0 }
    }

    /// `(mul, add)` of the affine map sending `self / s` onto `target / t`,
    /// where `s` and `t` are the two unit scales.
    ///
    /// Both scaled spans are at most 2 and the source one is not subnormal,
    /// so the factors stay finite for extreme ranges. `None` when `self` is
    /// degenerate.
    pub fn affine_to(&self, target: &DynamicRange) -> Option<(f64, f64)> {
        if self.is_degenerate() {
            return None;
        }
        let src = self.scaled(self.unit_scale());
        let dst = target.scaled(target.unit_scale());
        if src.is_degenerate() {
            return None;
        }
        let mul = dst.span() / src.span();
        let add = dst.min - src.min * mul;
        Some((mul, add))
    }

    /// Linearly map `tensor` from `self` onto `target`, clamped to `target`.
    ///
    /// `None` when `self` is degenerate, leaving the fallback to the caller.
    pub fn remap(&self, tensor: &Tensor, target: &DynamicRange) -> crate::Result<Option<Tensor>> {
        let Some((mul, add)) = self.affine_to(target) else {
            return Ok(None);
        };
        let src_scale = scalar_like(tensor, self.unit_scale())?;
        let dst_scale = scalar_like(tensor, target.unit_scale())?;
        let mapped = tensor
            .broadcast_div(&src_scale)?
            .affine(mul, add)?
            .broadcast_mul(&dst_scale)?
            .clamp(target.min, target.max)?;
        Ok(Some(mapped))
    }
}

/// Rank-0 tensor holding `value` with the dtype and device of `tensor`
fn scalar_like(tensor: &Tensor, value: f64) -> crate::Result<Tensor> {
    Ok(Tensor::new(value, tensor.device())?.to_dtype(tensor.dtype())?)
}

/// Read a rank-0 tensor as f64 regardless of its float dtype
fn to_f64(scalar: &Tensor) -> crate::Result<f64> {
    let value = match scalar.dtype() {
        DType::F64 => scalar.to_scalar::<f64>()?,
        _ => f64::from(scalar.to_dtype(DType::F32)?.to_scalar::<f32>()?),
    };
    Ok(value)
}
