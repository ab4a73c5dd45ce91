//! Parameter bundle for a single quantization call.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest bit-budget accepted by the quantizer
pub const MAX_BITS: u32 = 64;

/// Bit-widths that have a native floating-point representation
pub const NATIVE_BITS: [u32; 3] = [64, 32, 16];

/// Parameters for one invocation of the quantizer.
///
/// Loaded from JSON with missing fields filled from [`Default`], so
/// `{"bits": 8}` is a complete document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizationRequest {
    /// Bit-budget per coordinate
    pub bits: u32,

    /// Use BF16 instead of F16 on the native 16-bit path
    pub full_range: bool,

    /// Run the level-lattice quantizer even when a native cast exists
    pub simulate: bool,

    /// Cast the result back to the input dtype
    pub preserve_original_dtype: bool,

    /// Reserved override of the safety fallbacks, currently only logged
    pub force: bool,
}

impl Default for QuantizationRequest {
    fn default() -> Self {
        Self {
            bits: 16,
            full_range: false,
            simulate: false,
            preserve_original_dtype: false,
            force: false,
        }
    }
}

impl QuantizationRequest {
    /// Create a request for the given bit-budget with all flags cleared
    pub fn new(bits: u32) -> Self {
        Self {
            bits,
            ..Default::default()
        }
    }

    /// Create a request that always takes the simulated path
    pub fn simulated(bits: u32) -> Self {
        Self::new(bits).with_simulate(true)
    }

    /// Set the wide-exponent 16-bit flag
    pub fn with_full_range(mut self, full_range: bool) -> Self {
        self.full_range = full_range;
        self
    }

    /// Set the simulate flag
    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Set the preserve-dtype flag
    pub fn with_preserve_dtype(mut self, preserve: bool) -> Self {
        self.preserve_original_dtype = preserve;
        self
    }

    /// Set the force flag
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Whether `bits` has a native floating-point layout
    pub fn has_native_width(&self) -> bool {
        NATIVE_BITS.contains(&self.bits)
    }

    /// Reject bit-budgets outside `1..=MAX_BITS`
    pub fn validate(&self) -> crate::Result<()> {
        if self.bits == 0 || self.bits > MAX_BITS {
            return Err(crate::QuantError::InvalidBitBudget {
                bits: self.bits,
                max: MAX_BITS,
            });
        }
        Ok(())
    }

    /// Load and validate a request from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a request from a JSON string
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let request: QuantizationRequest = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }
}
