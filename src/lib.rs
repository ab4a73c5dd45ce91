//! # rs-matquant
//!
//! Element-wise scalar quantization for dense matrices.
//!
//! ## Core Concept
//!
//! Given a bit-budget `B`, every entry of a matrix is mapped onto one of `2^B`
//! evenly spaced levels spanning the matrix's own dynamic range:
//! - **Native fast path**: `B` in {64, 32, 16} is a plain cast to F64, F32,
//!   F16 or BF16
//! - **Simulated path**: any other `B` (or `simulate = true`) runs an explicit
//!   uniform quantizer over `[-1, 1]` and maps the result back to `[min, max]`
//!
//! ## Example
//!
//! ```no_run
//! use candle_core::{Device, Tensor};
//! use rs_matquant::{quantize, QuantizationRequest};
//!
//! fn main() -> rs_matquant::Result<()> {
//!     let x = Tensor::new(&[[-1.0f64, 0.0], [0.5, 1.0]], &Device::Cpu)?;
//!     let q = quantize(&x, &QuantizationRequest::simulated(2))?;
//!     assert_eq!(q.dims(), x.dims());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod quantization;
pub mod utils;

// Re-exports for convenience
pub use config::QuantizationRequest;
pub use quantization::{
    quantize, DynamicRange, LevelLattice, ScalarQuantizer, SimulationReason, Strategy,
    UniformQuantizer,
};
pub use utils::{DType, Device, DeviceCapabilities, QuantErrorStats, RuntimeCapabilities};

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum QuantError {
    #[error("Invalid bit-budget {bits}: must be between 1 and {max}")]
    InvalidBitBudget { bits: u32, max: u32 },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Candle error: {0}")]
    CandleError(#[from] candle_core::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuantError>;
