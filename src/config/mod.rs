//! Configuration module for quantization requests.

mod request;

pub use request::{QuantizationRequest, MAX_BITS, NATIVE_BITS};
