//! Quantize a small random-looking matrix at several bit-budgets and print the error.
//!
//! Run with `RUST_LOG=rs_matquant=debug` to see the strategy chosen per call.

use candle_core::{DType, Tensor};

use rs_matquant::{utils::get_device, QuantErrorStats, QuantizationRequest, ScalarQuantizer};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rs_matquant=info".parse()?),
        )
        .init();

    let device = get_device(None)?;
    println!("Using device: {:?}", device);

    let data: Vec<f32> = (0..64 * 64).map(|i| ((i as f32) * 0.013).sin() * 3.0).collect();
    let x = Tensor::from_vec(data, (64, 64), &device)?;

    let quantizer = ScalarQuantizer::new();

    println!("{:>6} {:>10} {:>12} {:>12}", "bits", "dtype", "mae", "rel_frob");
    for request in [
        QuantizationRequest::new(64),
        QuantizationRequest::new(32),
        QuantizationRequest::new(16),
        QuantizationRequest::new(8),
        QuantizationRequest::new(4),
        QuantizationRequest::simulated(32).with_preserve_dtype(true),
        QuantizationRequest::new(2),
    ] {
        let q = quantizer.quantize(&x, &request)?;
        let stats = QuantErrorStats::between(&x, &q)?;
        println!(
            "{:>6} {:>10} {:>12.3e} {:>12.3e}",
            request.bits,
            format!("{:?}", q.dtype()),
            stats.mae,
            stats.relative_frobenius
        );
    }

    let half = quantizer.quantize(&x, &QuantizationRequest::new(16).with_full_range(true))?;
    if half.dtype() != DType::BF16 {
        println!("BF16 not native on {:?}, fell back to simulation", device);
    }

    Ok(())
}
