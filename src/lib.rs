//! Accelerometer Denoising Library
//!
//! Configurable denoising for triaxial accelerometer recordings, with
//! drift-based validation by double integration.
//!
//! # Features
//!
//! - **Staged pipeline**: offset calibration, zero-phase Butterworth
//!   low-pass, median, scalar Kalman and Savitzky–Golay, each switchable
//! - **Per-axis**: X, Y and Z are processed independently with fresh state
//! - **Drift validation**: counts → m/s² → velocity → position, raw vs. denoised
//! - **Robust timing**: malformed timestamps fall back to 10 Hz and are
//!   reported on the result instead of failing the run
//!
//! # Quick Start
//!
//! ```
//! use accel_denoise::{Axis, DenoisingPipeline, FilterConfig, SampleGenerator, ValidationEngine};
//!
//! // 30 s of a stationary sensor with a 0.02 g bias. Removing that bias is
//! // what lowers drift; on an unbiased sensor raw drift is noise only.
//! let sample = SampleGenerator::new(0.1, 0.01, 42)?.stationary(300, 0.02)?;
//!
//! let pipeline = DenoisingPipeline::new(FilterConfig::default())?;
//! let denoised = pipeline.run(&sample.series)?;
//!
//! let result = ValidationEngine::default().validate(&denoised);
//! assert!(result.improved(Axis::X));
//! # Ok::<(), accel_denoise::DenoiseError>(())
//! ```
//!
//! # Stage Order
//!
//! | Stage | Parameter(s) | Default |
//! |-------|--------------|---------|
//! | offset | `stationary_samples` | 100 |
//! | low-pass | `cutoff_hz` | 2.0 |
//! | median | `median_window` | 5 |
//! | Kalman | `process_noise`, `measurement_noise` | 0.01, 0.5 |
//! | Savitzky–Golay | `savgol_window`, `savgol_poly_order` | 11, 3 |
//!
//! # Presets
//!
//! ```
//! use accel_denoise::FilterConfig;
//!
//! let full = FilterConfig::default();
//! let sensor = FilterConfig::mpu6050();
//! let spikes = FilterConfig::impulse_rejection();
//! let identity = FilterConfig::passthrough();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod config;
pub mod error;
pub mod filters;
pub mod integrator;
pub mod io;
pub mod kalman;
pub mod pipeline;
pub mod series;
pub mod synth;
pub mod validation;

// Re-exports for convenient access
pub use config::{FilterConfig, Stage, MPU6050_COUNTS_PER_G};
pub use error::{DenoiseError, Result};
pub use integrator::{cumulative_trapezoid, estimate_position, integrate, Kinematics};
pub use io::{
    parse_capture_line, read_capture, read_denoised, read_samples, write_denoised,
    write_samples, write_validation, TimeUnit,
};
pub use kalman::ScalarKalmanFilter;
pub use pipeline::{DenoisedSeries, DenoisingPipeline};
pub use series::{
    derive_sampling, Axis, AxisData, SampleSeries, Sampling, TimestampIssue,
    FALLBACK_SAMPLE_RATE_HZ,
};
pub use synth::{SampleGenerator, SyntheticSample};
pub use validation::{
    AxisValidation, DriftPair, UnitScale, ValidationEngine, ValidationResult, STANDARD_GRAVITY,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    fn stationary(seed: u64) -> SampleSeries {
        SampleGenerator::new(0.1, 0.01, seed)
            .unwrap()
            .stationary(200, 0.02)
            .unwrap()
            .series
    }

    #[test]
    fn test_full_pipeline() {
        let series = stationary(3);
        let pipeline = DenoisingPipeline::new(FilterConfig::default()).unwrap();

        let denoised = pipeline.run(&series).unwrap();
        assert_eq!(denoised.len(), series.len());
        assert!(denoised.sampling.is_reliable());

        let result = ValidationEngine::default().validate(&denoised);
        for axis in [Axis::X, Axis::Y] {
            let pair = result.drift(axis);
            assert!(pair.denoised < pair.raw, "{axis}: {pair:?}");
        }
    }

    #[test]
    fn test_passthrough_leaves_drift_unchanged() {
        let series = stationary(5);
        let denoised = DenoisingPipeline::new(FilterConfig::passthrough())
            .unwrap()
            .run(&series)
            .unwrap();
        let result = ValidationEngine::default().validate(&denoised);
        for (_, pair) in result.summary().iter() {
            assert_eq!(pair.raw, pair.denoised);
        }
    }

    #[test]
    fn test_batch_pipeline() {
        let batch = vec![stationary(1), stationary(2)];
        let pipeline = DenoisingPipeline::new(FilterConfig::default()).unwrap();
        let tables: Vec<DenoisedSeries> = pipeline
            .run_batch(&batch)
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();
        let results = ValidationEngine::default().validate_batch(&tables);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
