//! Offset calibration.
//!
//! Assumes the sensor is at rest for the first few samples and removes the
//! bias measured there from the whole series.

use crate::error::{DenoiseError, Result};

/// Subtract the mean of the first `stationary_samples` values from every sample.
///
/// # Errors
///
/// Returns an error if `stationary_samples` is zero or exceeds the series
/// length. No clamping happens here; the pipeline clamps before calling.
pub fn offset_calibrate(series: &[f64], stationary_samples: usize) -> Result<Vec<f64>> {
    offset_calibrate_to(series, stationary_samples, 0.0)
}

/// Offset calibration towards a known rest level.
///
/// The bias is `mean(first n) - reference`, so after calibration the
/// stationary segment averages to `reference`. With `reference = 0` this is
/// [`offset_calibrate`].
///
/// # Errors
///
/// Returns an error if `stationary_samples` is zero or exceeds the series
/// length.
pub fn offset_calibrate_to(
    series: &[f64],
    stationary_samples: usize,
    reference: f64,
) -> Result<Vec<f64>> {
    if stationary_samples == 0 {
        return Err(DenoiseError::invalid_input(
            "offset calibration needs at least one stationary sample",
        ));
    }
    if stationary_samples > series.len() {
        return Err(DenoiseError::series_too_short(stationary_samples, series.len()));
    }

    let rest = &series[..stationary_samples];
    let mean = rest.iter().sum::<f64>() / stationary_samples as f64;
    let bias = mean - reference;

    Ok(series.iter().map(|&v| v - bias).collect())
}
