//! Configuration for the denoising pipeline.
//!
//! This module provides the [`FilterConfig`] struct which centralizes the
//! stage enables and all tunable filter parameters, along with presets.
//!
//! # Example
//!
//! ```
//! use accel_denoise::FilterConfig;
//!
//! // Full five-stage chain
//! let config = FilterConfig::default();
//!
//! // Offset + Kalman only, gravity kept on Z
//! let mpu = FilterConfig::mpu6050();
//!
//! // Everything disabled
//! let identity = FilterConfig::passthrough();
//! # assert!(config.validate().is_ok() && mpu.validate().is_ok() && identity.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DenoiseError, Result};
use crate::series::Axis;

/// Sensor counts per g for an MPU-6050 at the ±2g range.
pub const MPU6050_COUNTS_PER_G: f64 = 16384.0;

/// One stage of the denoising chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Subtract the at-rest mean.
    Offset,
    /// Zero-phase Butterworth low-pass.
    LowPass,
    /// Sliding-window median.
    Median,
    /// Scalar Kalman filter.
    Kalman,
    /// Savitzky–Golay smoothing.
    SavitzkyGolay,
}

impl Stage {
    /// The fixed order in which enabled stages run.
    pub const CANONICAL_ORDER: [Self; 5] = [
        Self::Offset,
        Self::LowPass,
        Self::Median,
        Self::Kalman,
        Self::SavitzkyGolay,
    ];

    /// Short name for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::LowPass => "lowpass",
            Self::Median => "median",
            Self::Kalman => "kalman",
            Self::SavitzkyGolay => "savgol",
        }
    }
}

/// Configuration for one pipeline run.
///
/// Immutable for the duration of a run; the same configuration is applied
/// to all three axes.
///
/// # Stage Parameters
///
/// - `stationary_samples`: leading samples assumed at rest, used for offset calibration.
/// - `cutoff_hz`: low-pass cutoff, must stay below the Nyquist frequency of the data.
/// - `median_window`: odd median window length.
/// - `process_noise`/`measurement_noise`: Kalman Q and R.
/// - `savgol_window`/`savgol_poly_order`: Savitzky–Golay window (forced odd) and order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    // Stage enables
    /// Run offset calibration.
    pub offset: bool,
    /// Run the zero-phase low-pass filter.
    pub lowpass: bool,
    /// Run the median filter.
    pub median: bool,
    /// Run the scalar Kalman filter.
    pub kalman: bool,
    /// Run Savitzky–Golay smoothing.
    pub savgol: bool,

    // Offset calibration
    /// Number of leading samples averaged for the offset.
    pub stationary_samples: usize,

    /// Axis that reads 1 g at rest. Its offset keeps `counts_per_g` as the
    /// rest level instead of zero.
    pub gravity_axis: Option<Axis>,

    /// Sensor counts corresponding to 1 g.
    pub counts_per_g: f64,

    // Low-pass
    /// Cutoff frequency in Hz.
    pub cutoff_hz: f64,

    // Median
    /// Median window length (odd).
    pub median_window: usize,

    // Kalman
    /// Process noise variance Q.
    pub process_noise: f64,

    /// Measurement noise variance R.
    pub measurement_noise: f64,

    // Savitzky–Golay
    /// Window length; even values are incremented to the next odd value.
    pub savgol_window: usize,

    /// Polynomial order, must be less than the (odd) window length.
    pub savgol_poly_order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            offset: true,
            lowpass: true,
            median: true,
            kalman: true,
            savgol: true,

            stationary_samples: 100,
            gravity_axis: None,
            counts_per_g: MPU6050_COUNTS_PER_G,

            cutoff_hz: 2.0,
            median_window: 5,

            process_noise: 0.01,
            measurement_noise: 0.5,

            savgol_window: 11,
            savgol_poly_order: 3,
        }
    }
}

impl FilterConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration independent of any data.
    ///
    /// The Nyquist bound on `cutoff_hz` depends on the sampling rate and is
    /// checked when the low-pass stage runs.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.stationary_samples == 0 {
            return Err(DenoiseError::invalid_config(
                "stationary_samples must be at least 1",
            ));
        }
        if !(self.counts_per_g.is_finite() && self.counts_per_g > 0.0) {
            return Err(DenoiseError::invalid_config("counts_per_g must be positive"));
        }
        if !(self.cutoff_hz.is_finite() && self.cutoff_hz > 0.0) {
            return Err(DenoiseError::invalid_config("cutoff_hz must be positive"));
        }
        if self.median_window == 0 || self.median_window % 2 == 0 {
            return Err(DenoiseError::invalid_config(format!(
                "median_window must be odd, got {}",
                self.median_window
            )));
        }
        if !(self.process_noise.is_finite() && self.process_noise > 0.0) {
            return Err(DenoiseError::invalid_config("process_noise must be positive"));
        }
        if !(self.measurement_noise.is_finite() && self.measurement_noise > 0.0) {
            return Err(DenoiseError::invalid_config(
                "measurement_noise must be positive",
            ));
        }
        if self.savgol_poly_order >= self.effective_savgol_window() {
            return Err(DenoiseError::invalid_config(format!(
                "savgol_poly_order ({}) must be less than window length ({})",
                self.savgol_poly_order,
                self.effective_savgol_window()
            )));
        }
        Ok(())
    }

    /// Whether `stage` runs under this configuration.
    #[must_use]
    pub const fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Offset => self.offset,
            Stage::LowPass => self.lowpass,
            Stage::Median => self.median,
            Stage::Kalman => self.kalman,
            Stage::SavitzkyGolay => self.savgol,
        }
    }

    /// Enabled stages in canonical order.
    pub fn enabled_stages(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::CANONICAL_ORDER
            .into_iter()
            .filter(|&stage| self.is_enabled(stage))
    }

    /// Savitzky–Golay window after odd normalization.
    #[must_use]
    pub const fn effective_savgol_window(&self) -> usize {
        if self.savgol_window % 2 == 0 {
            self.savgol_window + 1
        } else {
            self.savgol_window
        }
    }

    /// Rest level for `axis` during offset calibration.
    #[must_use]
    pub fn rest_reference(&self, axis: Axis) -> f64 {
        if self.gravity_axis == Some(axis) {
            self.counts_per_g
        } else {
            0.0
        }
    }

    /// Every stage disabled: the pipeline returns its input unchanged.
    #[must_use]
    pub fn passthrough() -> Self {
        Self {
            offset: false,
            lowpass: false,
            median: false,
            kalman: false,
            savgol: false,
            ..Self::default()
        }
    }

    /// Preset for raw MPU-6050 captures: offset calibration with gravity
    /// kept on Z, followed by the Kalman filter.
    #[must_use]
    pub fn mpu6050() -> Self {
        Self {
            lowpass: false,
            median: false,
            savgol: false,
            gravity_axis: Some(Axis::Z),
            ..Self::default()
        }
    }

    /// Preset for spiky captures: median and Kalman only, no calibration.
    #[must_use]
    pub fn impulse_rejection() -> Self {
        Self {
            offset: false,
            lowpass: false,
            savgol: false,
            median_window: 7,
            ..Self::default()
        }
    }

    /// Enable or disable a stage.
    #[must_use]
    pub const fn with_stage(mut self, stage: Stage, enabled: bool) -> Self {
        match stage {
            Stage::Offset => self.offset = enabled,
            Stage::LowPass => self.lowpass = enabled,
            Stage::Median => self.median = enabled,
            Stage::Kalman => self.kalman = enabled,
            Stage::SavitzkyGolay => self.savgol = enabled,
        }
        self
    }

    /// Set the low-pass cutoff.
    #[must_use]
    pub const fn with_cutoff_hz(mut self, cutoff_hz: f64) -> Self {
        self.cutoff_hz = cutoff_hz;
        self
    }

    /// Set the stationary sample count.
    #[must_use]
    pub const fn with_stationary_samples(mut self, n: usize) -> Self {
        self.stationary_samples = n;
        self
    }

    /// Set the median window.
    #[must_use]
    pub const fn with_median_window(mut self, window: usize) -> Self {
        self.median_window = window;
        self
    }

    /// Set Kalman process and measurement noise.
    #[must_use]
    pub const fn with_kalman_noise(mut self, process: f64, measurement: f64) -> Self {
        self.process_noise = process;
        self.measurement_noise = measurement;
        self
    }

    /// Set the Savitzky–Golay window and polynomial order.
    #[must_use]
    pub const fn with_savgol(mut self, window: usize, poly_order: usize) -> Self {
        self.savgol_window = window;
        self.savgol_poly_order = poly_order;
        self
    }

    /// Set the gravity axis.
    #[must_use]
    pub const fn with_gravity_axis(mut self, axis: Option<Axis>) -> Self {
        self.gravity_axis = axis;
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`FilterConfig::validate`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a configuration from JSON text. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or fails validation.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stationary_samples, 100);
        assert_eq!(config.enabled_stages().count(), 5);
    }

    #[test]
    fn test_mpu6050_preset() {
        let config = FilterConfig::mpu6050();
        assert!(config.validate().is_ok());
        let stages: Vec<_> = config.enabled_stages().collect();
        assert_eq!(stages, vec![Stage::Offset, Stage::Kalman]);
        assert_eq!(config.rest_reference(Axis::Z), MPU6050_COUNTS_PER_G);
        assert_eq!(config.rest_reference(Axis::X), 0.0);
    }

    #[test]
    fn test_passthrough_preset() {
        assert_eq!(FilterConfig::passthrough().enabled_stages().count(), 0);
    }

    #[test]
    fn test_validation() {
        let mut config = FilterConfig::default();

        config.median_window = 4;
        assert!(config.validate().unwrap_err().is_config_violation());

        config.median_window = 5;
        config.process_noise = 0.0;
        assert!(config.validate().is_err());

        config.process_noise = 0.01;
        config.savgol_poly_order = 11;
        assert!(config.validate().is_err());

        config.savgol_poly_order = 3;
        config.cutoff_hz = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_savgol_window_normalization() {
        let config = FilterConfig::default().with_savgol(10, 3);
        assert_eq!(config.effective_savgol_window(), 11);
        // Order 10 is valid against the normalized window of 11.
        assert!(FilterConfig::default().with_savgol(10, 10).validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = FilterConfig::default()
            .with_stage(Stage::Median, false)
            .with_cutoff_hz(3.5)
            .with_kalman_noise(0.02, 1.0);
        assert!(!config.is_enabled(Stage::Median));
        assert_eq!(config.cutoff_hz, 3.5);
        assert_eq!(config.measurement_noise, 1.0);
    }

    #[test]
    fn test_json_partial_fields() {
        let config =
            FilterConfig::from_json_str(r#"{"lowpass": false, "gravity_axis": "Z"}"#).unwrap();
        assert!(!config.lowpass);
        assert_eq!(config.gravity_axis, Some(Axis::Z));
        assert_eq!(config.median_window, 5);

        let invalid = FilterConfig::from_json_str(r#"{"median_window": 2}"#);
        assert!(invalid.unwrap_err().is_config_violation());
    }
}
