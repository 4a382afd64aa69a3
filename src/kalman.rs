//! Scalar Kalman filter for per-axis acceleration estimates.
//!
//! This module provides [`ScalarKalmanFilter`], a forward-only recursive
//! estimator over a scalar measurement stream with a random-walk state model.

use crate::error::{DenoiseError, Result};

/// Default initial error covariance P₀.
pub const DEFAULT_INITIAL_COVARIANCE: f64 = 1.0;

/// Default initial state estimate x₀.
pub const DEFAULT_INITIAL_ESTIMATE: f64 = 0.0;

/// One-dimensional Kalman filter.
///
/// Every measurement passed to [`update`](Self::update) is accepted and
/// weighted, including non-finite values, which propagate into all later
/// estimates. The state is owned by one instance; construct a new filter to
/// reset it.
///
/// # Example
///
/// ```
/// use accel_denoise::ScalarKalmanFilter;
///
/// let mut kf = ScalarKalmanFilter::new(0.01, 0.5)?;
/// let mut estimate = 0.0;
/// for _ in 0..200 {
///     estimate = kf.update(3.0);
/// }
/// assert!((estimate - 3.0).abs() < 1e-6);
/// # Ok::<(), accel_denoise::DenoiseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ScalarKalmanFilter {
    /// Process noise variance Q.
    process_noise: f64,

    /// Measurement noise variance R.
    measurement_noise: f64,

    /// State estimate x.
    estimate: f64,

    /// Error covariance P.
    covariance: f64,
}

impl ScalarKalmanFilter {
    /// Create a filter with P₀ = 1 and x₀ = 0.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] unless both noise variances
    /// are finite and positive.
    pub fn new(process_noise: f64, measurement_noise: f64) -> Result<Self> {
        Self::with_initial_state(
            process_noise,
            measurement_noise,
            DEFAULT_INITIAL_COVARIANCE,
            DEFAULT_INITIAL_ESTIMATE,
        )
    }

    /// Create a filter with an explicit initial covariance and estimate.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] unless both noise variances
    /// are finite and positive and the initial covariance is non-negative.
    pub fn with_initial_state(
        process_noise: f64,
        measurement_noise: f64,
        initial_covariance: f64,
        initial_estimate: f64,
    ) -> Result<Self> {
        if !(process_noise.is_finite() && process_noise > 0.0) {
            return Err(DenoiseError::invalid_config(format!(
                "process noise must be positive, got {process_noise}"
            )));
        }
        if !(measurement_noise.is_finite() && measurement_noise > 0.0) {
            return Err(DenoiseError::invalid_config(format!(
                "measurement noise must be positive, got {measurement_noise}"
            )));
        }
        if !(initial_covariance.is_finite() && initial_covariance >= 0.0) {
            return Err(DenoiseError::invalid_config(format!(
                "initial covariance must be non-negative, got {initial_covariance}"
            )));
        }
        Ok(Self {
            process_noise,
            measurement_noise,
            estimate: initial_estimate,
            covariance: initial_covariance,
        })
    }

    /// Fold one measurement into the estimate and return the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        // Predict
        self.covariance += self.process_noise;

        // Correct
        let gain = self.covariance / (self.covariance + self.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.covariance *= 1.0 - gain;

        self.estimate
    }

    /// Feed a whole series in order and collect the estimates.
    pub fn filter_series(&mut self, measurements: &[f64]) -> Vec<f64> {
        measurements.iter().map(|&m| self.update(m)).collect()
    }

    /// Current state estimate x.
    #[must_use]
    pub const fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Current error covariance P.
    #[must_use]
    pub const fn error_covariance(&self) -> f64 {
        self.covariance
    }

    /// Steady-state covariance the filter converges to, the positive root of
    /// `P² + Q·P − Q·R = 0`.
    #[must_use]
    pub fn steady_state_covariance(&self) -> f64 {
        let q = self.process_noise;
        let r = self.measurement_noise;
        (-q + (q * q + 4.0 * q * r).sqrt()) / 2.0
    }
}
