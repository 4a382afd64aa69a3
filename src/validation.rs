//! Drift-based validation of denoised acceleration.
//!
//! This module converts raw and denoised sensor counts to physical units,
//! integrates each twice and reports drift, the magnitude of the final
//! position. For a stationary sensor the ideal drift is zero, so comparing
//! raw and denoised drift shows how much bias and noise the filter chain
//! removed.
//!
//! The engine is descriptive only: it never decides pass or fail.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MPU6050_COUNTS_PER_G;
use crate::error::{DenoiseError, Result};
use crate::integrator::{integrate, Kinematics};
use crate::pipeline::DenoisedSeries;
use crate::series::{Axis, AxisData, Sampling};

/// Standard gravity used for unit conversion (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Conversion from sensor counts to m/s².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitScale {
    /// Counts corresponding to 1 g.
    pub counts_per_g: f64,
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
}

impl Default for UnitScale {
    fn default() -> Self {
        Self {
            counts_per_g: MPU6050_COUNTS_PER_G,
            gravity: STANDARD_GRAVITY,
        }
    }
}

impl UnitScale {
    /// Validate the scale.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] unless both factors are
    /// finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.counts_per_g.is_finite() && self.counts_per_g > 0.0) {
            return Err(DenoiseError::invalid_config("counts_per_g must be positive"));
        }
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return Err(DenoiseError::invalid_config("gravity must be positive"));
        }
        Ok(())
    }

    /// Convert one value from counts to m/s².
    #[must_use]
    pub fn to_mps2(&self, counts: f64) -> f64 {
        counts / self.counts_per_g * self.gravity
    }

    /// Convert a series from counts to m/s².
    #[must_use]
    pub fn series_to_mps2(&self, counts: &[f64]) -> Vec<f64> {
        counts.iter().map(|&c| self.to_mps2(c)).collect()
    }
}

/// Acceleration in m/s² with its integrated kinematics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalTrace {
    /// Acceleration (m/s²).
    pub acc: Vec<f64>,
    /// Velocity (m/s) and position (m).
    pub kinematics: Kinematics,
}

impl SignalTrace {
    fn from_counts(counts: &[f64], scale: &UnitScale, dt: f64) -> Self {
        let acc = scale.series_to_mps2(counts);
        let kinematics = integrate(&acc, dt);
        Self { acc, kinematics }
    }

    /// Magnitude of the final position (m).
    #[must_use]
    pub fn drift(&self) -> f64 {
        self.kinematics.final_position().abs()
    }
}

/// Raw and denoised drift for one axis, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftPair {
    /// Drift of the raw signal.
    pub raw: f64,
    /// Drift of the denoised signal.
    pub denoised: f64,
}

impl DriftPair {
    /// Whether denoising strictly reduced drift.
    #[must_use]
    pub fn improved(&self) -> bool {
        self.denoised < self.raw
    }

    /// `denoised / raw`; below 1 means denoising helped. Infinite when raw drift is zero.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.raw == 0.0 {
            f64::INFINITY
        } else {
            self.denoised / self.raw
        }
    }
}

/// Validation traces for one axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisValidation {
    /// Raw signal in physical units.
    pub raw: SignalTrace,
    /// Denoised signal in physical units.
    pub denoised: SignalTrace,
}

impl AxisValidation {
    /// Raw and denoised drift.
    #[must_use]
    pub fn drift(&self) -> DriftPair {
        DriftPair {
            raw: self.raw.drift(),
            denoised: self.denoised.drift(),
        }
    }
}

/// Outcome of validating one denoised table.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Time axis in seconds.
    pub time: Vec<f64>,
    /// Per-axis traces.
    pub axes: AxisData<AxisValidation>,
    /// Sampling used for integration. A set `fallback` means the drift
    /// values rest on an assumed rate, not the recorded one.
    pub sampling: Sampling,
}

impl ValidationResult {
    /// Drift pair for one axis.
    #[must_use]
    pub fn drift(&self, axis: Axis) -> DriftPair {
        self.axes[axis].drift()
    }

    /// Drift pairs for all axes.
    #[must_use]
    pub fn summary(&self) -> AxisData<DriftPair> {
        self.axes.map(|_, v| v.drift())
    }

    /// Whether denoising strictly reduced drift on `axis`.
    #[must_use]
    pub fn improved(&self, axis: Axis) -> bool {
        self.drift(axis).improved()
    }

    /// Row view, one row per sample: time, then for each axis raw and
    /// denoised acceleration (m/s²) followed by raw and denoised position (m).
    ///
    /// The fields are public, so columns may have been edited to different
    /// lengths; rows stop at the shortest column.
    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        let n = self.axes.iter().fold(self.time.len(), |n, (_, v)| {
            n.min(v.raw.acc.len())
                .min(v.denoised.acc.len())
                .min(v.raw.kinematics.position.len())
                .min(v.denoised.kinematics.position.len())
        });
        self.time[..n].iter().enumerate().map(move |(i, &t)| {
            let mut row = Vec::with_capacity(1 + 4 * Axis::ALL.len());
            row.push(t);
            for (_, v) in self.axes.iter() {
                row.push(v.raw.acc[i]);
                row.push(v.denoised.acc[i]);
                row.push(v.raw.kinematics.position[i]);
                row.push(v.denoised.kinematics.position[i]);
            }
            row
        })
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the result holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Converts, integrates and compares raw vs. denoised acceleration.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    scale: UnitScale,
}

impl ValidationEngine {
    /// Create an engine with a custom unit scale.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] if the scale is invalid.
    pub fn new(scale: UnitScale) -> Result<Self> {
        scale.validate()?;
        Ok(Self { scale })
    }

    /// Unit scale in use.
    #[must_use]
    pub const fn scale(&self) -> &UnitScale {
        &self.scale
    }

    /// Validate one denoised table.
    #[must_use]
    pub fn validate(&self, table: &DenoisedSeries) -> ValidationResult {
        let dt = table.sampling.dt;
        if let Some(issue) = table.sampling.fallback {
            warn!(%issue, dt, "drift computed with fallback sampling period");
        }

        let axes = AxisData::from_fn(|axis| AxisValidation {
            raw: SignalTrace::from_counts(&table.raw[axis], &self.scale, dt),
            denoised: SignalTrace::from_counts(&table.denoised[axis], &self.scale, dt),
        });

        let result = ValidationResult {
            time: table.time.clone(),
            axes,
            sampling: table.sampling.clone(),
        };

        for (axis, pair) in result.summary().iter() {
            info!(
                %axis,
                raw_drift_m = pair.raw,
                denoised_drift_m = pair.denoised,
                "final position drift"
            );
        }

        result
    }

    /// Validate many tables in parallel.
    #[must_use]
    pub fn validate_batch(&self, tables: &[DenoisedSeries]) -> Vec<ValidationResult> {
        tables.par_iter().map(|t| self.validate(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table(raw: f64, denoised: f64, n: usize) -> DenoisedSeries {
        let sampling = Sampling::measured(0.1);
        DenoisedSeries::new(
            sampling.synthetic_time(n),
            AxisData::from_fn(|_| vec![raw; n]),
            AxisData::from_fn(|_| vec![denoised; n]),
            sampling,
        )
        .unwrap()
    }

    #[test]
    fn test_unit_conversion() {
        let scale = UnitScale::default();
        assert_relative_eq!(scale.to_mps2(16384.0), 9.81, epsilon = 1e-12);
        assert_relative_eq!(scale.to_mps2(-8192.0), -4.905, epsilon = 1e-12);
    }

    #[test]
    fn test_drift_of_constant_bias() {
        // 0.1 g over 10 s: 0.5 * 0.981 * 100
        let engine = ValidationEngine::default();
        let result = engine.validate(&table(1638.4, 0.0, 101));
        let pair = result.drift(Axis::X);
        assert_relative_eq!(pair.raw, 49.05, epsilon = 1e-6);
        assert_eq!(pair.denoised, 0.0);
        assert!(result.improved(Axis::Y));
    }

    #[test]
    fn test_result_shapes() {
        let engine = ValidationEngine::default();
        let result = engine.validate(&table(100.0, 50.0, 30));
        assert_eq!(result.len(), 30);
        for (_, axis) in result.axes.iter() {
            assert_eq!(axis.raw.acc.len(), 30);
            assert_eq!(axis.denoised.kinematics.position.len(), 30);
            assert_eq!(axis.raw.kinematics.velocity[0], 0.0);
        }
        assert!(result.sampling.is_reliable());

        let rows: Vec<Vec<f64>> = result.rows().collect();
        assert_eq!(rows.len(), 30);
        assert_eq!(rows[0].len(), 13);
        assert_eq!(rows[1][0], result.time[1]);
    }

    #[test]
    fn test_rows_stop_at_shortest_column() {
        let engine = ValidationEngine::default();
        let mut result = engine.validate(&table(100.0, 50.0, 10));
        result.axes[Axis::Y].denoised.acc.truncate(6);
        result.axes[Axis::Z].raw.kinematics.position.clear();
        assert_eq!(result.rows().count(), 0);

        result.axes[Axis::Z] = result.axes[Axis::X].clone();
        let rows: Vec<Vec<f64>> = result.rows().collect();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.len() == 13));

        result.time.truncate(4);
        assert_eq!(result.rows().count(), 4);
    }

    #[test]
    fn test_negative_drift_is_magnitude() {
        let engine = ValidationEngine::default();
        let pair = engine.validate(&table(-1000.0, 500.0, 50)).drift(Axis::Z);
        assert!(pair.raw > 0.0);
        assert!(pair.improved());
        assert_relative_eq!(pair.ratio(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_scale() {
        let scale = UnitScale {
            counts_per_g: 0.0,
            gravity: 9.81,
        };
        assert!(ValidationEngine::new(scale).is_err());
    }

    #[test]
    fn test_batch() {
        let engine = ValidationEngine::default();
        let results = engine.validate_batch(&[table(1.0, 0.5, 10), table(2.0, 1.0, 20)]);
        assert_eq!(results[1].len(), 20);
    }
}
