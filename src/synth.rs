//! Synthetic accelerometer recordings with known kinematics.
//!
//! Generators produce sensor counts (1 g = `counts_per_g`) with gravity on
//! Z and seeded Gaussian noise, and report the theoretical final position of
//! each axis in metres. They are used to exercise the pipeline and the drift
//! validation against ground truth.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::config::MPU6050_COUNTS_PER_G;
use crate::error::{DenoiseError, Result};
use crate::series::{Axis, AxisData, SampleSeries};
use crate::validation::STANDARD_GRAVITY;

/// Length of the ramp-up and ramp-down phases of [`SampleGenerator::trapezoidal`].
pub const RAMP_SECONDS: f64 = 5.0;

/// A generated recording together with its ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticSample {
    /// The recording, in sensor counts.
    pub series: SampleSeries,
    /// Noise-free final position per axis (m), gravity excluded.
    pub expected_position: AxisData<f64>,
}

/// Seeded generator of synthetic recordings.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    dt: f64,
    counts_per_g: f64,
    noise: Normal<f64>,
    rng: StdRng,
}

impl SampleGenerator {
    /// Create a generator with sample period `dt` (s), Gaussian noise of
    /// `noise_g` (g, one standard deviation) and a fixed `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] if `dt` is not positive or
    /// `noise_g` is negative.
    pub fn new(dt: f64, noise_g: f64, seed: u64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DenoiseError::invalid_config(format!(
                "sample period must be positive, got {dt}"
            )));
        }
        let noise = Normal::new(0.0, noise_g)
            .map_err(|e| DenoiseError::invalid_config(format!("noise level {noise_g}: {e}")))?;
        Ok(Self {
            dt,
            counts_per_g: MPU6050_COUNTS_PER_G,
            noise,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Use a different sensor scale.
    #[must_use]
    pub const fn with_counts_per_g(mut self, counts_per_g: f64) -> Self {
        self.counts_per_g = counts_per_g;
        self
    }

    /// Sample period in seconds.
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of samples covering `[0, duration]` inclusive.
    fn samples_for(&self, duration: f64) -> Result<usize> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(DenoiseError::invalid_config(format!(
                "duration must be positive, got {duration}"
            )));
        }
        Ok((duration / self.dt).round() as usize + 1)
    }

    /// Build a recording from a noise-free acceleration profile in g.
    fn record(&mut self, n: usize, profile: impl Fn(Axis, f64) -> f64) -> Result<SampleSeries> {
        let time: Vec<f64> = (0..n).map(|i| i as f64 * self.dt).collect();
        let mut acc: AxisData<Vec<f64>> = AxisData::default();
        for axis in Axis::ALL {
            let gravity = if axis == Axis::Z { 1.0 } else { 0.0 };
            acc[axis] = time
                .iter()
                .map(|&t| {
                    let g = profile(axis, t) + gravity + self.noise.sample(&mut self.rng);
                    g * self.counts_per_g
                })
                .collect();
        }
        SampleSeries::from_parts(Some(time), acc)
    }

    /// Stationary sensor: `[bias, bias, 1 g + bias]` plus noise, `n` samples.
    ///
    /// The expected position is zero on every axis; any drift comes from the
    /// bias and noise.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidInput`] if `n` is zero.
    pub fn stationary(&mut self, n: usize, bias_g: f64) -> Result<SyntheticSample> {
        if n == 0 {
            return Err(DenoiseError::invalid_input("sample count must be positive"));
        }
        let series = self.record(n, |_, _| bias_g)?;
        Ok(SyntheticSample {
            series,
            expected_position: AxisData::default(),
        })
    }

    /// Constant acceleration `acc_x_g` on X for `duration` seconds; Y and Z at rest.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] if `duration` is not positive.
    pub fn constant_x(&mut self, duration: f64, acc_x_g: f64) -> Result<SyntheticSample> {
        let n = self.samples_for(duration)?;
        let series = self.record(n, |axis, _| if axis == Axis::X { acc_x_g } else { 0.0 })?;

        let t_end = (n - 1) as f64 * self.dt;
        let a = acc_x_g * STANDARD_GRAVITY;
        Ok(SyntheticSample {
            series,
            expected_position: AxisData::new(0.5 * a * t_end * t_end, 0.0, 0.0),
        })
    }

    /// Trapezoidal movement on all three axes.
    ///
    /// Acceleration ramps linearly from 0 to `peak_g` over the first
    /// [`RAMP_SECONDS`], is zero while coasting, then ramps from 0 to
    /// `-peak_g` over the last [`RAMP_SECONDS`], ending at rest.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] if `duration` is shorter than
    /// both ramps together.
    pub fn trapezoidal(
        &mut self,
        duration: f64,
        peak_g: AxisData<f64>,
    ) -> Result<SyntheticSample> {
        if duration.is_nan() || duration < 2.0 * RAMP_SECONDS {
            return Err(DenoiseError::invalid_config(format!(
                "trapezoidal movement needs at least {} s, got {duration}",
                2.0 * RAMP_SECONDS
            )));
        }
        let n = self.samples_for(duration)?;
        let coast_end = duration - RAMP_SECONDS;

        let series = self.record(n, |axis, t| {
            let peak = peak_g[axis];
            if t <= RAMP_SECONDS {
                peak * t / RAMP_SECONDS
            } else if t <= coast_end {
                0.0
            } else {
                -peak * (t - coast_end) / RAMP_SECONDS
            }
        })?;

        // Cruise speed peak·R/2 held for (duration - 2R), plus the two ramps
        // contributing peak·R²/6 and peak·R²/3.
        let expected_position = peak_g.map(|_, &p| {
            p * STANDARD_GRAVITY * RAMP_SECONDS / 2.0 * (duration - RAMP_SECONDS)
        });

        Ok(SyntheticSample {
            series,
            expected_position,
        })
    }
}
