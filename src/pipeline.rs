//! Per-axis denoising pipeline.
//!
//! This module implements [`DenoisingPipeline`], which applies the enabled
//! stages of a [`FilterConfig`] to each axis of a [`SampleSeries`].
//!
//! # Pipeline Overview
//!
//! 1. Derive the sampling rate once from the time column (or take an override)
//! 2. For each axis independently, in canonical order:
//!    offset → low-pass → median → Kalman → Savitzky–Golay
//! 3. Assemble raw and denoised columns with the time axis and sampling record
//!
//! Disabled stages are pass-throughs, so a configuration with every stage
//! disabled returns the input unchanged. The Kalman stage constructs a fresh
//! [`ScalarKalmanFilter`] on every invocation; no state survives between axes
//! or runs.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{FilterConfig, Stage};
use crate::error::{DenoiseError, Result};
use crate::filters::{median_filter, offset_calibrate_to, savgol_filter, zero_phase_lowpass};
use crate::kalman::ScalarKalmanFilter;
use crate::series::{Axis, AxisData, SampleSeries, Sampling};

/// Raw and denoised acceleration for one input series.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoisedSeries {
    /// Time axis in seconds (synthetic when the input timestamps were unusable).
    pub time: Vec<f64>,
    /// Input acceleration, unchanged.
    pub raw: AxisData<Vec<f64>>,
    /// Denoised acceleration, same units and length as `raw`.
    pub denoised: AxisData<Vec<f64>>,
    /// Sampling parameters the run used.
    pub sampling: Sampling,
}

impl DenoisedSeries {
    /// Assemble a denoised table, checking that all columns agree in length.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::LengthMismatch`] if any column differs in
    /// length from `time`.
    pub fn new(
        time: Vec<f64>,
        raw: AxisData<Vec<f64>>,
        denoised: AxisData<Vec<f64>>,
        sampling: Sampling,
    ) -> Result<Self> {
        let n = time.len();
        for column in raw.0.iter().chain(denoised.0.iter()) {
            if column.len() != n {
                return Err(DenoiseError::length_mismatch(n, column.len()));
            }
        }
        Ok(Self {
            time,
            raw,
            denoised,
            sampling,
        })
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the table holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Configurable chain of denoising stages.
///
/// # Example
///
/// ```
/// use accel_denoise::{DenoisingPipeline, FilterConfig, SampleSeries};
///
/// let n = 200;
/// let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
/// let x: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 40.0 } else { -40.0 }).collect();
/// let series = SampleSeries::new(time, x.clone(), x.clone(), x)?;
///
/// let pipeline = DenoisingPipeline::new(FilterConfig::default())?;
/// let out = pipeline.run(&series)?;
/// assert_eq!(out.len(), n);
/// # Ok::<(), accel_denoise::DenoiseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DenoisingPipeline {
    config: FilterConfig,
}

impl DenoisingPipeline {
    /// Create a pipeline after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration applied to every axis.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Denoise all three axes, deriving the sampling rate from the series'
    /// time column.
    ///
    /// Malformed timestamps do not abort the run: the fallback rate is used
    /// and recorded in [`DenoisedSeries::sampling`].
    ///
    /// # Errors
    ///
    /// Returns an error if a stage rejects its parameters for this data,
    /// e.g. a low-pass cutoff at or above the Nyquist frequency.
    pub fn run(&self, series: &SampleSeries) -> Result<DenoisedSeries> {
        let sampling = series.sampling();
        let time = series.time_axis(&sampling);
        self.run_with_sampling(series, time, sampling)
    }

    /// Denoise all three axes at an explicit sampling rate `fs` in Hz.
    ///
    /// The output time axis is the evenly spaced one implied by `fs`, so a
    /// table written to disk re-derives the same rate when read back. Any
    /// recorded time column is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidConfig`] if `fs` is not positive, or
    /// any error a stage raises.
    pub fn run_with_rate(&self, series: &SampleSeries, fs: f64) -> Result<DenoisedSeries> {
        if !(fs.is_finite() && fs > 0.0) {
            return Err(DenoiseError::invalid_config(format!(
                "sampling rate override must be positive, got {fs} Hz"
            )));
        }
        let sampling = Sampling::from_rate(fs);
        let time = sampling.synthetic_time(series.len());
        self.run_with_sampling(series, time, sampling)
    }

    /// Denoise many series in parallel. Each run is independent.
    pub fn run_batch(&self, batch: &[SampleSeries]) -> Vec<Result<DenoisedSeries>> {
        batch.par_iter().map(|series| self.run(series)).collect()
    }

    /// Denoise many series in parallel, all at the sampling rate `fs` in Hz.
    pub fn run_batch_with_rate(
        &self,
        batch: &[SampleSeries],
        fs: f64,
    ) -> Vec<Result<DenoisedSeries>> {
        batch
            .par_iter()
            .map(|series| self.run_with_rate(series, fs))
            .collect()
    }

    fn run_with_sampling(
        &self,
        series: &SampleSeries,
        time: Vec<f64>,
        sampling: Sampling,
    ) -> Result<DenoisedSeries> {
        let raw = series.acc().clone();
        let denoised = raw.try_map(|axis, column| self.denoise_axis(axis, column, sampling.fs))?;

        info!(
            samples = series.len(),
            fs = sampling.fs,
            fallback = sampling.fallback.is_some(),
            stages = self.config.enabled_stages().count(),
            "denoising run complete"
        );

        DenoisedSeries::new(time, raw, denoised, sampling)
    }

    /// Apply every enabled stage, in canonical order, to one axis.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage.
    pub fn denoise_axis(&self, axis: Axis, raw: &[f64], fs: f64) -> Result<Vec<f64>> {
        let mut data = raw.to_vec();
        if data.is_empty() {
            return Ok(data);
        }
        for stage in self.config.enabled_stages() {
            data = self.apply_stage(stage, axis, &data, fs)?;
            debug!(%axis, stage = stage.name(), samples = data.len(), "stage applied");
        }
        Ok(data)
    }

    fn apply_stage(&self, stage: Stage, axis: Axis, data: &[f64], fs: f64) -> Result<Vec<f64>> {
        let cfg = &self.config;
        match stage {
            Stage::Offset => {
                let stationary = cfg.stationary_samples.min(data.len());
                offset_calibrate_to(data, stationary, cfg.rest_reference(axis))
            }
            Stage::LowPass => zero_phase_lowpass(data, cfg.cutoff_hz, fs),
            Stage::Median => median_filter(data, cfg.median_window),
            Stage::Kalman => {
                let mut kf = ScalarKalmanFilter::new(cfg.process_noise, cfg.measurement_noise)?;
                Ok(kf.filter_series(data))
            }
            Stage::SavitzkyGolay => {
                savgol_filter(data, cfg.savgol_window, cfg.savgol_poly_order)
            }
        }
    }
}
