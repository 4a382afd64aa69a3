//! End-to-end tests for denoising and drift validation.
//!
//! These tests run synthetic recordings through the full pipeline and check
//! the drift report, sampling fallback and file round trips.

use accel_denoise::{
    io, Axis, AxisData, DenoisingPipeline, FilterConfig, SampleGenerator, SampleSeries, Stage,
    TimeUnit, TimestampIssue, ValidationEngine,
};
use approx::assert_relative_eq;
use std::path::PathBuf;

// =============================================================================
// HELPERS
// =============================================================================

/// Stationary MPU6050 recording: `[bias, bias, 1 g + bias]` counts plus noise.
fn stationary(n: usize, bias_g: f64, seed: u64) -> SampleSeries {
    SampleGenerator::new(0.1, 0.01, seed)
        .unwrap()
        .stationary(n, bias_g)
        .unwrap()
        .series
}

/// Unique scratch file under the system temp directory.
fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("accel_denoise_{}_{name}", std::process::id()))
}

// =============================================================================
// DRIFT
// =============================================================================

/// The recordings carry a 0.02 g bias on every axis. Offset calibration
/// removes it, which is what makes denoised drift smaller than raw drift.
/// With zero bias, raw drift is pure noise and denoising can lose.
#[test]
fn test_stationary_drift_reduced_on_horizontal_axes() {
    for seed in [1, 7, 42] {
        let series = stationary(200, 0.02, seed);
        let pipeline = DenoisingPipeline::new(FilterConfig::default()).unwrap();
        let result = ValidationEngine::default().validate(&pipeline.run(&series).unwrap());

        for axis in [Axis::X, Axis::Y] {
            let pair = result.drift(axis);
            assert!(
                pair.denoised < pair.raw,
                "seed {seed}, axis {axis}: raw {} m, denoised {} m",
                pair.raw,
                pair.denoised
            );
        }
    }
}

#[test]
fn test_mpu6050_preset_keeps_gravity() {
    let series = stationary(150, 0.0, 11);
    let pipeline = DenoisingPipeline::new(FilterConfig::mpu6050()).unwrap();
    let out = pipeline.run(&series).unwrap();

    let z = &out.denoised[Axis::Z];
    let tail_mean = z[100..].iter().sum::<f64>() / 50.0;
    assert_relative_eq!(tail_mean, 16384.0, max_relative = 0.01);

    let x = &out.denoised[Axis::X];
    let x_mean = x[100..].iter().sum::<f64>() / 50.0;
    assert!(x_mean.abs() < 150.0, "x mean {x_mean}");
}

#[test]
fn test_constant_acceleration_drift_matches_theory() {
    let sample = SampleGenerator::new(0.1, 0.0, 3)
        .unwrap()
        .constant_x(22.4, 0.1)
        .unwrap();
    let pipeline = DenoisingPipeline::new(FilterConfig::passthrough()).unwrap();
    let result = ValidationEngine::default().validate(&pipeline.run(&sample.series).unwrap());

    assert_relative_eq!(
        result.drift(Axis::X).raw,
        sample.expected_position[Axis::X],
        max_relative = 1e-9
    );
    assert_relative_eq!(result.drift(Axis::Y).raw, 0.0, epsilon = 1e-9);
}

#[test]
fn test_movement_survives_smoothing_stages() {
    let sample = SampleGenerator::new(0.1, 0.02, 5)
        .unwrap()
        .trapezoidal(30.0, AxisData::new(0.6, 4.0, 0.06))
        .unwrap();
    let config = FilterConfig::passthrough()
        .with_stage(Stage::LowPass, true)
        .with_stage(Stage::SavitzkyGolay, true);
    let pipeline = DenoisingPipeline::new(config).unwrap();
    let result = ValidationEngine::default().validate(&pipeline.run(&sample.series).unwrap());

    // Smoothing alone must not destroy a large genuine displacement.
    let pair = result.drift(Axis::Y);
    assert_relative_eq!(pair.denoised, sample.expected_position[Axis::Y], max_relative = 0.1);
}

// =============================================================================
// SAMPLING
// =============================================================================

#[test]
fn test_broken_timestamps_fall_back_to_ten_hz() {
    let n = 60;
    let time: Vec<f64> = (0..n).map(|i| if i == 30 { 0.0 } else { i as f64 * 0.02 }).collect();
    let base = stationary(n, 0.0, 9);
    let series = SampleSeries::new(
        time,
        base.axis(Axis::X).to_vec(),
        base.axis(Axis::Y).to_vec(),
        base.axis(Axis::Z).to_vec(),
    )
    .unwrap();

    let out = DenoisingPipeline::new(FilterConfig::default())
        .unwrap()
        .run(&series)
        .unwrap();
    assert_eq!(out.sampling.fallback, Some(TimestampIssue::NonMonotonic { index: 30 }));
    assert_eq!(out.sampling.fs, 10.0);
    assert_relative_eq!(out.time[59], 5.9, epsilon = 1e-9);

    let result = ValidationEngine::default().validate(&out);
    assert!(!result.sampling.is_reliable());
}

#[test]
fn test_lowpass_cutoff_at_nyquist_is_rejected() {
    // 50 Hz sampling, Nyquist 25 Hz
    let n = 100;
    let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.02).collect();
    let series = SampleSeries::new(time, vec![1.0; n], vec![2.0; n], vec![3.0; n]).unwrap();
    let only_lowpass = FilterConfig::passthrough().with_stage(Stage::LowPass, true);

    let at = DenoisingPipeline::new(only_lowpass.clone().with_cutoff_hz(25.0)).unwrap();
    assert!(at.run(&series).unwrap_err().is_config_violation());

    let below = DenoisingPipeline::new(only_lowpass.with_cutoff_hz(24.99)).unwrap();
    assert_eq!(below.run(&series).unwrap().len(), n);
}

#[test]
fn test_savgol_even_window_matches_next_odd() {
    let series = stationary(80, 0.01, 13);
    let only_savgol = FilterConfig::passthrough().with_stage(Stage::SavitzkyGolay, true);

    let even = DenoisingPipeline::new(only_savgol.clone().with_savgol(10, 3))
        .unwrap()
        .run(&series)
        .unwrap();
    let odd = DenoisingPipeline::new(only_savgol.with_savgol(11, 3))
        .unwrap()
        .run(&series)
        .unwrap();
    assert_eq!(even.denoised, odd.denoised);
}

// =============================================================================
// FILES
// =============================================================================

#[test]
fn test_csv_pipeline_round_trip() {
    let samples_path = scratch("samples.csv");
    let denoised_path = scratch("denoised.csv");
    let validation_path = scratch("validation.csv");

    let series = stationary(120, 0.02, 21);
    io::write_samples(&samples_path, &series).unwrap();

    let loaded = io::read_samples(&samples_path, TimeUnit::Seconds).unwrap();
    assert_eq!(loaded.len(), 120);
    assert_relative_eq!(loaded.sampling().fs, 10.0, epsilon = 1e-6);

    let table = DenoisingPipeline::new(FilterConfig::default())
        .unwrap()
        .run(&loaded)
        .unwrap();
    io::write_denoised(&denoised_path, &table).unwrap();

    let reloaded = io::read_denoised(&denoised_path).unwrap();
    assert_eq!(reloaded.denoised, table.denoised);

    let result = ValidationEngine::default().validate(&reloaded);
    io::write_validation(&validation_path, &result).unwrap();
    let text = std::fs::read_to_string(&validation_path).unwrap();
    assert_eq!(text.lines().count(), 121);
    assert!(text.starts_with("Time,Raw_AccX_m/s2,Denoised_AccX_m/s2,Raw_PosX_m,Denoised_PosX_m"));

    for path in [samples_path, denoised_path, validation_path] {
        let _ = std::fs::remove_file(path);
    }
}

#[test]
fn test_rate_override_survives_csv() {
    let path = scratch("override.csv");
    // Time column says 10 Hz; the data is treated as 50 Hz.
    let series = stationary(150, 0.02, 17);
    let pipeline = DenoisingPipeline::new(FilterConfig::default()).unwrap();
    let table = pipeline.run_with_rate(&series, 50.0).unwrap();
    let before = ValidationEngine::default().validate(&table);

    io::write_denoised(&path, &table).unwrap();
    let reloaded = io::read_denoised(&path).unwrap();
    let after = ValidationEngine::default().validate(&reloaded);

    assert_relative_eq!(reloaded.sampling.fs, 50.0, epsilon = 1e-6);
    for axis in Axis::ALL {
        let (b, a) = (before.drift(axis), after.drift(axis));
        assert_relative_eq!(a.raw, b.raw, max_relative = 1e-6);
        assert_relative_eq!(a.denoised, b.denoised, max_relative = 1e-6);
    }

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_fallback_survives_csv() {
    let path = scratch("fallback.csv");
    let base = stationary(80, 0.0, 19);
    let series = SampleSeries::without_time(
        base.axis(Axis::X).to_vec(),
        base.axis(Axis::Y).to_vec(),
        base.axis(Axis::Z).to_vec(),
    )
    .unwrap();
    let table = DenoisingPipeline::new(FilterConfig::default())
        .unwrap()
        .run(&series)
        .unwrap();
    assert_eq!(table.sampling.fallback, Some(TimestampIssue::Missing));

    io::write_denoised(&path, &table).unwrap();
    let reloaded = io::read_denoised(&path).unwrap();
    assert_eq!(reloaded.sampling.fallback, Some(TimestampIssue::Missing));
    assert!(!reloaded.sampling.is_reliable());
    assert!(!ValidationEngine::default().validate(&reloaded).sampling.is_reliable());

    let _ = std::fs::remove_file(path);
}

#[test]
fn test_json_config_file() {
    let path = scratch("config.json");
    std::fs::write(&path, r#"{"median": false, "cutoff_hz": 1.5}"#).unwrap();

    let config = FilterConfig::from_json_file(&path).unwrap();
    assert!(!config.is_enabled(Stage::Median));
    assert!(config.is_enabled(Stage::Kalman));
    assert_eq!(config.cutoff_hz, 1.5);

    std::fs::write(&path, r#"{"median_window": 4}"#).unwrap();
    assert!(FilterConfig::from_json_file(&path).is_err());

    let _ = std::fs::remove_file(path);
}
