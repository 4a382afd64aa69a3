//! Property-based tests for filter and integrator invariants.

use accel_denoise::filters::{median_filter, offset_calibrate, savgol_filter, zero_phase_lowpass};
use accel_denoise::{
    integrate, Axis, DenoisingPipeline, FilterConfig, SampleSeries, ScalarKalmanFilter, Stage,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

// =========================================================================
// Kalman convergence
// =========================================================================
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_kalman_converges_to_constant(
        level in -100.0f64..100.0,
        sigma in 0.1f64..5.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, sigma).unwrap();
        let mut kf = ScalarKalmanFilter::new(0.01, 0.5).unwrap();

        let mut previous = kf.error_covariance();
        let mut estimates = Vec::with_capacity(500);
        for _ in 0..500 {
            estimates.push(kf.update(level + noise.sample(&mut rng)));
            let p = kf.error_covariance();
            prop_assert!(p >= 0.0);
            prop_assert!(p <= previous + 1e-15, "covariance grew: {} -> {}", previous, p);
            previous = p;
        }

        let tail = &estimates[300..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        prop_assert!((mean - level).abs() < 0.5 * sigma, "tail mean {} vs {}", mean, level);
        prop_assert!((kf.estimate() - level).abs() < 2.0 * sigma);
    }
}

// =========================================================================
// Length preservation
// =========================================================================
proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_pipeline_preserves_length(
        flags in proptest::array::uniform5(any::<bool>()),
        values in proptest::collection::vec(-20000.0f64..20000.0, 11..150),
    ) {
        let n = values.len();
        let mut config = FilterConfig::default();
        for (stage, enabled) in Stage::CANONICAL_ORDER.into_iter().zip(flags) {
            config = config.with_stage(stage, enabled);
        }

        let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let reversed: Vec<f64> = values.iter().rev().copied().collect();
        let series = SampleSeries::new(time, values.clone(), reversed, values).unwrap();

        let out = DenoisingPipeline::new(config).unwrap().run(&series).unwrap();
        prop_assert_eq!(out.len(), n);
        for axis in Axis::ALL {
            prop_assert_eq!(out.denoised[axis].len(), n);
        }
    }

    #[test]
    fn test_stages_preserve_length(
        values in proptest::collection::vec(-1000.0f64..1000.0, 11..120),
        half_window in 0usize..5,
    ) {
        let n = values.len();
        prop_assert_eq!(offset_calibrate(&values, n.min(100)).unwrap().len(), n);
        prop_assert_eq!(zero_phase_lowpass(&values, 2.0, 10.0).unwrap().len(), n);
        prop_assert_eq!(median_filter(&values, 2 * half_window + 1).unwrap().len(), n);
        prop_assert_eq!(savgol_filter(&values, 11, 3).unwrap().len(), n);
    }

    #[test]
    fn test_passthrough_is_exact(
        values in proptest::collection::vec(-1e6f64..1e6, 0..80),
    ) {
        let n = values.len();
        let series = SampleSeries::without_time(values.clone(), values.clone(), values).unwrap();
        let pipeline = DenoisingPipeline::new(FilterConfig::passthrough()).unwrap();
        let out = pipeline.run(&series).unwrap();
        prop_assert_eq!(&out.denoised, series.acc());
        prop_assert_eq!(out.len(), n);
    }
}

// =========================================================================
// Integrator
// =========================================================================
proptest! {
    #[test]
    fn test_constant_acceleration_closed_form(
        a in -50.0f64..50.0,
        steps in 1usize..400,
        dt in 0.001f64..0.5,
    ) {
        let k = integrate(&vec![a; steps + 1], dt);
        let t = steps as f64 * dt;
        let expected = 0.5 * a * t * t;
        prop_assert!((k.final_position() - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        prop_assert_eq!(k.position[0], 0.0);
    }
}
