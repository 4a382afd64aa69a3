//! Zero-phase Butterworth low-pass filtering.
//!
//! A second-order Butterworth section is designed with the pre-warped
//! bilinear transform and applied forward then backward, so the output has
//! no group delay: sample `i` of the output is aligned with sample `i` of
//! the input.
//!
//! ## Edge Handling
//!
//! Before filtering, the series is extended at both ends by an odd
//! reflection of `3 · max(len(a), len(b)) = 9` samples (fewer for very
//! short series), and each pass starts from the steady-state filter
//! condition scaled by its first sample. This keeps start-up transients out
//! of the returned window.

use std::f64::consts::{PI, SQRT_2};

use crate::error::{DenoiseError, Result};

/// Odd-extension length used on each side of the series.
pub const PAD_LEN: usize = 9;

/// Coefficients of one biquad section with `a0 = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feed-forward coefficients `[b0, b1, b2]`.
    pub b: [f64; 3],
    /// Feedback coefficients `[a1, a2]`.
    pub a: [f64; 2],
}

impl BiquadCoefficients {
    /// Gain at 0 Hz.
    #[must_use]
    pub fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (1.0 + self.a[0] + self.a[1])
    }

    /// Internal state reached after an infinitely long unit input.
    #[must_use]
    pub fn steady_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        [
            self.b[1] + self.b[2] - (self.a[0] + self.a[1]) * g,
            self.b[2] - self.a[1] * g,
        ]
    }

    /// Run the section over `input` once, starting from `state`
    /// (transposed direct form II).
    #[must_use]
    pub fn apply(&self, input: &[f64], mut state: [f64; 2]) -> Vec<f64> {
        let [b0, b1, b2] = self.b;
        let [a1, a2] = self.a;
        input
            .iter()
            .map(|&x| {
                let y = b0 * x + state[0];
                state[0] = b1 * x - a1 * y + state[1];
                state[1] = b2 * x - a2 * y;
                y
            })
            .collect()
    }
}

/// Design a second-order Butterworth low-pass section.
///
/// # Errors
///
/// Returns [`DenoiseError::InvalidConfig`] if `fs` is not positive, or if
/// `cutoff_hz` is not strictly between zero and the Nyquist frequency `fs / 2`.
pub fn butterworth_lowpass(cutoff_hz: f64, fs: f64) -> Result<BiquadCoefficients> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(DenoiseError::invalid_config(format!(
            "sampling rate must be positive, got {fs} Hz"
        )));
    }
    let nyquist = fs / 2.0;
    if !(cutoff_hz.is_finite() && cutoff_hz > 0.0) {
        return Err(DenoiseError::invalid_config(format!(
            "cutoff must be positive, got {cutoff_hz} Hz"
        )));
    }
    if cutoff_hz >= nyquist {
        return Err(DenoiseError::invalid_config(format!(
            "cutoff {cutoff_hz} Hz must be below the Nyquist frequency {nyquist} Hz"
        )));
    }

    // Pre-warped analog cutoff
    let c = (PI * cutoff_hz / fs).tan();
    let c2 = c * c;
    let d = c2 + SQRT_2 * c + 1.0;
    let b0 = c2 / d;

    Ok(BiquadCoefficients {
        b: [b0, 2.0 * b0, b0],
        a: [2.0 * (c2 - 1.0) / d, (1.0 - SQRT_2 * c + c2) / d],
    })
}

/// Forward-backward application of `coeffs` over `series`.
#[must_use]
pub fn filtfilt(coeffs: &BiquadCoefficients, series: &[f64]) -> Vec<f64> {
    let n = series.len();
    if n < 2 {
        return series.to_vec();
    }

    let pad = PAD_LEN.min(n - 1);
    let first = series[0];
    let last = series[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|k| 2.0 * first - series[k]));
    extended.extend_from_slice(series);
    extended.extend((1..=pad).map(|k| 2.0 * last - series[n - 1 - k]));

    let zi = coeffs.steady_state();

    let x0 = extended[0];
    let mut forward = coeffs.apply(&extended, [zi[0] * x0, zi[1] * x0]);
    forward.reverse();

    let y0 = forward[0];
    let mut backward = coeffs.apply(&forward, [zi[0] * y0, zi[1] * y0]);
    backward.reverse();

    backward[pad..pad + n].to_vec()
}

/// Zero-phase low-pass with cutoff `cutoff_hz` at sampling rate `fs`.
///
/// # Errors
///
/// Returns [`DenoiseError::InvalidConfig`] if `cutoff_hz >= fs / 2` or either
/// frequency is not positive.
pub fn zero_phase_lowpass(series: &[f64], cutoff_hz: f64, fs: f64) -> Result<Vec<f64>> {
    let coeffs = butterworth_lowpass(cutoff_hz, fs)?;
    Ok(filtfilt(&coeffs, series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(n: usize, freq: f64, fs: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_unity_dc_gain() {
        let coeffs = butterworth_lowpass(2.0, 10.0).unwrap();
        assert_relative_eq!(coeffs.dc_gain(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_passes_unchanged() {
        let series = vec![42.0; 50];
        let out = zero_phase_lowpass(&series, 2.0, 10.0).unwrap();
        for v in out {
            assert_relative_eq!(v, 42.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_nyquist_boundary() {
        let series = vec![1.0; 20];
        let err = zero_phase_lowpass(&series, 5.0, 10.0).unwrap_err();
        assert!(err.is_config_violation());
        assert!(zero_phase_lowpass(&series, 6.0, 10.0).is_err());

        let out = zero_phase_lowpass(&series, 4.999, 10.0).unwrap();
        assert_eq!(out.len(), series.len());
    }

    #[test]
    fn test_attenuates_high_frequency() {
        let fs = 100.0;
        let noise = sine(400, 30.0, fs);
        let out = zero_phase_lowpass(&noise, 2.0, fs).unwrap();
        let rms = (out[100..300].iter().map(|v| v * v).sum::<f64>() / 200.0).sqrt();
        assert!(rms < 0.01, "high frequency leaked: rms = {rms}");
    }

    #[test]
    fn test_zero_phase_alignment() {
        let fs = 100.0;
        let slow = sine(400, 0.5, fs);
        let out = zero_phase_lowpass(&slow, 5.0, fs).unwrap();
        for i in 50..350 {
            assert_relative_eq!(out[i], slow[i], epsilon = 0.01);
        }
    }

    #[test]
    fn test_short_series() {
        assert!(zero_phase_lowpass(&[], 2.0, 10.0).unwrap().is_empty());
        assert_eq!(zero_phase_lowpass(&[3.0], 2.0, 10.0).unwrap(), vec![3.0]);
        assert_eq!(zero_phase_lowpass(&[1.0, 2.0, 3.0], 2.0, 10.0).unwrap().len(), 3);
    }
}
