//! Stateless stage filters for the denoising chain.
//!
//! This module provides:
//! - [`offset`]: at-rest offset calibration
//! - [`lowpass`]: zero-phase second-order Butterworth low-pass
//! - [`median`]: sliding-window median with reflected edges
//! - [`savgol`]: Savitzky–Golay polynomial smoothing
//!
//! Every function here is pure and returns a series of the same length as
//! its input.

pub mod lowpass;
pub mod median;
pub mod offset;
pub mod savgol;

pub use lowpass::{butterworth_lowpass, filtfilt, zero_phase_lowpass, BiquadCoefficients};
pub use median::median_filter;
pub use offset::{offset_calibrate, offset_calibrate_to};
pub use savgol::{normalize_window, savgol_coefficients, savgol_filter};
