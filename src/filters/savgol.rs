//! Savitzky–Golay smoothing.
//!
//! Each output sample is the value at the window centre of a least-squares
//! polynomial fitted to the surrounding window. Interior samples reduce to a
//! fixed convolution; the first and last `window / 2` samples are evaluated
//! from polynomials fitted to the first and last full windows.
//!
//! The least-squares solve uses the SVD pseudo-inverse of the window's
//! Vandermonde matrix from nalgebra.

use nalgebra::{DMatrix, DVector};

use crate::error::{DenoiseError, Result};

/// Singular values below this are treated as zero in the pseudo-inverse.
const PINV_EPS: f64 = 1e-12;

/// Force a window length to be odd by incrementing even values.
#[must_use]
pub const fn normalize_window(window: usize) -> usize {
    if window % 2 == 0 {
        window + 1
    } else {
        window
    }
}

/// Vandermonde matrix over window offsets `-half..=half`.
fn vandermonde(window: usize, order: usize) -> DMatrix<f64> {
    let half = (window / 2) as f64;
    DMatrix::from_fn(window, order + 1, |i, j| (i as f64 - half).powi(j as i32))
}

/// Least-squares projector mapping a window of samples to polynomial coefficients.
fn fit_operator(window: usize, order: usize) -> Result<DMatrix<f64>> {
    vandermonde(window, order)
        .svd(true, true)
        .pseudo_inverse(PINV_EPS)
        .map_err(DenoiseError::linalg)
}

/// Evaluate `Σ coeffs[j] · x^j`.
fn eval_poly(coeffs: &DVector<f64>, x: f64) -> f64 {
    coeffs.as_slice().iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn check_params(window: usize, order: usize) -> Result<usize> {
    let window = normalize_window(window);
    if order >= window {
        return Err(DenoiseError::invalid_config(format!(
            "polynomial order {order} must be less than window length {window}"
        )));
    }
    Ok(window)
}

/// Convolution coefficients that smooth the centre sample of a window.
///
/// # Errors
///
/// Returns an error if `order` is not less than the normalized window, or
/// the least-squares solve fails.
pub fn savgol_coefficients(window: usize, order: usize) -> Result<Vec<f64>> {
    let window = check_params(window, order)?;
    let op = fit_operator(window, order)?;
    Ok(op.row(0).iter().copied().collect())
}

/// Savitzky–Golay smoothing with window `window` (forced odd) and
/// polynomial order `order`.
///
/// # Errors
///
/// Returns [`DenoiseError::InvalidConfig`] if `order` is not less than the
/// normalized window, and [`DenoiseError::SeriesTooShort`] if a non-empty
/// series is shorter than the window.
pub fn savgol_filter(series: &[f64], window: usize, order: usize) -> Result<Vec<f64>> {
    let window = check_params(window, order)?;
    let n = series.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if n < window {
        return Err(DenoiseError::series_too_short(window, n));
    }

    let op = fit_operator(window, order)?;
    let half = window / 2;
    let centre: Vec<f64> = op.row(0).iter().copied().collect();

    let mut out = vec![0.0; n];

    for i in half..n - half {
        let segment = &series[i - half..=i + half];
        out[i] = centre.iter().zip(segment).map(|(c, v)| c * v).sum();
    }

    // Edge samples come from the polynomial fitted to the outermost windows.
    let head = &op * DVector::from_column_slice(&series[..window]);
    for (i, slot) in out.iter_mut().enumerate().take(half) {
        *slot = eval_poly(&head, i as f64 - half as f64);
    }

    let tail_start = n - window;
    let tail = &op * DVector::from_column_slice(&series[tail_start..]);
    for (i, slot) in out.iter_mut().enumerate().skip(n - half) {
        *slot = eval_poly(&tail, (i - tail_start) as f64 - half as f64);
    }

    Ok(out)
}
