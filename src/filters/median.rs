//! Sliding-window median filter.

use crate::error::{DenoiseError, Result};

/// Map an out-of-range index onto the series by reflection about the edges
/// (`d c b a | a b c d | d c b a`).
fn reflect_index(index: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = index.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

/// Median of each odd-length window centred on every sample.
///
/// Windows that overhang either end are filled by reflecting the series
/// about that edge, so the output has the same length as the input.
///
/// # Errors
///
/// Returns [`DenoiseError::InvalidConfig`] if `window` is zero or even.
pub fn median_filter(series: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 || window % 2 == 0 {
        return Err(DenoiseError::invalid_config(format!(
            "median window must be odd, got {window}"
        )));
    }

    let n = series.len();
    if n == 0 || window == 1 {
        return Ok(series.to_vec());
    }

    let half = (window / 2) as isize;
    let mut buffer = Vec::with_capacity(window);

    let out = (0..n as isize)
        .map(|i| {
            buffer.clear();
            buffer.extend((i - half..=i + half).map(|j| series[reflect_index(j, n)]));
            buffer.sort_by(f64::total_cmp);
            buffer[window / 2]
        })
        .collect();

    Ok(out)
}
