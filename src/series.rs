//! Sample series data structures.
//!
//! This module defines the [`Axis`] enum, the axis-indexed [`AxisData`]
//! container and the [`SampleSeries`] consumed by the pipeline, along with
//! sampling-rate derivation from the time column.
//!
//! # Sampling Rate
//!
//! The sampling period is `time[1] - time[0]` and is assumed constant
//! thereafter. When the time column is absent, too short, non-finite or not
//! strictly increasing, a fallback of [`FALLBACK_SAMPLE_RATE_HZ`] is used
//! together with a synthetic evenly spaced time axis. The fallback is
//! recorded in [`Sampling::fallback`] so downstream consumers can tell that
//! derived physical quantities are unreliable.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DenoiseError, Result};

/// Sampling rate substituted when the time column cannot be trusted.
pub const FALLBACK_SAMPLE_RATE_HZ: f64 = 10.0;

/// One accelerometer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in column order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Position of this axis in [`AxisData`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Single-letter label used in column names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per axis, indexable by [`Axis`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisData<T>(pub [T; 3]);

impl<T> AxisData<T> {
    /// Build from explicit per-axis values.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Build by evaluating `f` once per axis, in X, Y, Z order.
    pub fn from_fn(mut f: impl FnMut(Axis) -> T) -> Self {
        Self([f(Axis::X), f(Axis::Y), f(Axis::Z)])
    }

    /// Map every axis value.
    pub fn map<U>(&self, mut f: impl FnMut(Axis, &T) -> U) -> AxisData<U> {
        AxisData::from_fn(|axis| f(axis, &self[axis]))
    }

    /// Like [`AxisData::map`] but short-circuits on the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map<U>(&self, mut f: impl FnMut(Axis, &T) -> Result<U>) -> Result<AxisData<U>> {
        Ok(AxisData([
            f(Axis::X, &self[Axis::X])?,
            f(Axis::Y, &self[Axis::Y])?,
            f(Axis::Z, &self[Axis::Z])?,
        ]))
    }

    /// Iterate `(axis, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &T)> {
        Axis::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Axis> for AxisData<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        &self.0[axis.index()]
    }
}

impl<T> IndexMut<Axis> for AxisData<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        &mut self.0[axis.index()]
    }
}

/// Why the time column was replaced by a synthetic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampIssue {
    /// No time column was supplied.
    Missing,
    /// Fewer than two timestamps, so no period can be measured.
    TooShort,
    /// A timestamp is NaN or infinite.
    NonFinite { index: usize },
    /// `time[index] <= time[index - 1]`.
    NonMonotonic { index: usize },
}

impl fmt::Display for TimestampIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "time column missing"),
            Self::TooShort => write!(f, "fewer than two timestamps"),
            Self::NonFinite { index } => write!(f, "non-finite timestamp at index {index}"),
            Self::NonMonotonic { index } => {
                write!(f, "timestamps not strictly increasing at index {index}")
            }
        }
    }
}

impl TimestampIssue {
    /// Compact code used in table columns: `missing`, `too_short`,
    /// `non_finite@<index>` or `non_monotonic@<index>`.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Missing => "missing".to_string(),
            Self::TooShort => "too_short".to_string(),
            Self::NonFinite { index } => format!("non_finite@{index}"),
            Self::NonMonotonic { index } => format!("non_monotonic@{index}"),
        }
    }
}

impl FromStr for TimestampIssue {
    type Err = String;

    /// Inverse of [`TimestampIssue::code`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, index) = match s.split_once('@') {
            Some((kind, index)) => {
                let index = index
                    .parse::<usize>()
                    .map_err(|e| format!("bad index in timestamp issue '{s}': {e}"))?;
                (kind, Some(index))
            }
            None => (s, None),
        };
        match (kind, index) {
            ("missing", None) => Ok(Self::Missing),
            ("too_short", None) => Ok(Self::TooShort),
            ("non_finite", Some(index)) => Ok(Self::NonFinite { index }),
            ("non_monotonic", Some(index)) => Ok(Self::NonMonotonic { index }),
            _ => Err(format!("unknown timestamp issue '{s}'")),
        }
    }
}

/// Sampling parameters derived once per series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    /// Sampling rate in Hz.
    pub fs: f64,
    /// Sampling period in seconds (`1 / fs`).
    pub dt: f64,
    /// Set when the fallback rate replaced the measured one.
    pub fallback: Option<TimestampIssue>,
}

impl Sampling {
    /// Sampling measured from a trusted time column.
    #[must_use]
    pub fn measured(dt: f64) -> Self {
        Self {
            fs: 1.0 / dt,
            dt,
            fallback: None,
        }
    }

    /// Sampling at an explicit rate, e.g. a caller override.
    #[must_use]
    pub fn from_rate(fs: f64) -> Self {
        Self {
            fs,
            dt: 1.0 / fs,
            fallback: None,
        }
    }

    /// Fallback sampling at [`FALLBACK_SAMPLE_RATE_HZ`].
    #[must_use]
    pub fn fallback(issue: TimestampIssue) -> Self {
        Self {
            fallback: Some(issue),
            ..Self::from_rate(FALLBACK_SAMPLE_RATE_HZ)
        }
    }

    /// Whether physical quantities derived with this sampling are trustworthy.
    #[must_use]
    pub const fn is_reliable(&self) -> bool {
        self.fallback.is_none()
    }

    /// Evenly spaced time axis `0, dt, 2dt, ...` of length `n`.
    #[must_use]
    pub fn synthetic_time(&self, n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * self.dt).collect()
    }
}

/// Inspect a time column and report the first problem, if any.
fn check_time_column(time: Option<&[f64]>) -> std::result::Result<f64, TimestampIssue> {
    let time = time.ok_or(TimestampIssue::Missing)?;
    if time.len() < 2 {
        return Err(TimestampIssue::TooShort);
    }
    if let Some(index) = time.iter().position(|t| !t.is_finite()) {
        return Err(TimestampIssue::NonFinite { index });
    }
    if let Some(index) = (1..time.len()).find(|&i| time[i] <= time[i - 1]) {
        return Err(TimestampIssue::NonMonotonic { index });
    }
    Ok(time[1] - time[0])
}

/// Derive the sampling rate from a time column.
///
/// Never fails: malformed timestamps produce [`Sampling::fallback`] and a
/// warning event.
#[must_use]
pub fn derive_sampling(time: Option<&[f64]>) -> Sampling {
    match check_time_column(time) {
        Ok(dt) => Sampling::measured(dt),
        Err(issue) => {
            warn!(
                %issue,
                fallback_hz = FALLBACK_SAMPLE_RATE_HZ,
                "malformed timestamps, substituting fallback sampling rate"
            );
            Sampling::fallback(issue)
        }
    }
}

/// Raw triaxial accelerometer recording.
///
/// Acceleration is in arbitrary units (typically sensor counts). Time is in
/// seconds; callers holding milliseconds must convert first.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    time: Option<Vec<f64>>,
    acc: AxisData<Vec<f64>>,
}

impl SampleSeries {
    /// Create a series from a time column and three acceleration columns.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::LengthMismatch`] if the columns differ in length.
    pub fn new(time: Vec<f64>, acc_x: Vec<f64>, acc_y: Vec<f64>, acc_z: Vec<f64>) -> Result<Self> {
        Self::from_parts(Some(time), AxisData::new(acc_x, acc_y, acc_z))
    }

    /// Create a series with no time column.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::LengthMismatch`] if the columns differ in length.
    pub fn without_time(acc_x: Vec<f64>, acc_y: Vec<f64>, acc_z: Vec<f64>) -> Result<Self> {
        Self::from_parts(None, AxisData::new(acc_x, acc_y, acc_z))
    }

    /// Create a series from an optional time column and axis-indexed data.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::LengthMismatch`] if the columns differ in length.
    pub fn from_parts(time: Option<Vec<f64>>, acc: AxisData<Vec<f64>>) -> Result<Self> {
        let n = acc[Axis::X].len();
        for (_, column) in acc.iter() {
            if column.len() != n {
                return Err(DenoiseError::length_mismatch(n, column.len()));
            }
        }
        if let Some(t) = &time {
            if t.len() != n {
                return Err(DenoiseError::length_mismatch(n, t.len()));
            }
        }
        Ok(Self { time, acc })
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.acc[Axis::X].len()
    }

    /// Whether the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The time column as supplied, if any.
    #[must_use]
    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }

    /// One axis of acceleration.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> &[f64] {
        &self.acc[axis]
    }

    /// All three axes.
    #[must_use]
    pub const fn acc(&self) -> &AxisData<Vec<f64>> {
        &self.acc
    }

    /// Derive sampling parameters from this series' time column.
    #[must_use]
    pub fn sampling(&self) -> Sampling {
        derive_sampling(self.time())
    }

    /// Time axis to report downstream: the supplied column when it is
    /// trustworthy, otherwise the synthetic one implied by `sampling`.
    #[must_use]
    pub fn time_axis(&self, sampling: &Sampling) -> Vec<f64> {
        match (&self.time, sampling.fallback) {
            (Some(t), None) => t.clone(),
            _ => sampling.synthetic_time(self.len()),
        }
    }
}
