//! Double integration of acceleration to velocity and position.
//!
//! Both integrals use the cumulative trapezoidal rule with a constant step
//! and are anchored at zero on the first sample. The computation is
//! sequential: reordering samples changes the result.

/// Velocity and position obtained from one acceleration series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Kinematics {
    /// Velocity, one sample per input sample, `velocity[0] = 0`.
    pub velocity: Vec<f64>,
    /// Position, one sample per input sample, `position[0] = 0`.
    pub position: Vec<f64>,
}

impl Kinematics {
    /// Final position sample, or zero for an empty series.
    #[must_use]
    pub fn final_position(&self) -> f64 {
        self.position.last().copied().unwrap_or(0.0)
    }

    /// Final velocity sample, or zero for an empty series.
    #[must_use]
    pub fn final_velocity(&self) -> f64 {
        self.velocity.last().copied().unwrap_or(0.0)
    }
}

/// Cumulative trapezoidal integral of `y` with step `dt`, starting at zero.
///
/// The output has the same length as the input.
#[must_use]
pub fn cumulative_trapezoid(y: &[f64], dt: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(y.len());
    if y.is_empty() {
        return out;
    }

    let mut acc = 0.0;
    out.push(acc);
    for w in y.windows(2) {
        acc += 0.5 * (w[0] + w[1]) * dt;
        out.push(acc);
    }
    out
}

/// Integrate acceleration twice, returning velocity and position.
#[must_use]
pub fn integrate(acc: &[f64], dt: f64) -> Kinematics {
    let velocity = cumulative_trapezoid(acc, dt);
    let position = cumulative_trapezoid(&velocity, dt);
    Kinematics { velocity, position }
}

/// Position series obtained by integrating acceleration twice.
#[must_use]
pub fn estimate_position(acc: &[f64], dt: f64) -> Vec<f64> {
    integrate(acc, dt).position
}

/// Drift of an acceleration series: magnitude of the final integrated position.
#[must_use]
pub fn drift(acc: &[f64], dt: f64) -> f64 {
    integrate(acc, dt).final_position().abs()
}
