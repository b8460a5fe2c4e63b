//! Signal conditioning: exponential smoothing and deadbands.

use serde::{Deserialize, Serialize};

/// Exponential step factor in [0, 1] for time step `dt` and time constant
/// `tau`: `1 - exp(-dt/tau)`.
///
/// Returns 1.0 when timing or tau are invalid, so callers fall back to
/// jumping straight to the target value.
pub fn exp_step(dt_s: Option<f64>, tau_s: f64) -> f64 {
    match dt_s {
        Some(dt) if dt > 0.0 && tau_s > 0.0 => 1.0 - (-dt / tau_s).exp(),
        _ => 1.0,
    }
}

/// Apply a symmetric deadband to `x`: zero within `±db`, shrunk toward zero
/// by `db` outside it.
pub fn apply_deadband(x: f64, db: f64) -> f64 {
    if db <= 0.0 {
        return x;
    }
    if x.abs() <= db {
        return 0.0;
    }
    if x > 0.0 { x - db } else { x + db }
}

/// Exponentially-weighted moving average with time constant `tau` seconds.
///
/// The filter seeds itself with the first raw sample. When smoothing is
/// disabled, `tau <= 0`, or timing is invalid, the raw value passes through
/// and becomes the new filter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ewma {
    tau_s: f64,
    enabled: bool,
    value: Option<f64>,
}

impl Ewma {
    pub fn new(tau_s: f64, enabled: bool) -> Self {
        Self {
            tau_s,
            enabled,
            value: None,
        }
    }

    /// Current filtered value, if any sample has been seen.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Feed a raw sample, returning the updated filtered value.
    pub fn update(&mut self, raw: f64, dt_s: Option<f64>) -> f64 {
        let next = match (self.enabled && self.tau_s > 0.0, dt_s, self.value) {
            (true, Some(dt), Some(prev)) if dt > 0.0 => {
                let alpha = 1.0 - (-dt / self.tau_s.max(1e-6)).exp();
                prev + alpha * (raw - prev)
            }
            _ => raw,
        };
        self.value = Some(next);
        next
    }
}
