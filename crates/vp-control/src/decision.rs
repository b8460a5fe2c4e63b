//! Command decision: blending the PI+FF suggestion with decay-to-closed.
//!
//! Near the setpoint the final command is a smoothstep-weighted blend of the
//! heating suggestion and an exponential decay toward fully closed. This
//! removes the hard flip at the setpoint crossing, trading a sharp step for
//! a smooth transition. Clearly on the heat side the suggestion is tracked
//! directly; clearly on the cool side the previous command decays to zero.
//!
//! The decay baseline `prev_u` must be the unquantized previous command, not
//! a value re-derived from the integer actuator position: a decay step too
//! small to move the rounded output would otherwise be dropped forever and
//! the valve would stall at a small opening.

use vp_core::clamp01;

use crate::band::Band;
use crate::filter::exp_step;

/// Cubic smoothstep `x^2 (3 - 2x)` on [0, 1].
pub fn smoothstep(x: f64) -> f64 {
    let x = clamp01(x);
    x * x * (3.0 - 2.0 * x)
}

/// Decide the final normalized command `u_total` in [0, 1].
///
/// * `u_pi`, `u_ff`: controller and feed-forward outputs for this tick.
/// * `error_c`: instantaneous error (target minus current).
/// * `band`: classification of `error_c` against the steady deadband.
/// * `dt_s`: elapsed time since the previous tick, `None` on the first.
/// * `decay_tau_s`: time constant for decay toward closed.
/// * `blend_halfwidth_c`: half-width of the soft zone around the setpoint.
/// * `prev_u`: previous committed normalized command (decay baseline).
pub fn decide_u_total(
    u_pi: f64,
    u_ff: f64,
    error_c: f64,
    band: Band,
    dt_s: Option<f64>,
    decay_tau_s: f64,
    blend_halfwidth_c: f64,
    prev_u: f64,
) -> f64 {
    let u_suggest = clamp01(u_pi + u_ff);
    let has_timing = dt_s.is_some_and(|dt| dt > 0.0) && decay_tau_s > 0.0;
    let u_decay = if has_timing {
        let alpha = exp_step(dt_s, decay_tau_s);
        (prev_u + alpha * (0.0 - prev_u)).max(0.0)
    } else {
        0.0
    };

    let eps_blend = blend_halfwidth_c.max(0.0);
    if eps_blend > 0.0 && error_c.abs() <= eps_blend {
        // Weight runs 0 at the coolest edge of the band to 1 at the warmest.
        let x = (error_c + eps_blend) / (2.0 * eps_blend);
        let w = smoothstep(x);
        return clamp01(w * u_suggest + (1.0 - w) * u_decay);
    }

    if band.is_heat() {
        return u_suggest;
    }

    u_decay
}
