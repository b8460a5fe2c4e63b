//! Integral action with separation, anti-windup and exponential bleed.
//!
//! The accumulator integrates normalized error over time
//! (normalized-error·seconds). On the heat side it only charges while the
//! estimated output is below saturation; on the cool side and in-band its
//! *contribution* `Ki * accum` is decayed exponentially toward zero with the
//! same time constant as the command decay, keeping bleed behavior unified
//! with the decision logic.

use crate::band::Band;
use crate::filter::exp_step;
use crate::tuning::PiGains;

/// Advance the integral accumulator by one tick. Returns the new value.
///
/// No-op when `dt` is unknown (first tick). The feed-forward contribution is
/// included in the saturation estimate so the accumulator does not wind up
/// against an output that feed-forward has already pushed to the limit.
pub fn update_accumulator(
    accum: f64,
    gains: &PiGains,
    norm_error: f64,
    band: Band,
    dt_s: Option<f64>,
    u_ff: f64,
    decay_tau_s: f64,
) -> f64 {
    let Some(dt) = dt_s.filter(|dt| *dt > 0.0) else {
        return accum;
    };

    match band {
        Band::Heat => {
            let u_pi_est = gains.kc * norm_error + gains.ki * accum;
            let u_total_est = u_pi_est + u_ff;
            if u_pi_est < 1.0 && u_total_est < 1.0 {
                accum + norm_error * dt
            } else {
                accum
            }
        }
        Band::Cool | Band::InBand => {
            if decay_tau_s > 0.0 {
                let alpha = exp_step(Some(dt), decay_tau_s);
                let u_i_new = (1.0 - alpha) * gains.ki * accum;
                if gains.ki > 0.0 {
                    (u_i_new / gains.ki).max(0.0)
                } else {
                    0.0
                }
            } else {
                0.0
            }
        }
    }
}

/// PI output for the current tick: `(u_pi, u_i)` where
/// `u_i = Ki * accum` and `u_pi = Kc * norm_error + u_i`.
///
/// No clamping happens here; that is the command decision's responsibility.
pub fn pi_output(gains: &PiGains, norm_error: f64, accum: f64) -> (f64, f64) {
    let u_i = gains.ki * accum;
    let u_pi = gains.kc * norm_error + u_i;
    (u_pi, u_i)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_gains() -> impl Strategy<Value = PiGains> {
        (0.1_f64..20.0, 1e-5_f64..0.1).prop_map(|(kc, ki)| PiGains { kc, ki })
    }

    proptest! {
        #[test]
        fn anti_windup_never_charges_while_saturated(
            gains in arb_gains(),
            accum in 0.0_f64..10_000.0,
            norm_error in 0.0_f64..1.0,
            dt in 0.1_f64..600.0,
            u_ff in 0.0_f64..2.0,
        ) {
            let next = update_accumulator(accum, &gains, norm_error, Band::Heat, Some(dt), u_ff, 900.0);
            let u_total_est = gains.kc * norm_error + gains.ki * accum + u_ff;
            if u_total_est >= 1.0 {
                prop_assert!(next <= accum);
            }
        }

        #[test]
        fn in_band_is_non_increasing(
            gains in arb_gains(),
            accum in 0.0_f64..10_000.0,
            dt in 0.1_f64..600.0,
        ) {
            let next = update_accumulator(accum, &gains, 0.0, Band::InBand, Some(dt), 0.0, 900.0);
            prop_assert!(next <= accum);
        }

        #[test]
        fn cool_side_strictly_decreases_positive_charge(
            gains in arb_gains(),
            accum in 1e-6_f64..10_000.0,
            dt in 0.1_f64..600.0,
            decay_tau in 1.0_f64..10_000.0,
        ) {
            let next = update_accumulator(accum, &gains, 0.0, Band::Cool, Some(dt), 0.0, decay_tau);
            prop_assert!(next < accum);
            prop_assert!(next >= 0.0);
        }
    }
}
