//! PI gain derivation from the process model (lambda / IMC tuning).
//!
//! Gains are computed once at controller construction and are fixed for the
//! controller's lifetime. Invalid tuning parameters abort construction; the
//! controller never runs with ad-hoc gains.

use serde::{Deserialize, Serialize};

use crate::config::ProcessModel;
use crate::error::{ControlError, ControlResult};

/// Proportional and integral gains over the normalized error.
///
/// `kc` is unitless (command per unit of normalized error); `ki` is per
/// second (command per unit of accumulated normalized error·seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PiGains {
    pub kc: f64,
    pub ki: f64,
}

impl PiGains {
    /// Derive gains from a first-order-plus-dead-time model:
    ///
    /// ```text
    /// Kc = (tau * range) / (Kp_proc * (lambda + theta))
    /// Ki = range / (Kp_proc * (lambda + theta))
    /// ```
    ///
    /// `temp_range_c` is the (floored) configured temperature span; the
    /// factor maps the normalized error back to °C so that `Kp_proc` can be
    /// specified in physical units.
    ///
    /// # Errors
    ///
    /// `InvalidTuning` when any model parameter is not strictly positive or
    /// `lambda + theta` is not strictly positive.
    pub fn derive(model: &ProcessModel, temp_range_c: f64) -> ControlResult<Self> {
        let kp_proc = model.gain_c_per_unit;
        let tau = model.time_constant_s;
        let theta = model.dead_time_s;
        let lambda = model.lambda_s;

        // NaN slips past plain `<= 0.0` checks, so finiteness is part of
        // the positivity requirement.
        positive(kp_proc, "process gain must be positive and finite")?;
        positive(tau, "process time constant must be positive and finite")?;
        positive(theta, "dead time must be positive and finite")?;
        positive(lambda, "lambda must be positive and finite")?;
        positive(lambda + theta, "lambda + dead time must be positive and finite")?;

        let kc = (tau * temp_range_c) / (kp_proc * (lambda + theta));
        let ki = temp_range_c / (kp_proc * (lambda + theta));
        Ok(Self { kc, ki })
    }
}

fn positive(value: f64, what: &'static str) -> ControlResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ControlError::InvalidTuning { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(kp: f64, tau: f64, theta: f64, lambda: f64) -> ProcessModel {
        ProcessModel {
            gain_c_per_unit: kp,
            time_constant_s: tau,
            dead_time_s: theta,
            lambda_s: lambda,
        }
    }

    #[test]
    fn default_tuning_gains() {
        let gains = PiGains::derive(&ProcessModel::default(), 23.0).unwrap();
        // tau*range / (Kp*(lambda+theta)) = 5400*23 / (4*6300)
        assert!((gains.kc - 4.928_571_428_571_429).abs() < 1e-12);
        // range / (Kp*(lambda+theta)) = 23 / 25200
        assert!((gains.ki - 9.126_984_126_984_127e-4).abs() < 1e-15);
        // Ki is always Kc / tau for this rule.
        assert!((gains.ki - gains.kc / 5400.0).abs() < 1e-15);
    }

    #[test]
    fn invalid_parameters_fail_construction() {
        assert!(PiGains::derive(&model(0.0, 5400.0, 900.0, 5400.0), 23.0).is_err());
        assert!(PiGains::derive(&model(4.0, -1.0, 900.0, 5400.0), 23.0).is_err());
        assert!(PiGains::derive(&model(4.0, 5400.0, 0.0, 5400.0), 23.0).is_err());
        assert!(PiGains::derive(&model(4.0, 5400.0, 900.0, -5400.0), 23.0).is_err());
    }

    #[test]
    fn non_finite_parameters_fail_construction() {
        assert!(PiGains::derive(&model(f64::NAN, 5400.0, 900.0, 5400.0), 23.0).is_err());
        assert!(PiGains::derive(&model(4.0, f64::INFINITY, 900.0, 5400.0), 23.0).is_err());
    }
}
