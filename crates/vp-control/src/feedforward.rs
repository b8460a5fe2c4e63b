//! Feed-forward estimation from secondary temperature signals.
//!
//! Two optional signals (boiler flow and outdoor temperature) are smoothed
//! independently, deadbanded, and combined into an additive command
//! contribution. No rate limiting is applied; robustness against fast swings
//! comes entirely from the EWMA filters and the deadbands. The output is
//! unbounded here and only clamped when combined with the PI term.

use serde::{Deserialize, Serialize};

use crate::config::FeedForwardConfig;
use crate::filter::{Ewma, apply_deadband};

/// Feed-forward estimator state: one filter per signal plus its own timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForward {
    config: FeedForwardConfig,
    flow: Ewma,
    outdoor: Ewma,
    last_update_s: Option<f64>,
}

impl FeedForward {
    pub fn new(config: FeedForwardConfig) -> Self {
        let flow = Ewma::new(config.flow_tau_s, config.smoothing);
        let outdoor = Ewma::new(config.outdoor_tau_s, config.smoothing);
        Self {
            config,
            flow,
            outdoor,
            last_update_s: None,
        }
    }

    /// Filtered flow temperature, for diagnostics.
    pub fn flow_filtered_c(&self) -> Option<f64> {
        self.flow.value()
    }

    /// Filtered outdoor temperature, for diagnostics.
    pub fn outdoor_filtered_c(&self) -> Option<f64> {
        self.outdoor.value()
    }

    /// Update filters from the current raw readings and return the total
    /// feed-forward contribution. Absent readings contribute nothing and
    /// leave their filter state untouched.
    pub fn estimate(&mut self, flow_c: Option<f64>, outdoor_c: Option<f64>, now_s: f64) -> f64 {
        let dt_s = self.last_update_s.map(|t| (now_s - t).max(0.0));
        self.last_update_s = Some(now_s);

        if let Some(raw) = flow_c {
            self.flow.update(raw, dt_s);
        }
        if let Some(raw) = outdoor_c {
            self.outdoor.update(raw, dt_s);
        }

        let mut u_ff = 0.0;
        if let Some(flow) = self.flow.value() {
            if self.config.k_flow != 0.0 {
                let delta = apply_deadband(self.config.flow_ref_c - flow, self.config.flow_deadband_c);
                u_ff += self.config.k_flow * delta;
            }
        }
        if let Some(outdoor) = self.outdoor.value() {
            if self.config.k_outdoor != 0.0 {
                let delta = apply_deadband(
                    self.config.outdoor_ref_c - outdoor,
                    self.config.outdoor_deadband_c,
                );
                u_ff += self.config.k_outdoor * delta;
            }
        }
        u_ff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FeedForwardConfig {
        FeedForwardConfig::default()
    }

    #[test]
    fn no_signals_no_contribution() {
        let mut ff = FeedForward::new(config());
        assert_eq!(ff.estimate(None, None, 0.0), 0.0);
        assert_eq!(ff.flow_filtered_c(), None);
    }

    #[test]
    fn cold_flow_opens_valve() {
        let mut ff = FeedForward::new(config());
        // 10 K below the 55 C reference, 0.5 K deadband, k = 0.02
        let u = ff.estimate(Some(45.0), None, 0.0);
        assert!((u - 0.02 * 9.5).abs() < 1e-12);
    }

    #[test]
    fn both_signals_accumulate() {
        let mut ff = FeedForward::new(config());
        let u = ff.estimate(Some(45.0), Some(0.0), 0.0);
        // flow: 0.02 * 9.5; outdoor: 0.01 * (10 - 0 - 0.5)
        assert!((u - (0.02 * 9.5 + 0.01 * 9.5)).abs() < 1e-12);
    }

    #[test]
    fn delta_within_deadband_contributes_nothing() {
        let mut ff = FeedForward::new(config());
        let u = ff.estimate(Some(54.8), Some(10.2), 0.0);
        assert_eq!(u, 0.0);
    }

    #[test]
    fn smoothing_lags_a_step_change() {
        let mut ff = FeedForward::new(config());
        ff.estimate(Some(55.0), None, 0.0);
        // Flow crashes 20 K; with tau = 300 s and dt = 30 s, the filtered
        // value has only moved a fraction of the way down.
        ff.estimate(Some(35.0), None, 30.0);
        let filtered = ff.flow_filtered_c().unwrap();
        assert!(filtered > 35.0 && filtered < 55.0);
        let alpha = 1.0 - (-30.0_f64 / 300.0).exp();
        assert!((filtered - (55.0 - alpha * 20.0)).abs() < 1e-9);
    }

    #[test]
    fn absent_reading_keeps_filter_state() {
        let mut ff = FeedForward::new(config());
        ff.estimate(Some(45.0), None, 0.0);
        let u = ff.estimate(None, None, 60.0);
        assert_eq!(ff.flow_filtered_c(), Some(45.0));
        assert!((u - 0.02 * 9.5).abs() < 1e-12);
    }

    #[test]
    fn zero_gain_disables_contribution() {
        let mut ff = FeedForward::new(FeedForwardConfig {
            k_flow: 0.0,
            ..config()
        });
        assert_eq!(ff.estimate(Some(30.0), None, 0.0), 0.0);
    }
}
