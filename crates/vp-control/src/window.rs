//! Window-open detection from rapid temperature drops.
//!
//! A rolling reference temperature/timestamp pair is refreshed at a minimum
//! interval; when the drop rate between checks exceeds the configured
//! threshold, heating is suppressed for a fixed duration.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::WindowConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDetector {
    config: WindowConfig,
    last_temp_c: Option<f64>,
    last_check_s: Option<f64>,
    open_until_s: Option<f64>,
}

impl WindowDetector {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            last_temp_c: None,
            last_check_s: None,
            open_until_s: None,
        }
    }

    /// Whether a suppression window is currently active.
    pub fn is_open(&self, now_s: f64) -> bool {
        self.open_until_s.is_some_and(|until| now_s < until)
    }

    /// End of the active suppression window, if any.
    pub fn suppressed_until_s(&self) -> Option<f64> {
        self.open_until_s
    }

    /// Run one detection check. Returns true while window-open suppression
    /// is active (newly triggered or still running).
    pub fn check(&mut self, current_c: f64, now_s: f64) -> bool {
        if let Some(until) = self.open_until_s {
            if now_s < until {
                return true;
            }
            self.open_until_s = None;
            info!("window-open suppression expired, resuming normal control");
        }

        let (Some(ref_temp), Some(ref_time)) = (self.last_temp_c, self.last_check_s) else {
            self.last_temp_c = Some(current_c);
            self.last_check_s = Some(now_s);
            return false;
        };

        let dt = now_s - ref_time;
        // Too-frequent checks amplify sensor noise into spurious rates.
        if dt < self.config.check_min_interval_s {
            return false;
        }

        let delta_t = current_c - ref_temp;
        let rate_per_min = (delta_t / dt) * 60.0;

        // Rolling baseline: updated on every check regardless of outcome.
        self.last_temp_c = Some(current_c);
        self.last_check_s = Some(now_s);

        if rate_per_min < -self.config.threshold_c_per_min {
            self.open_until_s = Some(now_s + self.config.suppress_duration_s);
            warn!(
                drop_c = delta_t,
                window_s = dt,
                rate_c_per_min = rate_per_min,
                suppress_s = self.config.suppress_duration_s,
                "window open detected, suppressing heat"
            );
            return true;
        }

        false
    }
}
