//! Controller orchestration: one owned state struct, one tick entry point.
//!
//! All mutation funnels through [`Controller::tick`] and the explicit
//! command methods (`set_target_temperature`, `set_mode`, sensor updates).
//! The tick runs the pipeline in order: mode gate, window-open check, error
//! and timing, feed-forward, integral update, command decision, dispatch
//! planning. The host serializes calls; nothing here suspends or performs
//! I/O.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vp_core::{ActuatorId, clamp01};

use crate::band::Band;
use crate::config::{ControllerConfig, DT_EPSILON_S, WindowConfig};
use crate::decision::decide_u_total;
use crate::dispatch::{
    SendPlan, VALVE_CLOSED_POSITION, VALVE_OPEN_POSITION, ValveDispatcher, command_from_position,
    position_from_command,
};
use crate::error::ControlResult;
use crate::feedforward::FeedForward;
use crate::integral::{pi_output, update_accumulator};
use crate::mode::{HeatingAction, ModeRequest, OperatingMode};
use crate::tuning::PiGains;
use crate::window::WindowDetector;

/// Per-tick observability snapshot. Refreshed every tick, never read back
/// into control logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub error_c: Option<f64>,
    pub error_norm: Option<f64>,
    pub u_pi: Option<f64>,
    pub u_i: Option<f64>,
    pub u_ff: Option<f64>,
    pub u_total: Option<f64>,
    pub flow_filtered_c: Option<f64>,
    pub outdoor_filtered_c: Option<f64>,
    pub desired_position: u8,
    pub committed_position: u8,
    pub observed_position: Option<u8>,
    pub window_open: bool,
    pub kc: f64,
    pub ki: f64,
}

/// Result of one tick: a dispatch plan to execute (if a send is due) and
/// whether a running boost expired during this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEffect {
    pub plan: Option<SendPlan>,
    pub boost_expired: bool,
}

impl TickEffect {
    fn none() -> Self {
        Self {
            plan: None,
            boost_expired: false,
        }
    }
}

/// Result of a mode change: a forced dispatch plan (boost entry) and the
/// boost expiry the host should schedule a timer for, if any. The host is
/// expected to cancel any previous boost timer on every mode change and to
/// run a tick afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeChange {
    pub plan: Option<SendPlan>,
    pub boost_until_s: Option<f64>,
}

/// Closed-loop valve position controller for one zone.
pub struct Controller {
    config: ControllerConfig,
    gains: PiGains,
    mode: OperatingMode,
    target_c: f64,
    current_c: Option<f64>,
    flow_c: Option<f64>,
    outdoor_c: Option<f64>,
    /// Integral accumulator over normalized error (normalized-error·seconds).
    accum: f64,
    last_tick_s: Option<f64>,
    /// Previous committed normalized command; the unquantized decay baseline.
    last_u_total: Option<f64>,
    feed_forward: FeedForward,
    window: WindowDetector,
    dispatcher: ValveDispatcher,
    diag: Diagnostics,
}

impl Controller {
    /// Build a controller from configuration and the actuator set.
    ///
    /// Normalizes the configuration (swapped min/max, window threshold
    /// magnitude, clamped initial target) and derives PI gains; invalid
    /// process-model tuning fails construction.
    pub fn new(config: ControllerConfig, actuators: Vec<ActuatorId>) -> ControlResult<Self> {
        let mut config = config;
        if config.min_temp_c >= config.max_temp_c {
            warn!(
                min = config.min_temp_c,
                max = config.max_temp_c,
                "min_temp >= max_temp, swapping"
            );
            std::mem::swap(&mut config.min_temp_c, &mut config.max_temp_c);
        }
        config.initial_target_c = config.clamp_target(config.initial_target_c);
        config.window.threshold_c_per_min = config.window.threshold_c_per_min.abs();
        if config.window.threshold_c_per_min == 0.0 {
            config.window.threshold_c_per_min = WindowConfig::default().threshold_c_per_min;
        }

        let gains = PiGains::derive(&config.process, config.temp_range_c())?;
        info!(
            kc = gains.kc,
            ki = gains.ki,
            tau_s = config.process.time_constant_s,
            theta_s = config.process.dead_time_s,
            lambda_s = config.process.lambda_s,
            kp_proc = config.process.gain_c_per_unit,
            temp_range_c = config.temp_range_c(),
            "derived PI gains from process model"
        );

        let feed_forward = FeedForward::new(config.feed_forward.clone());
        let window = WindowDetector::new(config.window.clone());
        let dispatcher = ValveDispatcher::new(actuators, &config.valve);
        let diag = Diagnostics {
            kc: gains.kc,
            ki: gains.ki,
            ..Diagnostics::default()
        };

        Ok(Self {
            target_c: config.initial_target_c,
            config,
            gains,
            mode: OperatingMode::Auto,
            current_c: None,
            flow_c: None,
            outdoor_c: None,
            accum: 0.0,
            last_tick_s: None,
            last_u_total: None,
            feed_forward,
            window,
            dispatcher,
            diag,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn gains(&self) -> &PiGains {
        &self.gains
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn target_temperature_c(&self) -> f64 {
        self.target_c
    }

    pub fn current_temperature_c(&self) -> Option<f64> {
        self.current_c
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn actuator_ids(&self) -> &[ActuatorId] {
        self.dispatcher.actuator_ids()
    }

    pub fn dispatcher(&self) -> &ValveDispatcher {
        &self.dispatcher
    }

    pub fn heating_action(&self) -> HeatingAction {
        HeatingAction::derive(self.mode, self.dispatcher.committed_position())
    }

    /// Set the target temperature, clamped into the configured range.
    /// A `None` request is a silent no-op; returns whether a tick is due.
    pub fn set_target_temperature(&mut self, target_c: Option<f64>) -> bool {
        let Some(target) = target_c.filter(|t| t.is_finite()) else {
            return false;
        };
        self.target_c = self.config.clamp_target(target);
        true
    }

    /// Update the primary room temperature. An unavailable reading keeps
    /// the prior value so control continues from the last known state.
    pub fn update_room_temperature(&mut self, reading_c: Option<f64>) {
        match reading_c.filter(|r| r.is_finite()) {
            Some(value) => self.current_c = Some(value),
            None => warn!("room temperature unavailable, keeping previous reading"),
        }
    }

    /// Update the cached boiler flow temperature; unavailable clears it so
    /// the feed-forward filter simply holds its last state.
    pub fn update_flow_temperature(&mut self, reading_c: Option<f64>) {
        self.flow_c = reading_c.filter(|r| r.is_finite());
    }

    /// Update the cached outdoor temperature; same contract as flow.
    pub fn update_outdoor_temperature(&mut self, reading_c: Option<f64>) {
        self.outdoor_c = reading_c.filter(|r| r.is_finite());
    }

    /// Feed fresh actuator read-backs into the reconciliation cache.
    pub fn record_observed(&mut self, readings: BTreeMap<ActuatorId, u8>) {
        self.dispatcher.record_observed(readings);
    }

    /// Change the operating mode.
    ///
    /// Boost entry forces the valve fully open immediately and returns the
    /// expiry for the host's timer. Off and Auto rely on the follow-up tick
    /// for their dispatch so the forced close is not sent twice.
    pub fn set_mode(&mut self, request: ModeRequest, now_s: f64) -> ModeChange {
        match request {
            ModeRequest::Boost => {
                let until_s = now_s + self.config.boost_duration_s;
                self.mode = OperatingMode::Boost { until_s };
                let plan = self.dispatcher.request(VALVE_OPEN_POSITION, true, now_s);
                self.refresh_position_diag(now_s);
                ModeChange {
                    plan,
                    boost_until_s: Some(until_s),
                }
            }
            ModeRequest::Off => {
                self.mode = OperatingMode::Off;
                ModeChange {
                    plan: None,
                    boost_until_s: None,
                }
            }
            ModeRequest::Auto => {
                self.mode = OperatingMode::Auto;
                ModeChange {
                    plan: None,
                    boost_until_s: None,
                }
            }
        }
    }

    /// Run one control tick at monotonic time `now_s`.
    pub fn tick(&mut self, now_s: f64) -> TickEffect {
        match self.mode {
            OperatingMode::Off => {
                let plan = self.dispatcher.request(VALVE_CLOSED_POSITION, true, now_s);
                self.reset_control_state();
                self.refresh_position_diag(now_s);
                TickEffect {
                    plan,
                    boost_expired: false,
                }
            }
            OperatingMode::Boost { until_s } => {
                let plan = self.dispatcher.request(VALVE_OPEN_POSITION, true, now_s);
                let boost_expired = now_s >= until_s;
                if boost_expired {
                    info!("boost expired, reverting to auto");
                    self.mode = OperatingMode::Auto;
                }
                self.refresh_position_diag(now_s);
                TickEffect {
                    plan,
                    boost_expired,
                }
            }
            OperatingMode::Auto => self.tick_auto(now_s),
        }
    }

    fn tick_auto(&mut self, now_s: f64) -> TickEffect {
        if let Some(current_c) = self.current_c {
            if self.window.check(current_c, now_s) {
                // Stale charge must not resume heating once suppression ends.
                self.accum = 0.0;
                let plan = if self.dispatcher.committed_position() != VALVE_CLOSED_POSITION {
                    self.dispatcher.request(VALVE_CLOSED_POSITION, true, now_s)
                } else {
                    None
                };
                self.refresh_position_diag(now_s);
                return TickEffect {
                    plan,
                    boost_expired: false,
                };
            }
        } else {
            debug!("no current temperature available, assuming zero error");
        }

        // Error and timing. An absent reading counts as being exactly at
        // the target: zero error, no heat-side action, decay still runs.
        let current_c = self.current_c.unwrap_or(self.target_c);
        let error_c = self.target_c - current_c;
        let range_c = self.config.temp_range_c();
        let dt_s = self.last_tick_s.map(|t| (now_s - t).max(DT_EPSILON_S));
        self.last_tick_s = Some(now_s);
        let norm_error = error_c.clamp(0.0, range_c) / range_c;

        let u_ff = self.feed_forward.estimate(self.flow_c, self.outdoor_c, now_s);
        let band = Band::classify(error_c, self.config.steady_deadband_c);

        self.accum = update_accumulator(
            self.accum,
            &self.gains,
            norm_error,
            band,
            dt_s,
            u_ff,
            self.config.decay_tau_s,
        );
        let (u_pi, u_i) = pi_output(&self.gains, norm_error, self.accum);

        let prev_u = self
            .last_u_total
            .unwrap_or_else(|| clamp01(command_from_position(self.dispatcher.desired_position())));
        let u_total = decide_u_total(
            u_pi,
            u_ff,
            error_c,
            band,
            dt_s,
            self.config.decay_tau_s,
            self.config.steady_deadband_c,
            prev_u,
        );
        self.last_u_total = Some(u_total);

        self.diag = Diagnostics {
            error_c: Some(error_c),
            error_norm: Some(norm_error),
            u_pi: Some(u_pi),
            u_i: Some(u_i),
            u_ff: Some(u_ff),
            u_total: Some(u_total),
            flow_filtered_c: self.feed_forward.flow_filtered_c(),
            outdoor_filtered_c: self.feed_forward.outdoor_filtered_c(),
            kc: self.gains.kc,
            ki: self.gains.ki,
            ..Diagnostics::default()
        };

        let plan = self
            .dispatcher
            .request(position_from_command(u_total), false, now_s);
        self.refresh_position_diag(now_s);
        TickEffect {
            plan,
            boost_expired: false,
        }
    }

    /// Reset integral, timing and diagnostics so no stale charge survives a
    /// mode change. The decay baseline intentionally survives.
    fn reset_control_state(&mut self) {
        self.accum = 0.0;
        self.last_tick_s = None;
        self.diag = Diagnostics {
            kc: self.gains.kc,
            ki: self.gains.ki,
            ..Diagnostics::default()
        };
    }

    fn refresh_position_diag(&mut self, now_s: f64) {
        self.diag.desired_position = self.dispatcher.desired_position();
        self.diag.committed_position = self.dispatcher.committed_position();
        self.diag.observed_position = self.dispatcher.observed_max();
        self.diag.window_open = self.window.is_open(now_s);
    }
}
