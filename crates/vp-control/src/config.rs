//! Controller configuration.
//!
//! `ControllerConfig` is immutable after construction. Field defaults are the
//! tuning that works well for typical hydronic radiator circuits (slow
//! first-order-plus-dead-time rooms, 0–255 valve scale, minute-grade actuator
//! update rates). Validation and normalization happen when the controller is
//! built, not here.

use serde::{Deserialize, Serialize};

/// Minimum floor for the temperature range used in normalization, to avoid
/// divide-by-zero for degenerate min/max configurations.
pub const MIN_TEMP_RANGE_C: f64 = 0.1;

/// Floor applied to `dt` when a previous tick exists, so time-dependent
/// filters and bleeds always make forward progress.
pub const DT_EPSILON_S: f64 = 1e-6;

/// First-order-plus-dead-time process model of the room, used to derive PI
/// gains via lambda (IMC) tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessModel {
    /// Steady-state gain: °C of room temperature per unit of full-scale
    /// valve command.
    pub gain_c_per_unit: f64,
    /// Dominant process time constant (seconds).
    pub time_constant_s: f64,
    /// Transport dead time (seconds).
    pub dead_time_s: f64,
    /// Desired closed-loop time constant (seconds), often chosen close to
    /// the process time constant.
    pub lambda_s: f64,
}

impl Default for ProcessModel {
    fn default() -> Self {
        Self {
            gain_c_per_unit: 4.0,
            time_constant_s: 5400.0,
            dead_time_s: 900.0,
            lambda_s: 5400.0,
        }
    }
}

/// Feed-forward coefficients, reference points and conditioning parameters
/// for the two optional secondary signals (boiler flow and outdoor
/// temperature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardConfig {
    /// Valve fraction added per K of flow temperature below its reference.
    pub k_flow: f64,
    /// Valve fraction added per K of outdoor temperature below its reference.
    pub k_outdoor: f64,
    /// Reference flow temperature (°C). Calibrate to the boiler's typical
    /// flow setpoint to avoid a constant feed-forward bias.
    pub flow_ref_c: f64,
    /// Reference outdoor temperature (°C) for the heating season.
    pub outdoor_ref_c: f64,
    /// Master toggle for EWMA smoothing of both signals.
    pub smoothing: bool,
    /// EWMA time constant for the flow signal (seconds).
    pub flow_tau_s: f64,
    /// EWMA time constant for the outdoor signal (seconds).
    pub outdoor_tau_s: f64,
    /// Symmetric deadband around zero flow delta (K).
    pub flow_deadband_c: f64,
    /// Symmetric deadband around zero outdoor delta (K).
    pub outdoor_deadband_c: f64,
}

impl Default for FeedForwardConfig {
    fn default() -> Self {
        Self {
            k_flow: 0.02,
            k_outdoor: 0.01,
            flow_ref_c: 55.0,
            outdoor_ref_c: 10.0,
            smoothing: true,
            flow_tau_s: 300.0,
            outdoor_tau_s: 600.0,
            flow_deadband_c: 0.5,
            outdoor_deadband_c: 0.5,
        }
    }
}

/// Window-open detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Temperature drop rate (K/min, magnitude) that triggers suppression.
    pub threshold_c_per_min: f64,
    /// How long heating stays suppressed after a trigger (seconds).
    pub suppress_duration_s: f64,
    /// Minimum interval between rate checks (seconds); suppresses noise
    /// amplification from frequent sensor updates.
    pub check_min_interval_s: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            threshold_c_per_min: 1.0,
            suppress_duration_s: 900.0,
            check_min_interval_s: 30.0,
        }
    }
}

/// Actuator dispatch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveConfig {
    /// Minimum position step on the 0–255 scale; commands snap to multiples
    /// of this to reduce chattering at the actuator layer.
    pub min_step: u8,
    /// Minimum interval between non-forced sends to the actuators (seconds).
    pub min_send_interval_s: f64,
}

impl Default for ValveConfig {
    fn default() -> Self {
        Self {
            min_step: 5,
            min_send_interval_s: 60.0,
        }
    }
}

/// Full controller configuration. Immutable after the controller is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Minimum settable target temperature (°C).
    pub min_temp_c: f64,
    /// Maximum settable target temperature (°C).
    pub max_temp_c: f64,
    /// Target temperature at startup (°C); clamped into [min, max].
    pub initial_target_c: f64,
    /// Target temperature precision step (°C).
    pub precision_c: f64,
    /// Process model for gain derivation.
    pub process: ProcessModel,
    /// Feed-forward configuration.
    pub feed_forward: FeedForwardConfig,
    /// Half-width of the steady-state band around the setpoint (°C), used
    /// both for integral separation and for the soft command blend.
    pub steady_deadband_c: f64,
    /// Time constant for exponential decay toward closed (seconds); shared
    /// by the command decay and the integral bleed.
    pub decay_tau_s: f64,
    /// Window-open detection.
    pub window: WindowConfig,
    /// Actuator dispatch.
    pub valve: ValveConfig,
    /// Duration of the timed boost override (seconds).
    pub boost_duration_s: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_temp_c: 5.0,
            max_temp_c: 28.0,
            initial_target_c: 21.0,
            precision_c: 0.5,
            process: ProcessModel::default(),
            feed_forward: FeedForwardConfig::default(),
            steady_deadband_c: 0.5,
            decay_tau_s: 900.0,
            window: WindowConfig::default(),
            valve: ValveConfig::default(),
            boost_duration_s: 900.0,
        }
    }
}

impl ControllerConfig {
    /// Temperature span used for error normalization, floored at
    /// [`MIN_TEMP_RANGE_C`].
    pub fn temp_range_c(&self) -> f64 {
        (self.max_temp_c - self.min_temp_c).max(MIN_TEMP_RANGE_C)
    }

    /// Clamp a requested target temperature into the configured range.
    pub fn clamp_target(&self, target_c: f64) -> f64 {
        target_c.clamp(self.min_temp_c, self.max_temp_c)
    }
}
