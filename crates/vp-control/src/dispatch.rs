//! Actuator dispatch planning.
//!
//! The dispatcher is the pure half of actuation: it converts a normalized
//! command to an integer position, applies the minimum-step quantizer,
//! throttles the send rate, and reconciles per-actuator observed state into
//! a [`SendPlan`]. Executing the plan (the actual transport calls) is the
//! host's job, which keeps every rule here testable without I/O.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vp_core::{ActuatorId, clamp01};

use crate::config::ValveConfig;

/// Fully open valve position on the integer scale.
pub const VALVE_OPEN_POSITION: u8 = 255;
/// Fully closed valve position.
pub const VALVE_CLOSED_POSITION: u8 = 0;
/// Full scale as a float, for normalized/integer conversions.
pub const VALVE_FULL_SCALE: f64 = VALVE_OPEN_POSITION as f64;

/// Convert a normalized command in [0, 1] to an integer position.
pub fn position_from_command(u_total: f64) -> u8 {
    (clamp01(u_total) * VALVE_FULL_SCALE).round() as u8
}

/// Normalized opening for an integer position.
pub fn command_from_position(position: u8) -> f64 {
    position as f64 / VALVE_FULL_SCALE
}

/// Round a position to the nearest multiple of `step`, clamped to range.
pub fn snap_to_step(position: u8, step: u8) -> u8 {
    if step <= 1 {
        return position;
    }
    let step = step as i32;
    let snapped = ((position as i32 as f64 / step as f64).round() as i32) * step;
    snapped.clamp(VALVE_CLOSED_POSITION as i32, VALVE_OPEN_POSITION as i32) as u8
}

/// Virtual temperature setpoint equivalent to `position`, for actuators that
/// can only be driven through a temperature interface.
pub fn virtual_setpoint_c(min_temp_c: f64, max_temp_c: f64, position: u8) -> f64 {
    min_temp_c + command_from_position(position) * (max_temp_c - min_temp_c)
}

/// A dispatch decision: send `position` to each listed actuator.
///
/// The target list may be a subset of the configured actuators (selective
/// resend) or empty (bookkeeping advanced, nothing to transmit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPlan {
    pub position: u8,
    pub actuators: Vec<ActuatorId>,
}

/// Throttled, reconciling dispatcher over a fixed set of actuators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveDispatcher {
    actuators: Vec<ActuatorId>,
    min_step: u8,
    min_send_interval_s: f64,
    /// Most recently requested position (pre-quantization); may differ from
    /// the committed position while a send is throttled.
    desired: u8,
    /// Last position actually committed to the actuators.
    committed: u8,
    last_send_s: Option<f64>,
    observed: BTreeMap<ActuatorId, u8>,
    observed_max: Option<u8>,
}

impl ValveDispatcher {
    pub fn new(actuators: Vec<ActuatorId>, valve: &ValveConfig) -> Self {
        Self {
            actuators,
            min_step: valve.min_step,
            min_send_interval_s: valve.min_send_interval_s,
            desired: VALVE_CLOSED_POSITION,
            committed: VALVE_CLOSED_POSITION,
            last_send_s: None,
            observed: BTreeMap::new(),
            observed_max: None,
        }
    }

    pub fn actuator_ids(&self) -> &[ActuatorId] {
        &self.actuators
    }

    pub fn desired_position(&self) -> u8 {
        self.desired
    }

    pub fn committed_position(&self) -> u8 {
        self.committed
    }

    /// Aggregated observed position: maximum across reporting actuators.
    pub fn observed_max(&self) -> Option<u8> {
        self.observed_max
    }

    pub fn observed_position(&self, id: &ActuatorId) -> Option<u8> {
        self.observed.get(id).copied()
    }

    /// Replace the observed-position cache with fresh read-backs.
    /// Non-reporting actuators are simply absent from the map.
    pub fn record_observed(&mut self, readings: BTreeMap<ActuatorId, u8>) {
        self.observed_max = readings.values().copied().max();
        self.observed = readings;
    }

    /// Request a position update. Returns a plan when a send is due now.
    ///
    /// Non-forced requests are throttled to the minimum send interval; a
    /// throttled request still records the desired position so the next
    /// tick re-evaluates it (coalescing is opportunistic, no timer).
    pub fn request(&mut self, position: u8, force: bool, now_s: f64) -> Option<SendPlan> {
        self.desired = position;

        let due = force
            || match self.last_send_s {
                None => true,
                Some(last) => now_s - last >= self.min_send_interval_s,
            };
        if !due {
            debug!(position, "valve send throttled, desired position recorded");
            return None;
        }

        let plan = self.plan(position);
        self.last_send_s = Some(now_s);
        plan
    }

    /// Build the send plan for a due request: quantize, then decide which
    /// actuators actually need the command.
    fn plan(&mut self, position: u8) -> Option<SendPlan> {
        let position = snap_to_step(position, self.min_step);

        if position == self.committed {
            // Unchanged request: resend only where observed state disagrees.
            let mut mismatch = self
                .actuators
                .iter()
                .any(|id| self.observed.get(id).is_some_and(|&p| p != position));
            if !mismatch && self.observed_max.is_some_and(|max| max != position) {
                mismatch = true;
            }
            if !mismatch {
                debug!(position, "all actuators already at target, skipping send");
                return None;
            }
            let targets = self
                .actuators
                .iter()
                .filter(|id| self.observed.get(id).is_none_or(|&p| p != position))
                .cloned()
                .collect();
            return Some(SendPlan {
                position,
                actuators: targets,
            });
        }

        self.committed = position;
        Some(SendPlan {
            position,
            actuators: self.actuators.clone(),
        })
    }
}
