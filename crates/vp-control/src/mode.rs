//! Operating modes and the derived heating-action indicator.

use serde::{Deserialize, Serialize};

use crate::dispatch::VALVE_FULL_SCALE;

/// Valve opening above which the controller reports active heating:
/// 10% of full scale, so integer positions 26..=255 count as heating.
pub const HEATING_ACTION_THRESHOLD: u8 = (0.10 * VALVE_FULL_SCALE) as u8;

/// Controller operating mode. `Boost` carries its expiry timestamp on the
/// controller's monotonic timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OperatingMode {
    Off,
    Auto,
    Boost { until_s: f64 },
}

impl OperatingMode {
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }

    pub fn is_boost(&self) -> bool {
        matches!(self, Self::Boost { .. })
    }
}

/// A mode change requested by the host (expiry timestamps are the
/// controller's business, so Boost carries no payload here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeRequest {
    Off,
    Auto,
    Boost,
}

/// What the controller is currently doing to the room, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatingAction {
    Off,
    Heating,
    Idle,
}

impl HeatingAction {
    /// Derive the action from the mode and the last committed position.
    pub fn derive(mode: OperatingMode, committed_position: u8) -> Self {
        if mode.is_off() {
            return Self::Off;
        }
        if committed_position > HEATING_ACTION_THRESHOLD {
            Self::Heating
        } else {
            Self::Idle
        }
    }
}
