//! Error band classification around the setpoint.

use serde::{Deserialize, Serialize};

/// Which side of the steady-state deadband the current error falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    /// Error above `+eps`: the room is clearly too cold, heating is needed.
    Heat,
    /// `|error| <= eps`: within the steady-state band.
    InBand,
    /// Error below `-eps`: the room is clearly too warm.
    Cool,
}

impl Band {
    pub fn classify(error_c: f64, deadband_c: f64) -> Self {
        if error_c > deadband_c {
            Self::Heat
        } else if error_c < -deadband_c {
            Self::Cool
        } else {
            Self::InBand
        }
    }

    pub fn is_heat(self) -> bool {
        self == Self::Heat
    }
}
