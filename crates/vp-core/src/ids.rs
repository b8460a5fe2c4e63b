use core::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a physical valve actuator.
///
/// Actuator identities come from the host integration's namespace (device
/// registry, entity id, bus address, ...), so this is an opaque string
/// newtype rather than a dense index: the controller never allocates these,
/// it only routes commands to them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorId(String);

impl ActuatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActuatorId({})", self.0)
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActuatorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ActuatorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_id_round_trip() {
        let id = ActuatorId::new("valve.living_room_left");
        assert_eq!(id.as_str(), "valve.living_room_left");
        assert_eq!(format!("{id}"), "valve.living_room_left");
    }

    #[test]
    fn actuator_id_orders_stably() {
        let a = ActuatorId::from("valve.a");
        let b = ActuatorId::from("valve.b");
        assert!(a < b);
    }
}
