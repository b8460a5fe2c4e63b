//! Actuator transport abstraction.
//!
//! The control crate plans sends; this trait executes them. Implementations
//! wrap whatever bus or integration the actuators live behind. Actuators
//! without a direct position interface are driven through a virtual
//! temperature setpoint instead.

use thiserror::Error;

use vp_core::ActuatorId;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("actuator {id} unreachable: {reason}")]
    Unreachable { id: ActuatorId, reason: String },
    #[error("actuator {id} rejected command: {reason}")]
    Rejected { id: ActuatorId, reason: String },
}

/// One command to one actuator.
#[derive(Debug, Clone, PartialEq)]
pub enum ValveCall {
    /// Set the valve opening directly on the 0–255 scale.
    SetPosition { position: u8 },
    /// Put the actuator in its off/idle state.
    TurnOff,
    /// Drive the actuator through its thermostat interface with a virtual
    /// setpoint; implies switching the actuator's own mode to heat.
    HeatTo { setpoint_c: f64 },
}

/// Transport over a set of valve actuators.
pub trait ValveTransport {
    /// Whether `id` accepts [`ValveCall::SetPosition`]; if not, the runtime
    /// falls back to the virtual-setpoint call.
    fn has_direct_position(&self, id: &ActuatorId) -> bool;

    /// Execute one call against one actuator.
    fn send(
        &mut self,
        id: &ActuatorId,
        call: ValveCall,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Read back the actuator's current position, if it reports one.
    fn observed_position(&mut self, id: &ActuatorId) -> impl Future<Output = Option<u8>> + Send;
}
