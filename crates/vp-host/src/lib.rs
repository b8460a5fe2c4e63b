//! Async host runtime for the valve position controller.
//!
//! Bridges the deterministic control core in `vp-control` to the outside
//! world: an event loop that serializes sensor updates and user commands,
//! a transport trait for the actual actuator bus, and the boost expiry
//! timer. All I/O lives here; the control core stays pure.

pub mod runtime;
pub mod transport;

pub use runtime::{ControllerHandle, ControllerRuntime, HostEvent, RuntimeClosed};
pub use transport::{TransportError, ValveCall, ValveTransport};
