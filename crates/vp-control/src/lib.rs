//! Closed-loop valve position control for hydronic radiator circuits.
//!
//! This crate contains the full control pipeline for one heating zone: PI
//! gain derivation from a first-order-plus-dead-time process model, signal
//! conditioning for the secondary feed-forward inputs, integral action with
//! anti-windup and exponential bleed, a smoothstep command blend around the
//! setpoint, window-open detection, and throttled dispatch planning over a
//! set of valve actuators.
//!
//! # Architecture
//!
//! - All state lives in [`Controller`]; one call to [`Controller::tick`]
//!   advances the loop and returns the dispatch plan to execute
//! - Time is an explicit monotonic `f64` seconds argument, never read from
//!   a wall clock inside the pipeline
//! - Positions are integers on a 0–255 scale; commands are normalized
//!   `f64` in [0, 1]
//! - Nothing here performs I/O; executing a [`SendPlan`] is the host's job
//!
//! # Design Principles
//!
//! - **Deterministic Core**: same inputs and timestamps, same outputs
//! - **Pure Planning**: dispatch decisions are data, transport is external
//! - **Sampled Operation**: every stateful stage takes `dt` explicitly

pub mod band;
pub mod config;
pub mod controller;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod feedforward;
pub mod filter;
pub mod integral;
pub mod mode;
pub mod tuning;
pub mod window;

pub use band::Band;
pub use config::{
    ControllerConfig, FeedForwardConfig, ProcessModel, ValveConfig, WindowConfig,
};
pub use controller::{Controller, Diagnostics, ModeChange, TickEffect};
pub use dispatch::{
    SendPlan, VALVE_CLOSED_POSITION, VALVE_OPEN_POSITION, ValveDispatcher, position_from_command,
    snap_to_step, virtual_setpoint_c,
};
pub use error::{ControlError, ControlResult};
pub use feedforward::FeedForward;
pub use filter::Ewma;
pub use mode::{HeatingAction, ModeRequest, OperatingMode};
pub use tuning::PiGains;
pub use window::WindowDetector;
