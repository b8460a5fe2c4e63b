//! Error types for the controller core.

use thiserror::Error;

/// Result type for controller operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in controller operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Process-model tuning parameters cannot produce valid gains.
    /// This is a construction-time failure: the controller is never built.
    #[error("Invalid tuning: {what}")]
    InvalidTuning { what: &'static str },
}
