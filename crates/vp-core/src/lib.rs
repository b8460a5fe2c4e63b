//! vp-core: stable foundation for valvepilot.
//!
//! Contains:
//! - ids (actuator identities from the host's namespace)
//! - numeric (shared float helpers)
//! - timing (monotonic clock for the host side)

pub mod ids;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use ids::*;
pub use numeric::*;
pub use timing::*;
