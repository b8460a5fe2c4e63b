//! Monotonic time for the host side.
//!
//! The control core takes time as plain `f64` seconds so that every
//! time-dependent rule is deterministic under test. This module is the one
//! place that converts wall-process `Instant`s into that timeline.

use std::time::Instant;

/// Monotonic clock anchored at its creation instant.
///
/// Produces strictly non-decreasing `f64` seconds suitable for the control
/// core's timestamps. Cheap to copy around the host.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock was created.
    pub fn now_s(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
