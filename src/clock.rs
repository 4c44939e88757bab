//! Clock abstraction
//!
//! The credential freshness window is relative to the verifier's clock, so
//! the clock is injected rather than read ambiently. Tests pin it to a
//! fixed instant.

use chrono::{DateTime, Utc};

/// Source of the current time for freshness checks
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
