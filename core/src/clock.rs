//! Clock source and time arithmetic for the floor countdown.
//!
//! Elapsed time is always a wall-clock delta between two readings. A reading
//! that goes backwards (NTP step, skewed host) counts as zero elapsed so the
//! countdown can never grow.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and deterministic replay.
///
/// Clones share the same reading.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or_else(|_| TimeDelta::zero());
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Milliseconds from `from` to `to`, clamped at zero.
#[must_use]
pub fn elapsed_millis(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    to.signed_duration_since(from).num_milliseconds().max(0) as u64
}

/// Whole seconds still showing on a countdown: any started second counts.
#[must_use]
pub fn ceil_seconds(millis: u64) -> u32 {
    u32::try_from(millis.div_ceil(1000)).unwrap_or(u32::MAX)
}

/// Nearest whole second, halves rounding up.
#[must_use]
pub fn round_seconds(millis: u64) -> u32 {
    u32::try_from(millis.saturating_add(500) / 1000).unwrap_or(u32::MAX)
}

#[must_use]
pub fn seconds_to_millis(seconds: u32) -> u64 {
    u64::from(seconds) * 1000
}
