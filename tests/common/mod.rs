//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use rostrum_core::{FloorDefaults, FloorScheduler, FloorStore, ManualClock, MemoryStore};
use rostrum_types::{ParticipantId, SessionId};

/// Fixed starting instant so ledger timestamps are reproducible.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

pub fn clock() -> ManualClock {
    ManualClock::new(epoch())
}

pub fn defaults(budget_seconds: u32) -> FloorDefaults {
    FloorDefaults {
        budget_seconds,
        admission_open: true,
    }
}

/// Scheduler over `store` driven by `clock`.
pub fn scheduler_with(
    clock: &ManualClock,
    store: Arc<dyn FloorStore>,
    budget_seconds: u32,
) -> FloorScheduler {
    FloorScheduler::new(Arc::new(clock.clone()), store, defaults(budget_seconds))
}

/// In-memory scheduler plus the clock that drives it.
pub fn scheduler(budget_seconds: u32) -> (FloorScheduler, ManualClock) {
    let clock = clock();
    let scheduler = scheduler_with(&clock, Arc::new(MemoryStore::new()), budget_seconds);
    (scheduler, clock)
}

pub fn sid(id: &str) -> SessionId {
    SessionId::new(id).unwrap()
}

pub fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id).unwrap()
}
