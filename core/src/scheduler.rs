//! Session-bound floor scheduler.
//!
//! One [`SessionFloor`] per session id, created on first reference (from the
//! store if it has a record, otherwise with the configured defaults) and kept
//! for the life of the process. Each session sits behind its own mutex, so
//! the timing operations are serialized per session while different sessions
//! never contend beyond the brief map lookup. The store load on first
//! reference runs outside the map lock; when two callers race, the first
//! insert wins and the other load is discarded.
//!
//! Every mutation is written through to the [`FloorStore`] before the lock is
//! released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use rostrum_types::{FloorSnapshot, ParticipantId, QueueEntry, SessionId, TurnRecord};

use crate::clock::{Clock, SystemClock};
use crate::error::FloorError;
use crate::session::{Refresh, SessionFloor};
use crate::store::{FloorStore, MemoryStore};

pub const DEFAULT_BUDGET_SECONDS: u32 = 300;

/// Settings applied to sessions that have never been seen before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorDefaults {
    pub budget_seconds: u32,
    pub admission_open: bool,
}

impl Default for FloorDefaults {
    fn default() -> Self {
        Self {
            budget_seconds: DEFAULT_BUDGET_SECONDS,
            admission_open: true,
        }
    }
}

type SessionHandle = Arc<Mutex<SessionFloor>>;

pub struct FloorScheduler {
    clock: Arc<dyn Clock>,
    store: Arc<dyn FloorStore>,
    defaults: FloorDefaults,
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
}

impl FloorScheduler {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, store: Arc<dyn FloorStore>, defaults: FloorDefaults) -> Self {
        let defaults = if defaults.budget_seconds == 0 {
            FloorDefaults {
                budget_seconds: DEFAULT_BUDGET_SECONDS,
                ..defaults
            }
        } else {
            defaults
        };
        Self {
            clock,
            store,
            defaults,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Wall-clock scheduler with no durable store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(SystemClock),
            Arc::new(MemoryStore::new()),
            FloorDefaults::default(),
        )
    }

    #[must_use]
    pub fn defaults(&self) -> FloorDefaults {
        self.defaults
    }

    /// Session ids bound so far, sorted.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionId> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<SessionId> = sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn configure_budget(
        &self,
        session: &SessionId,
        seconds: u32,
    ) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, _| floor.configure_budget(seconds))
    }

    pub fn grant_floor(
        &self,
        session: &SessionId,
        participant: ParticipantId,
    ) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, now| {
            floor.grant_floor(participant, now);
            Ok(())
        })
    }

    /// Recognize the longest-waiting participant.
    pub fn grant_next(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, now| floor.grant_next(now).map(|_| ()))
    }

    pub fn pause(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, now| floor.pause(now))
    }

    pub fn resume(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, now| floor.resume(now))
    }

    pub fn finalize_turn(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, now| {
            floor.finalize_turn(now);
            Ok(())
        })
    }

    /// The polling entry point for displays. Safe to call from any number of
    /// readers at any cadence.
    pub fn refresh_remaining(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, now| {
            if let Refresh::Expired(record) = floor.refresh_remaining(now) {
                debug!(
                    session = %session,
                    participant = %record.participant_id(),
                    "Turn expired during refresh"
                );
            }
            Ok(())
        })
    }

    pub fn reset(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, _| {
            floor.reset();
            Ok(())
        })
    }

    pub fn open_admission(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, _| {
            floor.open_admission();
            Ok(())
        })
    }

    pub fn close_admission(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, _| {
            floor.close_admission();
            Ok(())
        })
    }

    pub fn admit(
        &self,
        session: &SessionId,
        participant: ParticipantId,
    ) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, now| {
            floor.admit(participant, now);
            Ok(())
        })
    }

    pub fn withdraw(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, _| {
            floor.withdraw(participant);
            Ok(())
        })
    }

    pub fn clear_all(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |floor, _| {
            floor.clear_all();
            Ok(())
        })
    }

    /// Current state without flushing elapsed time.
    pub fn snapshot(&self, session: &SessionId) -> Result<FloorSnapshot, FloorError> {
        self.with_session(session, |_, _| Ok(()))
    }

    pub fn list_pending(&self, session: &SessionId) -> Result<Vec<QueueEntry>, FloorError> {
        self.read_session(session, SessionFloor::list_pending)
    }

    /// Completed turns for the session, ascending by start time.
    pub fn list_turns(&self, session: &SessionId) -> Result<Vec<TurnRecord>, FloorError> {
        self.read_session(session, SessionFloor::list_turns)
    }

    fn read_session<T>(
        &self,
        session: &SessionId,
        read: impl FnOnce(&SessionFloor) -> T,
    ) -> Result<T, FloorError> {
        let handle = self.binding(session)?;
        let floor = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(read(&floor))
    }

    /// Run `apply` under the session lock, then write through if it changed anything.
    fn with_session(
        &self,
        session: &SessionId,
        apply: impl FnOnce(&mut SessionFloor, DateTime<Utc>) -> Result<(), FloorError>,
    ) -> Result<FloorSnapshot, FloorError> {
        let handle = self.binding(session)?;
        let mut floor = handle.lock().unwrap_or_else(PoisonError::into_inner);
        // Read the clock under the lock so stamps are ordered per session.
        let now = self.clock.now();
        let outcome = apply(&mut floor, now);

        if floor.take_dirty()
            && let Err(err) = self.store.save(session, &floor)
        {
            warn!(session = %session, "Failed to persist floor state: {err}");
            outcome?;
            return Err(err.into());
        }

        outcome.map(|()| floor.snapshot())
    }

    fn binding(&self, session: &SessionId) -> Result<SessionHandle, FloorError> {
        if let Some(handle) = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session)
        {
            return Ok(Arc::clone(handle));
        }

        // Load without the map lock so a slow store stalls only this session.
        let floor = match self.store.load(session)? {
            Some(floor) => {
                debug!(session = %session, "Loaded floor state from store");
                floor
            }
            None => {
                debug!(session = %session, "Binding new floor with defaults");
                SessionFloor::new(
                    session.clone(),
                    self.defaults.budget_seconds,
                    self.defaults.admission_open,
                )
            }
        };

        // A racing first reference may have bound the session meanwhile; keep theirs.
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = sessions
            .entry(session.clone())
            .or_insert_with(|| Arc::new(Mutex::new(floor)));
        Ok(Arc::clone(handle))
    }
}
