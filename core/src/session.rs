//! Per-session floor state machine.
//!
//! ```text
//!            grant                 pause
//!   Vacant ─────────▶ Active ─────────────▶ Paused
//!     ▲                │  ▲ ◀──────────────── │
//!     │   finalize /   │  │     resume        │
//!     └── expire ──────┘  └── grant (other) ──┘  (overrides: record, then grant)
//! ```
//!
//! Every transition takes the caller's `now`; nothing here reads a clock.
//! Elapsed time is flushed from `started_at` and the stamp is moved forward,
//! so any number of pollers can refresh without subtracting the same interval
//! twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rostrum_types::{
    FloorPhase, FloorSnapshot, ParticipantId, QueueEntry, SessionId, TurnEnding, TurnRecord,
};

use crate::clock::{elapsed_millis, round_seconds};
use crate::error::{FloorError, Operation};
use crate::floor::FloorState;
use crate::ledger::TurnLedger;
use crate::queue::AdmissionQueue;

/// What a refresh did to the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// Vacant or paused: nothing to count.
    Idle,
    /// Elapsed time was flushed into the remaining budget.
    Ticked,
    /// The budget ran out and the turn was recorded.
    Expired(TurnRecord),
}

/// Everything persisted for one session: floor, admission queue and ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFloor {
    floor: FloorState,
    #[serde(default)]
    queue: AdmissionQueue,
    #[serde(default)]
    ledger: TurnLedger,
    /// Set by every mutation; cleared by the owner once written through.
    #[serde(skip)]
    dirty: bool,
}

impl SessionFloor {
    #[must_use]
    pub fn new(session_id: SessionId, budget_seconds: u32, admission_open: bool) -> Self {
        Self {
            floor: FloorState::new(session_id, budget_seconds, admission_open),
            queue: AdmissionQueue::new(),
            ledger: TurnLedger::new(),
            dirty: false,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.floor.session_id()
    }

    #[must_use]
    pub fn floor(&self) -> &FloorState {
        &self.floor
    }

    #[must_use]
    pub fn queue(&self) -> &AdmissionQueue {
        &self.queue
    }

    #[must_use]
    pub fn ledger(&self) -> &TurnLedger {
        &self.ledger
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn configure_budget(&mut self, seconds: u32) -> Result<(), FloorError> {
        if self.floor.phase.is_running() {
            return Err(FloorError::InvalidState {
                operation: Operation::ConfigureBudget,
                phase: self.floor.phase.kind(),
            });
        }
        if seconds == 0 {
            return Err(FloorError::InvalidBudget);
        }
        self.floor.total_budget_seconds = seconds;
        self.floor.remaining_millis = self.floor.budget_millis();
        self.dirty = true;
        debug!(session = %self.session_id(), seconds, "Floor budget configured");
        Ok(())
    }

    /// Give the floor to `participant`, closing any other holder's turn first.
    ///
    /// Returns the record of the overridden turn, if there was one. Granting to
    /// the current holder leaves the clock alone but still serves any pending
    /// queue entry of theirs.
    pub fn grant_floor(
        &mut self,
        participant: ParticipantId,
        now: DateTime<Utc>,
    ) -> Option<TurnRecord> {
        if self.queue.mark_served(&participant) {
            debug!(session = %self.session_id(), participant = %participant, "Queue entry served");
            self.dirty = true;
        }
        if self.floor.phase.holder() == Some(&participant) {
            return None;
        }

        let overridden = self.end_turn(now, TurnEnding::Overridden);

        info!(session = %self.session_id(), participant = %participant, "Floor granted");
        self.floor.phase = FloorPhase::Active {
            holder: participant,
            granted_at: now,
            started_at: now,
        };
        self.dirty = true;
        overridden
    }

    /// Grant the floor to the head of the pending queue.
    pub fn grant_next(&mut self, now: DateTime<Utc>) -> Result<Option<TurnRecord>, FloorError> {
        let next = self
            .queue
            .head()
            .map(|entry| entry.participant_id.clone())
            .ok_or(FloorError::NothingPending)?;
        Ok(self.grant_floor(next, now))
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), FloorError> {
        let FloorPhase::Active {
            holder,
            granted_at,
            started_at,
        } = &self.floor.phase
        else {
            return Err(FloorError::InvalidState {
                operation: Operation::Pause,
                phase: self.floor.phase.kind(),
            });
        };

        let elapsed = elapsed_millis(*started_at, now);
        self.floor.phase = FloorPhase::Paused {
            holder: holder.clone(),
            granted_at: *granted_at,
        };
        self.floor.remaining_millis = self.floor.remaining_millis.saturating_sub(elapsed);
        self.dirty = true;
        debug!(
            session = %self.session_id(),
            remaining_ms = self.floor.remaining_millis,
            "Floor paused"
        );
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), FloorError> {
        let FloorPhase::Paused { holder, granted_at } = &self.floor.phase else {
            return Err(FloorError::InvalidState {
                operation: Operation::Resume,
                phase: self.floor.phase.kind(),
            });
        };

        self.floor.phase = FloorPhase::Active {
            holder: holder.clone(),
            granted_at: *granted_at,
            started_at: now,
        };
        self.dirty = true;
        debug!(session = %self.session_id(), "Floor resumed");
        Ok(())
    }

    /// Close the current turn. No-op on a vacant floor.
    pub fn finalize_turn(&mut self, now: DateTime<Utc>) -> Option<TurnRecord> {
        self.end_turn(now, TurnEnding::Finalized)
    }

    /// Poll-driven tick: flush elapsed time and re-stamp, expiring the turn at zero.
    pub fn refresh_remaining(&mut self, now: DateTime<Utc>) -> Refresh {
        let FloorPhase::Active { started_at, .. } = &mut self.floor.phase else {
            return Refresh::Idle;
        };

        let elapsed = elapsed_millis(*started_at, now);
        if elapsed == 0 {
            return Refresh::Idle;
        }
        *started_at = now;
        self.floor.remaining_millis = self.floor.remaining_millis.saturating_sub(elapsed);
        self.dirty = true;

        if self.floor.remaining_millis > 0 {
            return Refresh::Ticked;
        }
        match self.end_turn(now, TurnEnding::Expired) {
            Some(record) => Refresh::Expired(record),
            None => Refresh::Ticked,
        }
    }

    /// Force the floor vacant without recording anything.
    pub fn reset(&mut self) {
        self.floor.vacate();
        self.dirty = true;
        info!(session = %self.session_id(), "Floor reset");
    }

    pub fn open_admission(&mut self) {
        if !self.floor.admission_open {
            self.floor.admission_open = true;
            self.dirty = true;
        }
    }

    pub fn close_admission(&mut self) {
        if self.floor.admission_open {
            self.floor.admission_open = false;
            self.dirty = true;
        }
    }

    /// Queue `participant` for the floor. Ignored while admission is closed or
    /// when the participant is already waiting.
    pub fn admit(&mut self, participant: ParticipantId, now: DateTime<Utc>) -> Option<u64> {
        if !self.floor.admission_open {
            debug!(session = %self.session_id(), participant = %participant, "Admission closed");
            return None;
        }
        let sequence = self.queue.admit(participant, now)?;
        self.dirty = true;
        Some(sequence)
    }

    pub fn withdraw(&mut self, participant: &ParticipantId) -> bool {
        let removed = self.queue.withdraw(participant);
        self.dirty |= removed;
        removed
    }

    pub fn clear_all(&mut self) -> usize {
        let removed = self.queue.clear_all();
        self.dirty |= removed > 0;
        removed
    }

    #[must_use]
    pub fn list_pending(&self) -> Vec<QueueEntry> {
        self.queue.pending()
    }

    #[must_use]
    pub fn list_turns(&self) -> Vec<TurnRecord> {
        self.ledger.list()
    }

    #[must_use]
    pub fn snapshot(&self) -> FloorSnapshot {
        let phase = &self.floor.phase;
        FloorSnapshot {
            session_id: self.session_id().clone(),
            holder_id: phase.holder().cloned(),
            running: phase.is_running(),
            paused: phase.is_paused(),
            total_budget_seconds: self.floor.total_budget_seconds(),
            remaining_seconds: self.floor.remaining_seconds(),
            remaining_millis: self.floor.remaining_millis(),
            turn_started_at: phase.started_at(),
            granted_at: phase.granted_at(),
            admission_open: self.floor.admission_open(),
            pending: self.queue.pending(),
            turns_recorded: self.ledger.len(),
            last_turn: self.ledger.last().cloned(),
        }
    }

    /// Record the running turn and vacate the floor.
    ///
    /// Time elapsed since `started_at` counts toward the turn but is not
    /// written back, since the floor is reset right after.
    fn end_turn(&mut self, now: DateTime<Utc>, ending: TurnEnding) -> Option<TurnRecord> {
        let (holder, granted_at, remaining) = match &self.floor.phase {
            FloorPhase::Vacant => return None,
            FloorPhase::Active {
                holder,
                granted_at,
                started_at,
            } => (
                holder.clone(),
                *granted_at,
                self.floor
                    .remaining_millis
                    .saturating_sub(elapsed_millis(*started_at, now)),
            ),
            FloorPhase::Paused { holder, granted_at } => {
                (holder.clone(), *granted_at, self.floor.remaining_millis)
            }
        };

        let used_millis = self.floor.budget_millis().saturating_sub(remaining);
        let seconds_used = round_seconds(used_millis).min(self.floor.total_budget_seconds);
        let record = TurnRecord::new(holder, seconds_used, granted_at, now, ending);
        info!(
            session = %self.session_id(),
            participant = %record.participant_id(),
            seconds_used,
            ending = ending.as_str(),
            "Turn recorded"
        );

        self.ledger.append(record.clone());
        self.floor.vacate();
        self.dirty = true;
        Some(record)
    }
}
