//! Admission queue: the ordered waiting list of participants asking for the floor.
//!
//! Fairness is strict FIFO by `sequence`, which is assigned here and never by
//! wall clock, so skewed `requested_at` stamps cannot reorder anyone.
//! Served entries stay in the queue as history until cleared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rostrum_types::{ParticipantId, QueueEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdmissionQueue {
    entries: Vec<QueueEntry>,
}

impl AdmissionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry for `participant` unless one is already pending.
    ///
    /// Returns the new entry's sequence, or `None` for a duplicate.
    pub fn admit(&mut self, participant: ParticipantId, now: DateTime<Utc>) -> Option<u64> {
        if self.is_pending(&participant) {
            return None;
        }
        let sequence = self
            .entries
            .iter()
            .map(|entry| entry.sequence)
            .max()
            .unwrap_or(0)
            + 1;
        self.entries.push(QueueEntry {
            participant_id: participant,
            requested_at: now,
            sequence,
            served: false,
        });
        Some(sequence)
    }

    /// Remove the unserved entry for `participant`. Served history is kept.
    pub fn withdraw(&mut self, participant: &ParticipantId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.served || &entry.participant_id != participant);
        self.entries.len() != before
    }

    /// Drop every entry, served or not. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Flip the participant's pending entry to served, if there is one.
    pub fn mark_served(&mut self, participant: &ParticipantId) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| !entry.served && &entry.participant_id == participant)
        {
            Some(entry) => {
                entry.served = true;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self, participant: &ParticipantId) -> bool {
        self.entries
            .iter()
            .any(|entry| !entry.served && &entry.participant_id == participant)
    }

    /// Unserved entries, ascending by sequence.
    #[must_use]
    pub fn pending(&self) -> Vec<QueueEntry> {
        let mut pending: Vec<QueueEntry> = self
            .entries
            .iter()
            .filter(|entry| !entry.served)
            .cloned()
            .collect();
        pending.sort_by_key(|entry| entry.sequence);
        pending
    }

    #[must_use]
    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.served)
            .min_by_key(|entry| entry.sequence)
    }

    #[must_use]
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
