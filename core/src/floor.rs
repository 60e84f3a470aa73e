use serde::{Deserialize, Serialize};

use rostrum_types::{FloorPhase, SessionId};

use crate::clock::{ceil_seconds, seconds_to_millis};

/// The floor resource of one session.
///
/// `remaining_millis` stays within `[0, total_budget_seconds * 1000]` and is
/// reset to the full budget whenever the floor becomes vacant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorState {
    session_id: SessionId,
    pub(crate) phase: FloorPhase,
    pub(crate) total_budget_seconds: u32,
    pub(crate) remaining_millis: u64,
    pub(crate) admission_open: bool,
}

impl FloorState {
    #[must_use]
    pub fn new(session_id: SessionId, budget_seconds: u32, admission_open: bool) -> Self {
        Self {
            session_id,
            phase: FloorPhase::Vacant,
            total_budget_seconds: budget_seconds,
            remaining_millis: seconds_to_millis(budget_seconds),
            admission_open,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn phase(&self) -> &FloorPhase {
        &self.phase
    }

    #[must_use]
    pub fn total_budget_seconds(&self) -> u32 {
        self.total_budget_seconds
    }

    #[must_use]
    pub fn budget_millis(&self) -> u64 {
        seconds_to_millis(self.total_budget_seconds)
    }

    #[must_use]
    pub fn remaining_millis(&self) -> u64 {
        self.remaining_millis
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        ceil_seconds(self.remaining_millis)
    }

    #[must_use]
    pub fn admission_open(&self) -> bool {
        self.admission_open
    }

    pub(crate) fn vacate(&mut self) {
        self.phase = FloorPhase::Vacant;
        self.remaining_millis = self.budget_millis();
    }
}
