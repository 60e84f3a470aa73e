use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ParticipantId, PhaseKind, QueueEntry, SessionId, TurnRecord};

/// Point-in-time view of one session's floor, safe to hand to pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorSnapshot {
    pub session_id: SessionId,
    pub holder_id: Option<ParticipantId>,
    pub running: bool,
    pub paused: bool,
    pub total_budget_seconds: u32,
    pub remaining_seconds: u32,
    pub remaining_millis: u64,
    pub turn_started_at: Option<DateTime<Utc>>,
    pub granted_at: Option<DateTime<Utc>>,
    pub admission_open: bool,
    /// Unserved queue entries, ascending by sequence.
    pub pending: Vec<QueueEntry>,
    pub turns_recorded: usize,
    pub last_turn: Option<TurnRecord>,
}

impl FloorSnapshot {
    #[must_use]
    pub fn phase(&self) -> PhaseKind {
        match (self.running, self.paused) {
            (false, _) => PhaseKind::Vacant,
            (true, false) => PhaseKind::Active,
            (true, true) => PhaseKind::Paused,
        }
    }

    /// Fraction of the budget still available, in `[0.0, 1.0]`.
    #[must_use]
    pub fn remaining_ratio(&self) -> f64 {
        if self.total_budget_seconds == 0 {
            return 0.0;
        }
        let total = f64::from(self.total_budget_seconds) * 1000.0;
        (self.remaining_millis as f64 / total).clamp(0.0, 1.0)
    }
}

/// Formats whole seconds as `mm:ss` (or `h:mm:ss` past an hour).
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}
