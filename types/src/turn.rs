use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParticipantId;

/// How a turn left the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnEnding {
    /// The chair closed the turn explicitly.
    Finalized,
    /// The budget ran out during a refresh.
    Expired,
    /// Another participant was granted the floor.
    Overridden,
}

impl TurnEnding {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TurnEnding::Finalized => "finalized",
            TurnEnding::Expired => "expired",
            TurnEnding::Overridden => "overridden",
        }
    }
}

/// One completed speaking turn. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    participant_id: ParticipantId,
    seconds_used: u32,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    ending: TurnEnding,
}

impl TurnRecord {
    #[must_use]
    pub fn new(
        participant_id: ParticipantId,
        seconds_used: u32,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        ending: TurnEnding,
    ) -> Self {
        Self {
            participant_id,
            seconds_used,
            started_at,
            ended_at,
            ending,
        }
    }

    #[must_use]
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    #[must_use]
    pub fn seconds_used(&self) -> u32 {
        self.seconds_used
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    #[must_use]
    pub fn ending(&self) -> TurnEnding {
        self.ending
    }
}
