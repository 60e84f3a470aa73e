//! Floor occupancy phases.
//!
//! The running/paused/holder flags of a floor are derived from [`FloorPhase`],
//! so "holder present iff running" and "paused implies running" hold by
//! construction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParticipantId;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FloorPhase {
    #[default]
    Vacant,
    /// Countdown is consuming budget from `started_at`.
    Active {
        holder: ParticipantId,
        /// When the turn began. Never re-stamped.
        granted_at: DateTime<Utc>,
        /// Last point elapsed time is measured from. Re-stamped on every flush.
        started_at: DateTime<Utc>,
    },
    Paused {
        holder: ParticipantId,
        granted_at: DateTime<Utc>,
    },
}

impl FloorPhase {
    #[must_use]
    pub fn kind(&self) -> PhaseKind {
        match self {
            FloorPhase::Vacant => PhaseKind::Vacant,
            FloorPhase::Active { .. } => PhaseKind::Active,
            FloorPhase::Paused { .. } => PhaseKind::Paused,
        }
    }

    #[must_use]
    pub fn holder(&self) -> Option<&ParticipantId> {
        match self {
            FloorPhase::Vacant => None,
            FloorPhase::Active { holder, .. } | FloorPhase::Paused { holder, .. } => Some(holder),
        }
    }

    #[must_use]
    pub fn granted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            FloorPhase::Vacant => None,
            FloorPhase::Active { granted_at, .. } | FloorPhase::Paused { granted_at, .. } => {
                Some(*granted_at)
            }
        }
    }

    /// Only an active floor has a point to measure elapsed time from.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            FloorPhase::Active { started_at, .. } => Some(*started_at),
            FloorPhase::Vacant | FloorPhase::Paused { .. } => None,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !matches!(self, FloorPhase::Vacant)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self, FloorPhase::Paused { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Vacant,
    Active,
    Paused,
}

impl PhaseKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Vacant => "vacant",
            PhaseKind::Active => "active",
            PhaseKind::Paused => "paused",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
