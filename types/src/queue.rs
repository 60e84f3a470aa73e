use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParticipantId;

/// A request to be recognized by the chair.
///
/// `sequence` is the only ordering key; `requested_at` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub participant_id: ParticipantId,
    pub requested_at: DateTime<Utc>,
    pub sequence: u64,
    pub served: bool,
}
