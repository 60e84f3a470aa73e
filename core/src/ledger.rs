//! Append-only record of completed turns.
//!
//! There is no update or delete: once a [`TurnRecord`] is appended it is
//! history.

use serde::{Deserialize, Serialize};

use rostrum_types::TurnRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnLedger {
    records: Vec<TurnRecord>,
}

impl TurnLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TurnRecord) {
        self.records.push(record);
    }

    /// All turns ascending by `started_at`; ties keep append order.
    #[must_use]
    pub fn list(&self) -> Vec<TurnRecord> {
        let mut records = self.records.clone();
        records.sort_by_key(TurnRecord::started_at);
        records
    }

    #[must_use]
    pub fn last(&self) -> Option<&TurnRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
