//! Storage seam for session records.
//!
//! The scheduler owns the live state; a store only mirrors it so a restarted
//! process (or a reloaded display) picks up where the floor left off.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use rostrum_types::SessionId;

use crate::error::StoreError;
use crate::session::SessionFloor;

pub trait FloorStore: Send + Sync {
    fn load(&self, session: &SessionId) -> Result<Option<SessionFloor>, StoreError>;

    fn save(&self, session: &SessionId, record: &SessionFloor) -> Result<(), StoreError>;
}

/// Process-local store. Records are kept serialized so a load always yields a
/// fresh copy, exactly like the durable backends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<SessionId, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FloorStore for MemoryStore {
    fn load(&self, session: &SessionId) -> Result<Option<SessionFloor>, StoreError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(session)
            .map(|json| serde_json::from_str(json))
            .transpose()
            .map_err(StoreError::from)
    }

    fn save(&self, session: &SessionId, record: &SessionFloor) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.clone(), json);
        Ok(())
    }
}
