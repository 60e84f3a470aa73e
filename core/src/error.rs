use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use rostrum_types::PhaseKind;

/// Operations that are only valid from particular floor phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ConfigureBudget,
    Pause,
    Resume,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::ConfigureBudget => "change the budget",
            Operation::Pause => "pause",
            Operation::Resume => "resume",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode session record: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Error)]
pub enum FloorError {
    #[error("cannot {operation} while the floor is {phase}")]
    InvalidState {
        operation: Operation,
        phase: PhaseKind,
    },
    #[error("budget must be at least one second")]
    InvalidBudget,
    #[error("no participant is waiting for the floor")]
    NothingPending,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FloorError {
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, FloorError::InvalidState { .. })
    }
}
