//! Core domain types for Rostrum.
//!
//! Pure data shared by the floor engine, stores and display surfaces: no IO,
//! no locking, no clock reads. Everything here can be used from any layer.

mod ids;
mod phase;
mod queue;
mod snapshot;
mod turn;

pub use ids::{EmptyIdError, ParticipantId, SessionId};
pub use phase::{FloorPhase, PhaseKind};
pub use queue::QueueEntry;
pub use snapshot::{FloorSnapshot, format_clock};
pub use turn::{TurnEnding, TurnRecord};
