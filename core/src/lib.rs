//! Floor-time allocation engine for Rostrum.
//!
//! Grants one participant at a time an exclusive, revocable speaking slot,
//! counts its budget down with pause/resume, keeps a FIFO admission queue and
//! an append-only ledger of completed turns.
//!
//! The engine does no background work. Displays call
//! [`FloorScheduler::refresh_remaining`] on their own cadence and every reader
//! converges on the same remaining time because elapsed time is derived from
//! clock deltas, never from counted ticks.

pub mod clock;
pub mod commands;
mod error;
mod floor;
mod ledger;
mod queue;
mod scheduler;
mod session;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{Command, CommandError, CommandOutput, command_help_summary, execute};
pub use error::{FloorError, Operation, StoreError};
pub use floor::FloorState;
pub use ledger::TurnLedger;
pub use queue::AdmissionQueue;
pub use scheduler::{DEFAULT_BUDGET_SECONDS, FloorDefaults, FloorScheduler};
pub use session::{Refresh, SessionFloor};
pub use store::{FloorStore, MemoryStore};
