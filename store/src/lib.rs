//! Durable [`FloorStore`](rostrum_core::FloorStore) backends.
//!
//! - **`SqliteStore`**: one row per session in a WAL-mode database
//! - **`FileStore`**: one JSON file per session, replaced atomically (temp + rename)

mod file;
mod fs_util;
mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;
