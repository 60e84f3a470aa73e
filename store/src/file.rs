//! Directory of `<session>.json` files, one per session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use rostrum_core::{FloorStore, SessionFloor, StoreError};
use rostrum_types::SessionId;

use crate::fs_util::{atomic_write, ensure_secure_dir, recover_bak_file};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_secure_dir(&dir)
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the slot for `session`.
    ///
    /// Anything outside `[A-Za-z0-9._-]` is hex-escaped so an id can never
    /// name a path outside the store directory.
    #[must_use]
    pub fn slot_path(&self, session: &SessionId) -> PathBuf {
        let mut name = String::with_capacity(session.as_str().len() + 5);
        for byte in session.as_str().bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => name.push(byte as char),
                b'.' if !name.is_empty() => name.push('.'),
                other => name.push_str(&format!("%{other:02X}")),
            }
        }
        name.push_str(".json");
        self.dir.join(name)
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FloorStore for FileStore {
    fn load(&self, session: &SessionId) -> Result<Option<SessionFloor>, StoreError> {
        let path = self.slot_path(session);
        recover_bak_file(&path);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&path, err)),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, session: &SessionId, record: &SessionFloor) -> Result<(), StoreError> {
        let path = self.slot_path(session);
        let json = serde_json::to_vec_pretty(record)?;
        atomic_write(&path, &json).map_err(|err| io_error(&path, err))
    }
}
