//! Secure directory creation and crash-safe file replacement.
//!
//! Writes go to a temp file in the destination directory and are renamed over
//! the target. Where rename-over-existing fails (Windows), the old file is
//! moved to `.bak` first and restored if the second rename fails too; a
//! crash in that window leaves a `.bak` that [`recover_bak_file`] puts back.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Create `path` (and parents); on Unix tighten it to 0o700 when we own it.
pub(crate) fn ensure_secure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let metadata = fs::metadata(path)?;

        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() != our_uid {
            return Ok(());
        }

        let current_mode = metadata.permissions().mode() & 0o777;
        if current_mode & 0o077 != 0 {
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

/// Create the database file owner-only before SQLite opens it, and tighten
/// any WAL/SHM sidecars left by a previous run.
pub(crate) fn ensure_secure_db_file(path: &Path) -> io::Result<()> {
    if !path.exists() {
        let mut options = OpenOptions::new();
        options.create(true).truncate(false).read(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options.open(path)?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = sidecar_path(path, suffix);
            if sidecar.exists() {
                let _ = fs::set_permissions(&sidecar, fs::Permissions::from_mode(0o600));
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    match path.file_name().map(|name| name.to_string_lossy()) {
        Some(name) => path.with_file_name(format!("{name}{suffix}")),
        None => PathBuf::from(format!("{}{suffix}", path.display())),
    }
}

pub(crate) fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("bak")
}

/// Put back a `.bak` left behind by an interrupted [`atomic_write`].
pub(crate) fn recover_bak_file(path: &Path) {
    let backup = backup_path(path);
    if !path.exists() && backup.exists() {
        match fs::rename(&backup, path) {
            Ok(()) => warn!(
                path = %path.display(),
                "Recovered .bak file from interrupted atomic write"
            ),
            Err(e) => warn!(path = %path.display(), "Failed to recover .bak file: {e}"),
        }
    }
}

/// Replace `path` with `bytes` so readers see either the old or the new file.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup = backup_path(path);
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            debug!(path = %backup.display(), "Failed to remove .bak after atomic write: {e}");
        }
    }
    Ok(())
}
