//! Rostrum configuration.
//!
//! Read from `~/.rostrum/config.toml`. A missing file means defaults; every
//! section and key is optional.
//!
//! ```toml
//! [floor]
//! default_budget_seconds = 300
//! admission_open = true
//! default_session = "plenary"
//!
//! [store]
//! backend = "sqlite"            # "memory" | "sqlite" | "file"
//! path = "${ROSTRUM_HOME}/floor.db"
//!
//! [display]
//! poll_interval_ms = 1000
//! high_contrast = false
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

use rostrum_core::{DEFAULT_BUDGET_SECONDS, FloorDefaults};

const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RostrumConfig {
    pub floor: FloorConfig,
    pub store: StoreConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    /// Per-turn allotment for sessions seen for the first time.
    pub default_budget_seconds: u32,
    /// Whether new sessions accept queue entries immediately.
    pub admission_open: bool,
    /// Session used when none is given on the command line.
    pub default_session: Option<String>,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            default_budget_seconds: DEFAULT_BUDGET_SECONDS,
            admission_open: true,
            default_session: None,
        }
    }
}

impl FloorConfig {
    #[must_use]
    pub fn defaults(&self) -> FloorDefaults {
        FloorDefaults {
            budget_seconds: self.default_budget_seconds,
            admission_open: self.admission_open,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
    File,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file (sqlite) or directory (file). Supports `~` and `${VAR}`.
    pub path: Option<String>,
}

impl StoreConfig {
    /// Where the configured backend keeps its data. `None` for the memory
    /// backend, or when no home directory can be found.
    #[must_use]
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if self.backend == StoreBackend::Memory {
            return None;
        }
        if let Some(raw) = self.path.as_deref() {
            return Some(expand_home(&expand_env_vars(raw)));
        }
        let data_dir = data_dir()?;
        Some(match self.backend {
            StoreBackend::File => data_dir.join("sessions"),
            StoreBackend::Sqlite | StoreBackend::Memory => data_dir.join("floor.db"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How often the console refreshes the floor.
    pub poll_interval_ms: u64,
    /// Use ASCII-only glyphs.
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    pub high_contrast: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            ascii_only: false,
            high_contrast: false,
        }
    }
}

impl DisplayConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

impl RostrumConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Persist the default budget to the config file, preserving comments.
    pub fn persist_default_budget(seconds: u32) -> io::Result<()> {
        let path = config_path().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine config path")
        })?;
        persist_default_budget_at(&path, seconds)
    }
}

/// Write `[floor] default_budget_seconds` into the config file at `path`.
///
/// Uses `toml_edit` so comments and unrelated keys survive. Creates the file
/// and its directory when missing.
pub fn persist_default_budget_at(path: &Path, seconds: u32) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let metadata = fs::metadata(parent)?;
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() == our_uid && metadata.permissions().mode() & 0o077 != 0 {
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
        }
    }

    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if !doc.contains_key("floor") {
        doc["floor"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    if !doc["floor"].is_table_like() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "`floor` in the config file is not a table",
        ));
    }
    doc["floor"]["default_budget_seconds"] = toml_edit::value(i64::from(seconds));

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(doc.to_string().as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Replace `${VAR}` with the variable's value (empty when unset).
///
/// An unterminated `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() {
                    out.push_str(&env::var(name).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand_home(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = value.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(value)
}

/// `~/.rostrum`, home of the config file, logs and default stores.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".rostrum"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}
