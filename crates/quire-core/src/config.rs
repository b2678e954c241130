#![forbid(unsafe_code)]

//! Workspace configuration.
//!
//! [`QuireConfig`] is a plain serde struct persisted as JSON. Missing fields
//! take their defaults, so older files keep loading as fields are added.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | File absent | `load` returns `QuireConfig::default()` |
//! | File unreadable | `ConfigError::Io` |
//! | Malformed JSON | `ConfigError::Parse` |

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default trailing debounce for buffer content sync.
pub const DEFAULT_SYNC_DEBOUNCE_MS: u64 = 500;
/// Default debounce for search query changes.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 100;
/// Default thickness of the split bands along each pane border.
pub const DEFAULT_DROP_EDGE_THRESHOLD_PX: f32 = 48.0;

/// Errors raised while loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "config I/O error at {}: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config at {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

/// Subscriber settings for [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `QUIRE_LOG` is unset.
    pub default_directive: String,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            ansi: true,
            with_target: true,
        }
    }
}

/// Top-level configuration shared by every Quire service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuireConfig {
    /// Quiet window before local edits are committed to the buffer store.
    pub sync_debounce_ms: u64,
    /// Quiet window before a changed search query is re-run.
    pub search_debounce_ms: u64,
    /// Thickness of the "split" drop band along each pane border.
    pub drop_edge_threshold_px: f32,
    /// Share given to the original pane when splitting.
    pub default_split_percent: f32,
    /// Lower bound for any child size when resizing a split.
    pub min_pane_percent: f32,
    pub logging: LoggingConfig,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            sync_debounce_ms: DEFAULT_SYNC_DEBOUNCE_MS,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            drop_edge_threshold_px: DEFAULT_DROP_EDGE_THRESHOLD_PX,
            default_split_percent: 50.0,
            min_pane_percent: 5.0,
            logging: LoggingConfig::default(),
        }
    }
}

impl QuireConfig {
    #[must_use]
    pub fn sync_debounce(&self) -> Duration {
        Duration::from_millis(self.sync_debounce_ms)
    }

    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    #[must_use]
    pub fn with_sync_debounce(mut self, window: Duration) -> Self {
        self.sync_debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_drop_edge_threshold(mut self, px: f32) -> Self {
        self.drop_edge_threshold_px = px;
        self
    }

    /// Load from a JSON file; an absent file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write as pretty JSON using a temp file + rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp_path = path.to_path_buf();
        tmp_path.set_extension("json.tmp");
        {
            let file = File::create(&tmp_path).map_err(io_err)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            writer.flush().map_err(io_err)?;
        }
        fs::rename(&tmp_path, path).map_err(io_err)?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }
}
