#![forbid(unsafe_code)]

//! Load/save collaborator for buffer content.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 BufferStore                   │
//! │   - owns every Buffer                         │
//! │   - delegates file I/O to a Persistence impl  │
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │                 Persistence                   │
//! │   - MemoryPersistence: in-memory (tests)      │
//! │   - FsPersistence: local filesystem           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `PersistenceError::Missing` | path does not exist | buffer `error` set, stays open |
//! | `PersistenceError::Io` | read/write failure | buffer `error` set, stays dirty |
//! | `PersistenceError::Unavailable` | backend refused | same as I/O |
//!
//! No retries are attempted; the user retries manually.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::buffer::{BufferContent, BufferKind};

/// Errors raised by a persistence backend.
#[derive(Debug)]
pub enum PersistenceError {
    Io { path: PathBuf, source: std::io::Error },
    Missing { path: PathBuf },
    Unavailable(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "I/O error on {}: {source}", path.display()),
            Self::Missing { path } => write!(f, "file not found: {}", path.display()),
            Self::Unavailable(msg) => write!(f, "persistence unavailable: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Missing { .. } | Self::Unavailable(_) => None,
        }
    }
}

/// File metadata reported on load and save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub content: BufferContent,
    pub metadata: FileMetadata,
}

/// Decode raw bytes as text when the path looks like text and the bytes are UTF-8.
#[must_use]
pub fn decode_content(path: &Path, bytes: Vec<u8>) -> BufferContent {
    if BufferKind::from_path(path) != BufferKind::Text {
        return BufferContent::Bytes(bytes);
    }
    match String::from_utf8(bytes) {
        Ok(text) => BufferContent::Text(text),
        Err(err) => BufferContent::Bytes(err.into_bytes()),
    }
}

/// Pluggable file backend.
///
/// Implementations must be thread-safe (`Send + Sync`) so a host may share
/// one backend between services.
pub trait Persistence: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read the content and metadata at `path`.
    fn load(&self, path: &Path) -> Result<LoadedFile, PersistenceError>;

    /// Write `content` to `path`, replacing whatever is there.
    fn save(&self, path: &Path, content: &BufferContent) -> Result<FileMetadata, PersistenceError>;
}

/// In-memory backend for tests and ephemeral sessions.
///
/// Clones share the same underlying map, so a test can keep a handle while
/// the store owns another.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    files: Arc<RwLock<HashMap<PathBuf, BufferContent>>>,
    fail_saves: Arc<RwLock<bool>>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: BufferContent) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), content);
        }
    }

    /// Current stored content at `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<BufferContent> {
        self.files.read().ok()?.get(path).cloned()
    }

    /// Make every subsequent save fail with `Unavailable`.
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.write() {
            *flag = fail;
        }
    }
}

impl Persistence for MemoryPersistence {
    fn name(&self) -> &str {
        "MemoryPersistence"
    }

    fn load(&self, path: &Path) -> Result<LoadedFile, PersistenceError> {
        let files = self
            .files
            .read()
            .map_err(|_| PersistenceError::Unavailable("lock poisoned".into()))?;
        let content = files.get(path).cloned().ok_or_else(|| PersistenceError::Missing {
            path: path.to_path_buf(),
        })?;
        Ok(LoadedFile {
            metadata: FileMetadata {
                size: content.len() as u64,
                modified: None,
            },
            content,
        })
    }

    fn save(&self, path: &Path, content: &BufferContent) -> Result<FileMetadata, PersistenceError> {
        if self.fail_saves.read().map(|flag| *flag).unwrap_or(false) {
            return Err(PersistenceError::Unavailable("saves disabled".into()));
        }
        let mut files = self
            .files
            .write()
            .map_err(|_| PersistenceError::Unavailable("lock poisoned".into()))?;
        files.insert(path.to_path_buf(), content.clone());
        Ok(FileMetadata {
            size: content.len() as u64,
            modified: Some(SystemTime::now()),
        })
    }
}

impl fmt::Debug for MemoryPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.files.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryPersistence")
            .field("files", &count)
            .finish()
    }
}

/// Local filesystem backend.
///
/// Writes use a temporary sibling file + rename so a failed save never
/// truncates the original.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPersistence;

impl FsPersistence {
    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".quire-tmp");
        path.with_file_name(name)
    }
}

impl Persistence for FsPersistence {
    fn name(&self) -> &str {
        "FsPersistence"
    }

    fn load(&self, path: &Path) -> Result<LoadedFile, PersistenceError> {
        if !path.exists() {
            return Err(PersistenceError::Missing {
                path: path.to_path_buf(),
            });
        }
        let io_err = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let bytes = fs::read(path).map_err(io_err)?;
        let meta = fs::metadata(path).map_err(io_err)?;
        Ok(LoadedFile {
            content: decode_content(path, bytes),
            metadata: FileMetadata {
                size: meta.len(),
                modified: meta.modified().ok(),
            },
        })
    }

    fn save(&self, path: &Path, content: &BufferContent) -> Result<FileMetadata, PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp_path = Self::temp_path(path);
        {
            let mut file = File::create(&tmp_path).map_err(io_err)?;
            file.write_all(content.as_bytes()).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&tmp_path, path).map_err(io_err)?;
        let meta = fs::metadata(path).map_err(io_err)?;
        tracing::debug!(path = %path.display(), size = meta.len(), "file saved");
        Ok(FileMetadata {
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip_and_shared_handles() {
        let backend = MemoryPersistence::new();
        let handle = backend.clone();
        backend
            .save(Path::new("a.txt"), &BufferContent::Text("hi".into()))
            .expect("save");
        assert_eq!(
            handle.get(Path::new("a.txt")),
            Some(BufferContent::Text("hi".into()))
        );
        let loaded = handle.load(Path::new("a.txt")).expect("load");
        assert_eq!(loaded.metadata.size, 2);
    }

    #[test]
    fn memory_missing_file() {
        let err = MemoryPersistence::new()
            .load(Path::new("nope.txt"))
            .expect_err("missing");
        assert!(matches!(err, PersistenceError::Missing { .. }));
    }

    #[test]
    fn memory_failing_saves() {
        let backend = MemoryPersistence::new();
        backend.set_fail_saves(true);
        let err = backend
            .save(Path::new("a.txt"), &BufferContent::Text(String::new()))
            .expect_err("fails");
        assert!(err.to_string().contains("saves disabled"));
    }

    #[test]
    fn fs_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sub").join("notes.md");
        let backend = FsPersistence;
        let meta = backend
            .save(&path, &BufferContent::Text("# Title\n".into()))
            .expect("save");
        assert_eq!(meta.size, 8);
        let loaded = backend.load(&path).expect("load");
        assert_eq!(loaded.content, BufferContent::Text("# Title\n".into()));
        assert!(!FsPersistence::temp_path(&path).exists());
    }

    #[test]
    fn fs_non_utf8_text_extension_falls_back_to_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weird.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");
        let loaded = FsPersistence.load(&path).expect("load");
        assert_eq!(loaded.content, BufferContent::Bytes(vec![0xff, 0xfe, 0x00]));
    }

    #[test]
    fn fs_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FsPersistence
            .load(&dir.path().join("absent.md"))
            .expect_err("missing");
        assert!(matches!(err, PersistenceError::Missing { .. }));
    }
}
