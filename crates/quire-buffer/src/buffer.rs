#![forbid(unsafe_code)]

//! The buffer model.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use quire_core::BufferId;
use serde::{Deserialize, Serialize};

/// Content discriminant for a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    Text,
    Image,
    Pdf,
    Video,
    Audio,
    Binary,
}

impl BufferKind {
    /// Classify by file extension (case-insensitive, without the dot).
    ///
    /// Unknown extensions are treated as text; load falls back to
    /// [`BufferKind::Binary`] if the bytes are not UTF-8.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "ico" | "svgz" | "tiff" => {
                Self::Image
            }
            "pdf" => Self::Pdf,
            "mp4" | "webm" | "mov" | "mkv" | "avi" => Self::Video,
            "mp3" | "wav" | "ogg" | "flac" | "m4a" | "aac" => Self::Audio,
            "exe" | "dll" | "so" | "dylib" | "bin" | "o" | "a" | "zip" | "gz" | "tar" | "wasm" => {
                Self::Binary
            }
            _ => Self::Text,
        }
    }

    /// Classify a path by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Text, Self::from_extension)
    }

    /// Only text buffers accept content mutation.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Best-effort MIME type for an extension of this kind.
    #[must_use]
    pub fn mime_type(self, ext: Option<&str>) -> &'static str {
        let ext = ext.map(str::to_ascii_lowercase);
        match (self, ext.as_deref()) {
            (Self::Text, Some("md" | "markdown")) => "text/markdown",
            (Self::Text, Some("json")) => "application/json",
            (Self::Text, Some("html" | "htm")) => "text/html",
            (Self::Text, _) => "text/plain",
            (Self::Image, Some("png")) => "image/png",
            (Self::Image, Some("jpg" | "jpeg")) => "image/jpeg",
            (Self::Image, Some("gif")) => "image/gif",
            (Self::Image, Some("webp")) => "image/webp",
            (Self::Image, _) => "image/*",
            (Self::Pdf, _) => "application/pdf",
            (Self::Video, _) => "video/*",
            (Self::Audio, _) => "audio/*",
            (Self::Binary, _) => "application/octet-stream",
        }
    }
}

/// Raw content of a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum BufferContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl BufferContent {
    /// Borrow as text, if this is text content.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl Default for BufferContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Cursor location inside a text buffer (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

/// Scroll offset of the editing surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub top: f32,
    pub left: f32,
}

/// One open document.
///
/// Owned exclusively by [`crate::BufferStore`]; everything else refers to it
/// by [`BufferId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub id: BufferId,
    pub name: String,
    /// Absent for untitled/virtual buffers.
    pub path: Option<PathBuf>,
    pub extension: Option<String>,
    pub content: BufferContent,
    /// Content as of the last successful load or save.
    pub saved_content: BufferContent,
    pub mime_type: String,
    pub kind: BufferKind,
    pub is_editable: bool,
    pub is_dirty: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub file_size: u64,
    pub cursor: CursorPosition,
    pub scroll: ScrollPosition,
    pub last_modified: SystemTime,
    /// Bumped on every content write; lets editors detect foreign writes.
    pub revision: u64,
}

impl Buffer {
    /// A new empty, editable, untitled text buffer.
    #[must_use]
    pub fn untitled(id: BufferId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: None,
            extension: None,
            content: BufferContent::default(),
            saved_content: BufferContent::default(),
            mime_type: BufferKind::Text.mime_type(None).to_string(),
            kind: BufferKind::Text,
            is_editable: true,
            is_dirty: false,
            is_loading: false,
            error: None,
            file_size: 0,
            cursor: CursorPosition::default(),
            scroll: ScrollPosition::default(),
            last_modified: SystemTime::now(),
            revision: 0,
        }
    }

    /// A placeholder for a file that is about to be loaded.
    #[must_use]
    pub fn loading(id: BufferId, path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string);
        let kind = BufferKind::from_path(path);
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            path: Some(path.to_path_buf()),
            mime_type: kind.mime_type(extension.as_deref()).to_string(),
            extension,
            kind,
            is_editable: kind.is_editable(),
            is_loading: true,
            ..Self::untitled(id, name)
        }
    }

    /// Text content, if this is a text buffer.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }

    /// Whether the current content differs from the last saved content.
    #[must_use]
    pub fn differs_from_saved(&self) -> bool {
        self.content != self.saved_content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(BufferKind::from_extension("PNG"), BufferKind::Image);
        assert_eq!(BufferKind::from_extension("pdf"), BufferKind::Pdf);
        assert_eq!(BufferKind::from_extension("md"), BufferKind::Text);
        assert_eq!(BufferKind::from_extension("wasm"), BufferKind::Binary);
        assert_eq!(BufferKind::from_path(Path::new("Makefile")), BufferKind::Text);
    }

    #[test]
    fn only_text_is_editable() {
        assert!(BufferKind::Text.is_editable());
        for kind in [
            BufferKind::Image,
            BufferKind::Pdf,
            BufferKind::Video,
            BufferKind::Audio,
            BufferKind::Binary,
        ] {
            assert!(!kind.is_editable(), "{kind:?}");
        }
    }

    #[test]
    fn loading_placeholder_derives_metadata() {
        let buffer = Buffer::loading(BufferId::MIN, Path::new("/tmp/notes/README.md"));
        assert_eq!(buffer.name, "README.md");
        assert_eq!(buffer.extension.as_deref(), Some("md"));
        assert_eq!(buffer.mime_type, "text/markdown");
        assert!(buffer.is_loading);
        assert!(buffer.is_editable);
        assert!(!buffer.is_dirty);
    }

    #[test]
    fn image_placeholder_is_read_only() {
        let buffer = Buffer::loading(BufferId::MIN, Path::new("logo.png"));
        assert_eq!(buffer.kind, BufferKind::Image);
        assert!(!buffer.is_editable);
        assert_eq!(buffer.mime_type, "image/png");
    }
}
