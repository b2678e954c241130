#![forbid(unsafe_code)]

//! Quire public facade crate.
//!
//! Re-exports the common types of the internal crates, adds one error type
//! that any of them convert into, and offers a prelude for hosts.
//!
//! # Example
//! ```
//! use quire::prelude::*;
//!
//! fn open_notes(ws: &mut Workspace) -> quire::Result<BufferId> {
//!     Ok(ws.new_untitled()?)
//! }
//!
//! let mut ws = Workspace::init(QuireConfig::default(), Box::new(MemoryPersistence::new()));
//! let id = open_notes(&mut ws).unwrap();
//! assert_eq!(ws.store().active_buffer(), Some(id));
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use quire_core::logging::init_logging;
pub use quire_core::{
    BufferId, CommentId, ConfigError, Debouncer, LoggingConfig, NodeId, PaneId, Point,
    QuireConfig, Rect, Side,
};

// --- Buffer re-exports -----------------------------------------------------

pub use quire_buffer::{
    Buffer, BufferContent, BufferError, BufferEvent, BufferKind, BufferStore, BufferSyncManager,
    FsPersistence, MemoryPersistence, Persistence, PersistenceError,
};

// --- Layout re-exports -----------------------------------------------------

pub use quire_layout::{
    DropZone, DropZoneKind, LayoutError, Pane, PaneGeometry, Placement, SolvedGeometry,
    SplitDirection, SplitTree,
};

// --- Markdown re-exports ---------------------------------------------------

#[cfg(feature = "markdown")]
pub use quire_markdown::{
    Comment, CommentStatus, DocError, Document, MarkSet, MarkdownEditor, MarkdownSession,
    OutlineEntry, RichTextEngine, SearchMatch, Selection, markdown_to_html, parse_markdown,
    to_html, to_markdown,
};

// --- Workspace re-exports --------------------------------------------------

#[cfg(feature = "workspace")]
pub use quire_workspace::{
    CloseOutcome, ConfirmChoice, ConfirmationPrompt, ConfirmationRequest, DragPayload,
    DragSession, DropOutcome, Workspace, WorkspaceError,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Quire hosts.
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Buffer(BufferError),
    Layout(LayoutError),
    #[cfg(feature = "markdown")]
    Document(DocError),
    #[cfg(feature = "workspace")]
    Workspace(WorkspaceError),
    /// Malformed JSON (comments, snapshots, drag payloads).
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Buffer(err) => write!(f, "{err}"),
            Self::Layout(err) => write!(f, "{err}"),
            #[cfg(feature = "markdown")]
            Self::Document(err) => write!(f, "{err}"),
            #[cfg(feature = "workspace")]
            Self::Workspace(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Buffer(err) => Some(err),
            Self::Layout(err) => Some(err),
            #[cfg(feature = "markdown")]
            Self::Document(err) => Some(err),
            #[cfg(feature = "workspace")]
            Self::Workspace(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<BufferError> for Error {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

#[cfg(feature = "markdown")]
impl From<DocError> for Error {
    fn from(err: DocError) -> Self {
        Self::Document(err)
    }
}

#[cfg(feature = "workspace")]
impl From<WorkspaceError> for Error {
    fn from(err: WorkspaceError) -> Self {
        Self::Workspace(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Standard result type for Quire APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BufferId, BufferStore, Error, FsPersistence, MemoryPersistence, PaneId, Persistence,
        Placement, Point, QuireConfig, Rect, Result, SplitDirection,
    };

    #[cfg(feature = "markdown")]
    pub use crate::{MarkdownSession, RichTextEngine, Selection};

    #[cfg(feature = "workspace")]
    pub use crate::{ConfirmChoice, ConfirmationPrompt, Workspace};

    pub use crate::{buffer, core, layout};

    #[cfg(feature = "markdown")]
    pub use crate::markdown;

    #[cfg(feature = "workspace")]
    pub use crate::workspace;
}

pub use quire_buffer as buffer;
pub use quire_core as core;
pub use quire_layout as layout;
#[cfg(feature = "markdown")]
pub use quire_markdown as markdown;
#[cfg(feature = "workspace")]
pub use quire_workspace as workspace;
