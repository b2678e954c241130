#![forbid(unsafe_code)]

//! Workspace service for Quire.
//!
//! Owns the buffer store and the split tree and keeps them consistent:
//! every open buffer is shown by some pane, closing a dirty tab asks
//! first, and dropping a tab or a file onto a pane edge splits the pane.
//!
//! - [`Workspace`] - open, focus, split, close, save, drag and drop
//! - [`ConfirmationPrompt`] - the unsaved-changes dialog seam
//! - [`DragSession`] / [`DragPayload`] - an in-flight drag and its JSON form
//!
//! # Example
//! ```
//! use quire_buffer::{BufferContent, MemoryPersistence};
//! use quire_core::{Point, QuireConfig, Rect};
//! use quire_workspace::{DropOutcome, Workspace};
//!
//! let files = MemoryPersistence::new();
//! files.insert("a.md", BufferContent::Text("# A\n".to_string()));
//! let mut ws = Workspace::init(QuireConfig::default(), Box::new(files));
//! let left = ws.active_pane();
//! let a = ws.open_file("a.md").unwrap();
//!
//! // Drag the tab onto the right edge of its own pane.
//! let geometry = ws.tree().solve_layout(Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();
//! let session = ws.begin_tab_drag(left, a).unwrap();
//! let outcome = ws.drop(session, Point::new(790.0, 300.0), &geometry).unwrap();
//! assert!(matches!(outcome, Some(DropOutcome::Split { buffer_id, .. }) if buffer_id == a));
//! assert_eq!(ws.tree().pane_count(), 2);
//! ```

pub mod drag;
pub mod error;
pub mod tabs;
pub mod workspace;

pub use drag::{DragPayload, DragSession, DropOutcome};
pub use error::WorkspaceError;
pub use tabs::{
    CloseOutcome, ConfirmChoice, ConfirmationPrompt, ConfirmationRequest, DeferredPrompt,
    TabController,
};
pub use workspace::{Result, Workspace};
