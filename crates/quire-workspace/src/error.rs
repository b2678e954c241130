#![forbid(unsafe_code)]

use std::fmt;

use quire_buffer::BufferError;
use quire_core::{BufferId, PaneId};
use quire_layout::LayoutError;

/// Errors returned by [`Workspace`](crate::Workspace) operations.
#[derive(Debug)]
pub enum WorkspaceError {
    Buffer(BufferError),
    Layout(LayoutError),
    /// A close is already waiting for the user's answer in this pane.
    ConfirmationPending(PaneId),
    /// No close is waiting in this pane.
    NoPendingConfirmation(PaneId),
    /// No editor is attached for this pane/buffer pair.
    NoEditor { pane_id: PaneId, buffer_id: BufferId },
    /// A drag payload could not be encoded or decoded.
    Payload(serde_json::Error),
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(err) => write!(f, "buffer error: {err}"),
            Self::Layout(err) => write!(f, "layout error: {err}"),
            Self::ConfirmationPending(pane) => {
                write!(f, "pane {pane} already has a close confirmation open")
            }
            Self::NoPendingConfirmation(pane) => {
                write!(f, "pane {pane} has no close confirmation open")
            }
            Self::NoEditor { pane_id, buffer_id } => {
                write!(f, "no editor for buffer {buffer_id} in pane {pane_id}")
            }
            Self::Payload(err) => write!(f, "invalid drag payload: {err}"),
        }
    }
}

impl std::error::Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Buffer(err) => Some(err),
            Self::Layout(err) => Some(err),
            Self::Payload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BufferError> for WorkspaceError {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}

impl From<LayoutError> for WorkspaceError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl From<serde_json::Error> for WorkspaceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err)
    }
}
