#![forbid(unsafe_code)]

//! Errors for document editing and comment bookkeeping.

use std::fmt;

use quire_core::CommentId;

/// Errors returned by document, editor and session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocError {
    /// A position past the end of the document.
    PositionOutOfRange { pos: usize, len: usize },
    /// `from > to`, or either end out of range.
    InvalidRange { from: usize, to: usize },
    /// The operation needs a non-empty selection.
    EmptySelection,
    /// Nothing in the range can carry a mark (e.g. it lies inside a code
    /// block).
    NotMarkable { from: usize, to: usize },
    UnknownComment(CommentId),
}

impl fmt::Display for DocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionOutOfRange { pos, len } => {
                write!(f, "position {pos} is outside the document (size {len})")
            }
            Self::InvalidRange { from, to } => write!(f, "invalid range {from}..{to}"),
            Self::EmptySelection => write!(f, "selection is empty"),
            Self::NotMarkable { from, to } => {
                write!(f, "range {from}..{to} has no text that can be marked")
            }
            Self::UnknownComment(id) => write!(f, "comment {id} not found"),
        }
    }
}

impl std::error::Error for DocError {}
