#![forbid(unsafe_code)]

//! Stable opaque identifiers.
//!
//! `0` is reserved/invalid so IDs are always non-zero. Allocation is
//! monotonic; an ID is never reused within one allocator.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Lowest valid ID.
            pub const MIN: Self = Self(1);

            /// Create an ID, rejecting 0.
            #[must_use]
            pub const fn new(raw: u64) -> Option<Self> {
                if raw == 0 { None } else { Some(Self(raw)) }
            }

            /// Get the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Return the next ID, or `None` on overflow.
            #[must_use]
            pub const fn checked_next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(next) => Some(Self(next)),
                    None => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::MIN
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of one open buffer in the buffer store.
    BufferId,
    "buf-"
);

define_id!(
    /// Identifier of a node (pane or split) in the layout tree.
    NodeId,
    "node-"
);

define_id!(
    /// Identifier of a document comment.
    CommentId,
    "comment-"
);

/// Panes are the leaf nodes of the layout tree and share its ID space.
pub type PaneId = NodeId;

/// Deterministic allocator for any of the ID types above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Start allocating at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Start allocating from a known raw value (clamped to 1).
    #[must_use]
    pub const fn with_next(next: u64) -> Self {
        Self {
            next: if next == 0 { 1 } else { next },
        }
    }

    /// Peek at the next raw value without consuming it.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Allocate the next raw value. Saturates at `u64::MAX`.
    pub fn allocate_raw(&mut self) -> u64 {
        let current = self.next;
        self.next = self.next.saturating_add(1);
        current
    }

    pub fn allocate_buffer(&mut self) -> BufferId {
        BufferId(self.allocate_raw())
    }

    pub fn allocate_node(&mut self) -> NodeId {
        NodeId(self.allocate_raw())
    }

    pub fn allocate_comment(&mut self) -> CommentId {
        CommentId(self.allocate_raw())
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
