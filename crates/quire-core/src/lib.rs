#![forbid(unsafe_code)]

//! Core: identifiers, pixel geometry, debouncing, logging and configuration.
//!
//! Everything in this crate is host-agnostic. Time is always passed in
//! explicitly (`Instant`) so timing behavior is deterministic under test.

pub mod config;
pub mod debounce;
pub mod geometry;
pub mod id;
pub mod logging;

pub use config::{ConfigError, LoggingConfig, QuireConfig};
pub use debounce::{DebounceStats, Debouncer};
pub use geometry::{Point, Rect, Side};
pub use id::{BufferId, CommentId, IdAllocator, NodeId, PaneId};

// Re-export tracing macros at crate root for ergonomic use.
pub use logging::{debug, debug_span, error, info, info_span, trace, trace_span, warn};
