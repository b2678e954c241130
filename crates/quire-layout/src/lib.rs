#![forbid(unsafe_code)]

//! Editor split tree for Quire.
//!
//! The layout is an n-ary tree of splits with panes at the leaves, stored as
//! an arena of [`NodeRecord`]s keyed by id. Panes hold buffer ids (tabs),
//! never buffer content.
//!
//! - [`SplitTree`] - structural operations (split, close, resize) and tab routing
//! - [`SplitTree::solve_layout`] - pixel rectangles for a viewport
//! - [`resolve_drop_target`] - edge/center drop zones for drag and drop
//! - [`SplitTreeSnapshot`] - serde form with validation and invariant reports
//!
//! # Example
//! ```
//! use quire_core::{BufferId, Point, Rect};
//! use quire_layout::{DropZoneKind, Pane, Placement, SplitDirection, SplitTree, resolve_drop_target};
//!
//! let mut tree = SplitTree::new();
//! let left = tree.initialize();
//! tree.add_buffer(left, BufferId::MIN, true).unwrap();
//! let right = tree
//!     .split_pane(left, SplitDirection::Vertical, Placement::After, Pane::empty())
//!     .unwrap();
//!
//! let geometry = tree.solve_layout(Rect::from_size(800.0, 600.0)).unwrap();
//! let zone = resolve_drop_target(Point::new(600.0, 300.0), &tree.pane_ids(), &geometry, 48.0);
//! assert_eq!(zone.map(|z| (z.pane_id, z.kind)), Some((right, DropZoneKind::Center)));
//! ```

pub mod buffers;
pub mod drop_zone;
pub mod error;
pub mod geometry;
pub mod model;
pub mod snapshot;
pub mod tree;

pub use drop_zone::{DropZone, DropZoneKind, drop_zones, resolve_drop_target};
pub use error::{InvariantCode, LayoutError, LayoutModelError};
pub use geometry::{PaneGeometry, SolvedGeometry};
pub use model::{NodeKind, NodeRecord, Pane, Placement, Split, SplitDirection};
pub use snapshot::{
    InvariantIssue, InvariantReport, SIZE_TOLERANCE, SPLIT_TREE_SCHEMA_VERSION, SplitTreeSnapshot,
};
pub use tree::{ClosedPane, LayoutOptions, SplitTree};
