#![forbid(unsafe_code)]

//! Layout errors.

use std::fmt;

use quire_core::{BufferId, NodeId, PaneId};
use serde::{Deserialize, Serialize};

use crate::snapshot::SPLIT_TREE_SCHEMA_VERSION;

/// Structural validation failures for a tree or snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutModelError {
    UnsupportedSchemaVersion {
        version: u16,
    },
    DuplicateNodeId {
        node_id: NodeId,
    },
    MissingRoot {
        root: NodeId,
    },
    /// Nodes exist but the tree has no root.
    RootlessNodes {
        count: usize,
    },
    RootHasParent {
        root: NodeId,
        parent: NodeId,
    },
    MissingParent {
        node_id: NodeId,
        parent: NodeId,
    },
    MissingChild {
        parent: NodeId,
        child: NodeId,
    },
    MultipleParents {
        child: NodeId,
        first_parent: NodeId,
        second_parent: NodeId,
    },
    ParentMismatch {
        node_id: NodeId,
        expected: Option<NodeId>,
        actual: Option<NodeId>,
    },
    TooFewChildren {
        node_id: NodeId,
        count: usize,
    },
    SizeCountMismatch {
        node_id: NodeId,
        children: usize,
        sizes: usize,
    },
    NonPositiveSize {
        node_id: NodeId,
        index: usize,
    },
    SizesNotNormalized {
        node_id: NodeId,
        sum: f32,
    },
    InconsistentPane {
        pane_id: PaneId,
    },
    CycleDetected {
        node_id: NodeId,
    },
    UnreachableNode {
        node_id: NodeId,
    },
    NextIdNotGreaterThanExisting {
        next_id: u64,
        max_existing: NodeId,
    },
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    UnsupportedSchemaVersion,
    DuplicateNodeId,
    MissingRoot,
    RootlessNodes,
    RootHasParent,
    MissingParent,
    MissingChild,
    MultipleParents,
    ParentMismatch,
    TooFewChildren,
    SizeCountMismatch,
    NonPositiveSize,
    SizesNotNormalized,
    InconsistentPane,
    CycleDetected,
    UnreachableNode,
    NextIdNotGreaterThanExisting,
}

impl LayoutModelError {
    #[must_use]
    pub const fn code(&self) -> InvariantCode {
        match self {
            Self::UnsupportedSchemaVersion { .. } => InvariantCode::UnsupportedSchemaVersion,
            Self::DuplicateNodeId { .. } => InvariantCode::DuplicateNodeId,
            Self::MissingRoot { .. } => InvariantCode::MissingRoot,
            Self::RootlessNodes { .. } => InvariantCode::RootlessNodes,
            Self::RootHasParent { .. } => InvariantCode::RootHasParent,
            Self::MissingParent { .. } => InvariantCode::MissingParent,
            Self::MissingChild { .. } => InvariantCode::MissingChild,
            Self::MultipleParents { .. } => InvariantCode::MultipleParents,
            Self::ParentMismatch { .. } => InvariantCode::ParentMismatch,
            Self::TooFewChildren { .. } => InvariantCode::TooFewChildren,
            Self::SizeCountMismatch { .. } => InvariantCode::SizeCountMismatch,
            Self::NonPositiveSize { .. } => InvariantCode::NonPositiveSize,
            Self::SizesNotNormalized { .. } => InvariantCode::SizesNotNormalized,
            Self::InconsistentPane { .. } => InvariantCode::InconsistentPane,
            Self::CycleDetected { .. } => InvariantCode::CycleDetected,
            Self::UnreachableNode { .. } => InvariantCode::UnreachableNode,
            Self::NextIdNotGreaterThanExisting { .. } => {
                InvariantCode::NextIdNotGreaterThanExisting
            }
        }
    }

    /// The node the finding is about, if any.
    #[must_use]
    pub const fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::UnsupportedSchemaVersion { .. }
            | Self::RootlessNodes { .. }
            | Self::NextIdNotGreaterThanExisting { .. } => None,
            Self::MissingRoot { root } | Self::RootHasParent { root, .. } => Some(*root),
            Self::MissingChild { parent, .. } => Some(*parent),
            Self::MultipleParents { child, .. } => Some(*child),
            Self::InconsistentPane { pane_id } => Some(*pane_id),
            Self::DuplicateNodeId { node_id }
            | Self::MissingParent { node_id, .. }
            | Self::ParentMismatch { node_id, .. }
            | Self::TooFewChildren { node_id, .. }
            | Self::SizeCountMismatch { node_id, .. }
            | Self::NonPositiveSize { node_id, .. }
            | Self::SizesNotNormalized { node_id, .. }
            | Self::CycleDetected { node_id }
            | Self::UnreachableNode { node_id } => Some(*node_id),
        }
    }
}

impl fmt::Display for LayoutModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { version } => write!(
                f,
                "unsupported split tree schema version {version} (expected {SPLIT_TREE_SCHEMA_VERSION})"
            ),
            Self::DuplicateNodeId { node_id } => write!(f, "duplicate node id {node_id}"),
            Self::MissingRoot { root } => write!(f, "root node {root} not found"),
            Self::RootlessNodes { count } => write!(f, "{count} nodes exist but the tree has no root"),
            Self::RootHasParent { root, parent } => {
                write!(f, "root node {root} must not have parent {parent}")
            }
            Self::MissingParent { node_id, parent } => {
                write!(f, "node {node_id} references missing parent {parent}")
            }
            Self::MissingChild { parent, child } => {
                write!(f, "split {parent} references missing child {child}")
            }
            Self::MultipleParents {
                child,
                first_parent,
                second_parent,
            } => write!(
                f,
                "node {child} has multiple parents: {first_parent} and {second_parent}"
            ),
            Self::ParentMismatch {
                node_id,
                expected,
                actual,
            } => write!(
                f,
                "node {node_id} parent mismatch: expected {:?}, got {:?}",
                expected.map(NodeId::get),
                actual.map(NodeId::get)
            ),
            Self::TooFewChildren { node_id, count } => {
                write!(f, "split {node_id} has {count} children (need at least 2)")
            }
            Self::SizeCountMismatch {
                node_id,
                children,
                sizes,
            } => write!(f, "split {node_id} has {children} children but {sizes} sizes"),
            Self::NonPositiveSize { node_id, index } => {
                write!(f, "split {node_id} child {index} has a non-positive size")
            }
            Self::SizesNotNormalized { node_id, sum } => {
                write!(f, "split {node_id} sizes sum to {sum}, expected 100")
            }
            Self::InconsistentPane { pane_id } => write!(
                f,
                "pane {pane_id} has an active buffer outside its tabs or duplicate tabs"
            ),
            Self::CycleDetected { node_id } => write!(f, "cycle detected at node {node_id}"),
            Self::UnreachableNode { node_id } => {
                write!(f, "node {node_id} is unreachable from root")
            }
            Self::NextIdNotGreaterThanExisting {
                next_id,
                max_existing,
            } => write!(
                f,
                "next id {next_id} must be greater than max existing id {max_existing}"
            ),
        }
    }
}

impl std::error::Error for LayoutModelError {}

/// Errors returned by split tree operations. A failed operation leaves the
/// tree unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    NotInitialized,
    MissingNode(NodeId),
    NodeNotPane(NodeId),
    NodeNotSplit(NodeId),
    /// The only remaining pane cannot be closed.
    LastPane(PaneId),
    InvalidPane(PaneId),
    BufferNotInPane {
        buffer_id: BufferId,
        pane_id: PaneId,
    },
    InvalidSizes {
        split_id: NodeId,
        reason: String,
    },
    IndexOutOfRange {
        split_id: NodeId,
        index: usize,
    },
    Validation(LayoutModelError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "layout has no panes yet"),
            Self::MissingNode(id) => write!(f, "node {id} not found"),
            Self::NodeNotPane(id) => write!(f, "node {id} is not a pane"),
            Self::NodeNotSplit(id) => write!(f, "node {id} is not a split"),
            Self::LastPane(id) => write!(f, "pane {id} is the last pane and cannot be closed"),
            Self::InvalidPane(id) => write!(f, "pane {id} seed violates tab invariants"),
            Self::BufferNotInPane { buffer_id, pane_id } => {
                write!(f, "buffer {buffer_id} is not open in pane {pane_id}")
            }
            Self::InvalidSizes { split_id, reason } => {
                write!(f, "invalid sizes for split {split_id}: {reason}")
            }
            Self::IndexOutOfRange { split_id, index } => {
                write!(f, "split {split_id} has no divider at index {index}")
            }
            Self::Validation(err) => write!(f, "layout validation failed: {err}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutModelError> for LayoutError {
    fn from(err: LayoutModelError) -> Self {
        Self::Validation(err)
    }
}
