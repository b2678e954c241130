#![forbid(unsafe_code)]

//! Serializable tree snapshots, validation and invariant reports.

use std::collections::{BTreeMap, BTreeSet};

use quire_core::NodeId;
use serde::{Deserialize, Serialize};

use crate::error::{InvariantCode, LayoutModelError};
use crate::model::{NodeKind, NodeRecord, SplitDirection};

/// Current split tree schema version.
pub const SPLIT_TREE_SCHEMA_VERSION: u16 = 1;

/// Allowed drift of a split's size sum away from 100.
pub const SIZE_TOLERANCE: f32 = 0.01;

fn default_schema_version() -> u16 {
    SPLIT_TREE_SCHEMA_VERSION
}

/// Serial form of a [`crate::SplitTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTreeSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub root: Option<NodeId>,
    pub next_id: u64,
    pub nodes: Vec<NodeRecord>,
}

impl SplitTreeSnapshot {
    /// Sort nodes by id.
    pub fn canonicalize(&mut self) {
        self.nodes.sort_by_key(|node| node.id);
    }

    /// Deterministic FNV-1a hash over the canonical form.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut nodes: Vec<&NodeRecord> = self.nodes.iter().collect();
        nodes.sort_by_key(|node| node.id);
        hash_state(self.schema_version, self.root, self.next_id, nodes)
    }

    /// Every invariant violation in this snapshot.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut errors = Vec::new();
        if self.schema_version != SPLIT_TREE_SCHEMA_VERSION {
            errors.push(LayoutModelError::UnsupportedSchemaVersion {
                version: self.schema_version,
            });
        }
        let mut nodes = BTreeMap::new();
        for node in &self.nodes {
            if nodes.insert(node.id, node.clone()).is_some() {
                errors.push(LayoutModelError::DuplicateNodeId { node_id: node.id });
            }
        }
        check_tree(self.root, self.next_id, &nodes, &mut errors);
        InvariantReport {
            snapshot_hash: self.state_hash(),
            issues: errors.iter().map(InvariantIssue::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub node_id: Option<NodeId>,
    pub message: String,
}

impl From<&LayoutModelError> for InvariantIssue {
    fn from(err: &LayoutModelError) -> Self {
        Self {
            code: err.code(),
            node_id: err.node_id(),
            message: err.to_string(),
        }
    }
}

/// Structured invariant report over a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub snapshot_hash: u64,
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    #[must_use]
    pub fn has(&self, code: InvariantCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

/// First invariant violation, if any.
pub(crate) fn validate_tree(
    root: Option<NodeId>,
    next_id: u64,
    nodes: &BTreeMap<NodeId, NodeRecord>,
) -> Result<(), LayoutModelError> {
    let mut errors = Vec::new();
    check_tree(root, next_id, nodes, &mut errors);
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Collect every invariant violation.
pub(crate) fn check_tree(
    root: Option<NodeId>,
    next_id: u64,
    nodes: &BTreeMap<NodeId, NodeRecord>,
    errors: &mut Vec<LayoutModelError>,
) {
    let Some(root) = root else {
        if !nodes.is_empty() {
            errors.push(LayoutModelError::RootlessNodes { count: nodes.len() });
        }
        return;
    };
    if !nodes.contains_key(&root) {
        errors.push(LayoutModelError::MissingRoot { root });
        return;
    }

    if let Some(max_existing) = nodes.keys().next_back().copied()
        && next_id <= max_existing.get()
    {
        errors.push(LayoutModelError::NextIdNotGreaterThanExisting {
            next_id,
            max_existing,
        });
    }

    let mut expected_parents = BTreeMap::new();
    for node in nodes.values() {
        if let Some(parent) = node.parent
            && !nodes.contains_key(&parent)
        {
            errors.push(LayoutModelError::MissingParent {
                node_id: node.id,
                parent,
            });
        }

        match &node.kind {
            NodeKind::Pane(pane) => {
                if !pane.is_consistent() {
                    errors.push(LayoutModelError::InconsistentPane { pane_id: node.id });
                }
            }
            NodeKind::Split(split) => {
                if split.children.len() < 2 {
                    errors.push(LayoutModelError::TooFewChildren {
                        node_id: node.id,
                        count: split.children.len(),
                    });
                }
                if split.sizes.len() != split.children.len() {
                    errors.push(LayoutModelError::SizeCountMismatch {
                        node_id: node.id,
                        children: split.children.len(),
                        sizes: split.sizes.len(),
                    });
                } else {
                    if let Some(index) = split
                        .sizes
                        .iter()
                        .position(|size| !size.is_finite() || *size <= 0.0)
                    {
                        errors.push(LayoutModelError::NonPositiveSize {
                            node_id: node.id,
                            index,
                        });
                    }
                    let sum: f32 = split.sizes.iter().sum();
                    if (sum - 100.0).abs() > SIZE_TOLERANCE {
                        errors.push(LayoutModelError::SizesNotNormalized {
                            node_id: node.id,
                            sum,
                        });
                    }
                }
                for child in &split.children {
                    if !nodes.contains_key(child) {
                        errors.push(LayoutModelError::MissingChild {
                            parent: node.id,
                            child: *child,
                        });
                    }
                    if let Some(first_parent) = expected_parents.insert(*child, node.id) {
                        errors.push(LayoutModelError::MultipleParents {
                            child: *child,
                            first_parent,
                            second_parent: node.id,
                        });
                    }
                }
            }
        }
    }

    if let Some(parent) = nodes.get(&root).and_then(|node| node.parent) {
        errors.push(LayoutModelError::RootHasParent { root, parent });
    }

    for node in nodes.values() {
        let expected = if node.id == root {
            None
        } else {
            expected_parents.get(&node.id).copied()
        };
        if node.parent != expected {
            errors.push(LayoutModelError::ParentMismatch {
                node_id: node.id,
                expected,
                actual: node.parent,
            });
        }
    }

    let mut visited = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node_id) = stack.pop() {
        if !visited.insert(node_id) {
            errors.push(LayoutModelError::CycleDetected { node_id });
            continue;
        }
        if let Some(NodeKind::Split(split)) = nodes.get(&node_id).map(|node| &node.kind) {
            stack.extend(
                split
                    .children
                    .iter()
                    .rev()
                    .filter(|child| nodes.contains_key(*child)),
            );
        }
    }
    for node_id in nodes.keys() {
        if !visited.contains(node_id) {
            errors.push(LayoutModelError::UnreachableNode { node_id: *node_id });
        }
    }
}

pub(crate) fn hash_state<'a>(
    schema_version: u16,
    root: Option<NodeId>,
    next_id: u64,
    nodes: impl IntoIterator<Item = &'a NodeRecord>,
) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    fn mix(hash: &mut u64, byte: u8) {
        *hash ^= u64::from(byte);
        *hash = hash.wrapping_mul(PRIME);
    }

    fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
        for byte in bytes {
            mix(hash, *byte);
        }
    }

    fn mix_u64(hash: &mut u64, value: u64) {
        mix_bytes(hash, &value.to_le_bytes());
    }

    fn mix_opt_id(hash: &mut u64, value: Option<NodeId>) {
        match value {
            Some(value) => {
                mix(hash, 1);
                mix_u64(hash, value.get());
            }
            None => mix(hash, 0),
        }
    }

    let mut hash = OFFSET_BASIS;
    mix_bytes(&mut hash, &schema_version.to_le_bytes());
    mix_opt_id(&mut hash, root);
    mix_u64(&mut hash, next_id);

    for node in nodes {
        mix_u64(&mut hash, node.id.get());
        mix_opt_id(&mut hash, node.parent);
        match &node.kind {
            NodeKind::Pane(pane) => {
                mix(&mut hash, 1);
                mix_u64(&mut hash, pane.buffer_ids.len() as u64);
                for buffer_id in &pane.buffer_ids {
                    mix_u64(&mut hash, buffer_id.get());
                }
                match pane.active_buffer {
                    Some(active) => {
                        mix(&mut hash, 1);
                        mix_u64(&mut hash, active.get());
                    }
                    None => mix(&mut hash, 0),
                }
            }
            NodeKind::Split(split) => {
                mix(&mut hash, 2);
                mix(
                    &mut hash,
                    match split.direction {
                        SplitDirection::Horizontal => 1,
                        SplitDirection::Vertical => 2,
                    },
                );
                mix_u64(&mut hash, split.children.len() as u64);
                for (child, size) in split.children.iter().zip(&split.sizes) {
                    mix_u64(&mut hash, child.get());
                    mix_bytes(&mut hash, &size.to_bits().to_le_bytes());
                }
            }
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pane, Split};

    fn id(n: u64) -> NodeId {
        NodeId::new(n).expect("non-zero")
    }

    fn two_pane_snapshot() -> SplitTreeSnapshot {
        SplitTreeSnapshot {
            schema_version: SPLIT_TREE_SCHEMA_VERSION,
            root: Some(id(3)),
            next_id: 4,
            nodes: vec![
                NodeRecord::split(
                    id(3),
                    None,
                    Split {
                        direction: SplitDirection::Vertical,
                        children: vec![id(1), id(2)],
                        sizes: vec![50.0, 50.0],
                    },
                ),
                NodeRecord::pane(id(1), Some(id(3)), Pane::empty()),
                NodeRecord::pane(id(2), Some(id(3)), Pane::empty()),
            ],
        }
    }

    #[test]
    fn valid_snapshot_has_no_issues() {
        let report = two_pane_snapshot().invariant_report();
        assert!(!report.has_errors(), "{:?}", report.issues);
    }

    #[test]
    fn hash_ignores_node_order() {
        let a = two_pane_snapshot();
        let mut b = a.clone();
        b.nodes.reverse();
        assert_eq!(a.state_hash(), b.state_hash());
        b.canonicalize();
        assert_eq!(b.nodes[0].id, id(1));
    }

    #[test]
    fn report_lists_every_problem() {
        let mut snapshot = two_pane_snapshot();
        snapshot.next_id = 2;
        if let NodeKind::Split(split) = &mut snapshot.nodes[0].kind {
            split.sizes = vec![70.0, 50.0];
        }
        snapshot.nodes.push(NodeRecord::pane(id(9), None, Pane::empty()));
        let report = snapshot.invariant_report();
        assert!(report.has(InvariantCode::NextIdNotGreaterThanExisting));
        assert!(report.has(InvariantCode::SizesNotNormalized));
        assert!(report.has(InvariantCode::UnreachableNode));
    }

    #[test]
    fn single_child_split_is_rejected() {
        let snapshot = SplitTreeSnapshot {
            schema_version: SPLIT_TREE_SCHEMA_VERSION,
            root: Some(id(2)),
            next_id: 3,
            nodes: vec![
                NodeRecord::split(
                    id(2),
                    None,
                    Split {
                        direction: SplitDirection::Horizontal,
                        children: vec![id(1)],
                        sizes: vec![100.0],
                    },
                ),
                NodeRecord::pane(id(1), Some(id(2)), Pane::empty()),
            ],
        };
        assert!(snapshot.invariant_report().has(InvariantCode::TooFewChildren));
    }

    #[test]
    fn json_round_trip() {
        let snapshot = two_pane_snapshot();
        let json = snapshot.to_json().expect("serialize");
        assert_eq!(SplitTreeSnapshot::from_json(&json).expect("parse"), snapshot);
    }
}
