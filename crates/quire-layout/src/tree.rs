#![forbid(unsafe_code)]

//! The editor split tree.
//!
//! Nodes live in an arena keyed by [`NodeId`]; splits hold ordered child id
//! lists and panes are the leaves. Every structural operation runs on a
//! cloned working tree which is validated before it replaces `self`, so a
//! failed operation never leaves a half-applied tree behind.
//!
//! # Invariants
//!
//! 1. Exactly one root (or none, before [`SplitTree::initialize`]).
//! 2. Every leaf is a pane; every split has at least two children.
//! 3. A split's `sizes` has one positive entry per child and sums to 100.
//! 4. Parent links agree with child lists.
//! 5. Every pane satisfies the active-buffer rule of [`Pane`].

use std::collections::BTreeMap;

use quire_core::{IdAllocator, NodeId, PaneId, QuireConfig};
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutModelError};
use crate::model::{NodeKind, NodeRecord, Pane, Placement, Split, SplitDirection};
use crate::snapshot::{
    InvariantReport, SIZE_TOLERANCE, SPLIT_TREE_SCHEMA_VERSION, SplitTreeSnapshot, hash_state,
    validate_tree,
};

/// Sizing policy for structural operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Share kept by the original pane when it is split.
    pub default_split_percent: f32,
    /// Smallest share a resize may leave any child with.
    pub min_pane_percent: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            default_split_percent: 50.0,
            min_pane_percent: 5.0,
        }
    }
}

impl From<&QuireConfig> for LayoutOptions {
    fn from(config: &QuireConfig) -> Self {
        Self {
            default_split_percent: config.default_split_percent,
            min_pane_percent: config.min_pane_percent,
        }
    }
}

/// What [`SplitTree::close_pane`] removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedPane {
    pub pane_id: PaneId,
    /// The removed pane's tabs, for the caller to re-home.
    pub pane: Pane,
    /// The pane that should become active in its place.
    pub successor: PaneId,
}

/// Arena-backed n-ary split tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitTree {
    root: Option<NodeId>,
    ids: IdAllocator,
    nodes: BTreeMap<NodeId, NodeRecord>,
    options: LayoutOptions,
}

impl Default for SplitTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitTree {
    /// An empty tree; call [`SplitTree::initialize`] to create the first pane.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            ids: IdAllocator::new(),
            nodes: BTreeMap::new(),
            options: LayoutOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn options(&self) -> LayoutOptions {
        self.options
    }

    /// Create the root pane if the tree is empty. Otherwise a no-op that
    /// returns the first pane.
    pub fn initialize(&mut self) -> PaneId {
        if let Some(existing) = self.root.and_then(|root| self.first_pane_in(root)) {
            return existing;
        }
        let id = self.ids.allocate_node();
        self.nodes.insert(id, NodeRecord::pane(id, None, Pane::empty()));
        self.root = Some(id);
        tracing::debug!(pane_id = %id, "layout initialized");
        id
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.root.is_some()
    }

    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(&id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    #[must_use]
    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.nodes.get(&id).and_then(NodeRecord::as_pane)
    }

    #[must_use]
    pub fn split(&self, id: NodeId) -> Option<&Split> {
        self.nodes.get(&id).and_then(NodeRecord::as_split)
    }

    /// Pane ids in document order (depth-first, children in order).
    #[must_use]
    pub fn pane_ids(&self) -> Vec<PaneId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            match self.nodes.get(&id).map(|node| &node.kind) {
                Some(NodeKind::Pane(_)) => out.push(id),
                Some(NodeKind::Split(split)) => stack.extend(split.children.iter().rev()),
                None => {}
            }
        }
        out
    }

    /// Panes with their tab state, in document order.
    pub fn panes(&self) -> impl Iterator<Item = (PaneId, &Pane)> {
        self.pane_ids()
            .into_iter()
            .filter_map(move |id| self.pane(id).map(|pane| (id, pane)))
    }

    #[must_use]
    pub fn pane_count(&self) -> usize {
        self.nodes.values().filter(|node| node.is_pane()).count()
    }

    /// The first pane (document order) under `node`.
    #[must_use]
    pub fn first_pane_in(&self, mut node: NodeId) -> Option<PaneId> {
        loop {
            match &self.nodes.get(&node)?.kind {
                NodeKind::Pane(_) => return Some(node),
                NodeKind::Split(split) => node = *split.children.first()?,
            }
        }
    }

    pub fn validate(&self) -> Result<(), LayoutModelError> {
        validate_tree(self.root, self.ids.peek(), &self.nodes)
    }

    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        self.to_snapshot().invariant_report()
    }

    /// Deterministic structural hash, equal to the snapshot hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        hash_state(
            SPLIT_TREE_SCHEMA_VERSION,
            self.root,
            self.ids.peek(),
            self.nodes.values(),
        )
    }

    #[must_use]
    pub fn to_snapshot(&self) -> SplitTreeSnapshot {
        SplitTreeSnapshot {
            schema_version: SPLIT_TREE_SCHEMA_VERSION,
            root: self.root,
            next_id: self.ids.peek(),
            nodes: self.nodes.values().cloned().collect(),
        }
    }

    /// Rebuild from a snapshot, rejecting anything that violates the invariants.
    pub fn from_snapshot(mut snapshot: SplitTreeSnapshot) -> Result<Self, LayoutModelError> {
        if snapshot.schema_version != SPLIT_TREE_SCHEMA_VERSION {
            return Err(LayoutModelError::UnsupportedSchemaVersion {
                version: snapshot.schema_version,
            });
        }
        snapshot.canonicalize();
        let mut nodes = BTreeMap::new();
        for node in snapshot.nodes {
            let node_id = node.id;
            if nodes.insert(node_id, node).is_some() {
                return Err(LayoutModelError::DuplicateNodeId { node_id });
            }
        }
        validate_tree(snapshot.root, snapshot.next_id, &nodes)?;
        Ok(Self {
            root: snapshot.root,
            ids: IdAllocator::with_next(snapshot.next_id),
            nodes,
            options: LayoutOptions::default(),
        })
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// Split `target` in `direction`, returning the new pane (seeded with `seed`).
    ///
    /// The target keeps `default_split_percent` of its former share. When the
    /// target's parent already splits in `direction`, the new pane is inserted
    /// as a sibling instead of nesting another split.
    pub fn split_pane(
        &mut self,
        target: PaneId,
        direction: SplitDirection,
        placement: Placement,
        seed: Pane,
    ) -> Result<PaneId, LayoutError> {
        self.transact("split_pane", |tree| {
            tree.apply_split(target, direction, placement, seed)
        })
    }

    /// Remove a pane, collapsing its parent split if one child remains.
    ///
    /// The last remaining pane cannot be closed. Collapse goes exactly one
    /// level; a promoted split that runs in the same direction as its new
    /// parent is merged into it.
    pub fn close_pane(&mut self, pane_id: PaneId) -> Result<ClosedPane, LayoutError> {
        self.transact("close_pane", |tree| tree.apply_close(pane_id))
    }

    /// Replace a split's sizes. Every entry must be at least
    /// `min_pane_percent` and the total must be 100.
    pub fn resize(&mut self, split_id: NodeId, sizes: Vec<f32>) -> Result<(), LayoutError> {
        let min = self.options.min_pane_percent;
        self.transact("resize", |tree| {
            let split = tree.split_mut(split_id)?;
            let invalid = |reason: String| LayoutError::InvalidSizes { split_id, reason };
            if sizes.len() != split.children.len() {
                return Err(invalid(format!(
                    "expected {} sizes, got {}",
                    split.children.len(),
                    sizes.len()
                )));
            }
            if sizes.iter().any(|size| !size.is_finite() || *size < min - SIZE_TOLERANCE) {
                return Err(invalid(format!("every size must be at least {min}%")));
            }
            let sum: f32 = sizes.iter().sum();
            if (sum - 100.0).abs() > SIZE_TOLERANCE {
                return Err(invalid(format!("sizes sum to {sum}, expected 100")));
            }
            split.sizes = sizes;
            Ok(())
        })
    }

    /// Move the divider after child `index` by `delta` percent (positive grows
    /// the child before the divider). Returns the delta actually applied
    /// after clamping both neighbors to `min_pane_percent`.
    pub fn resize_between(
        &mut self,
        split_id: NodeId,
        index: usize,
        delta: f32,
    ) -> Result<f32, LayoutError> {
        let min = self.options.min_pane_percent;
        self.transact("resize_between", |tree| {
            if !delta.is_finite() {
                return Err(LayoutError::InvalidSizes {
                    split_id,
                    reason: "delta is not finite".to_string(),
                });
            }
            let split = tree.split_mut(split_id)?;
            if index >= split.sizes.len().saturating_sub(1) {
                return Err(LayoutError::IndexOutOfRange { split_id, index });
            }
            let (before, after) = (split.sizes[index], split.sizes[index + 1]);
            let lo = (min - before).min(0.0);
            let hi = (after - min).max(0.0);
            let applied = delta.clamp(lo, hi);
            split.sizes[index] = before + applied;
            split.sizes[index + 1] = after - applied;
            Ok(applied)
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Run `op` on a working copy; commit only if it succeeds and validates.
    pub(crate) fn transact<T>(
        &mut self,
        op: &'static str,
        apply: impl FnOnce(&mut Self) -> Result<T, LayoutError>,
    ) -> Result<T, LayoutError> {
        let before_hash = self.state_hash();
        let mut working = self.clone();
        let value = match apply(&mut working) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(op, error = %err, "layout operation rejected");
                return Err(err);
            }
        };
        if let Err(err) = working.validate() {
            tracing::warn!(op, error = %err, "layout operation produced an invalid tree");
            return Err(err.into());
        }
        let after_hash = working.state_hash();
        *self = working;
        tracing::debug!(op, before_hash, after_hash, "layout operation applied");
        Ok(value)
    }

    pub(crate) fn pane_mut(&mut self, id: PaneId) -> Result<&mut Pane, LayoutError> {
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Pane(pane)) => Ok(pane),
            Some(NodeKind::Split(_)) => Err(LayoutError::NodeNotPane(id)),
            None => Err(LayoutError::MissingNode(id)),
        }
    }

    fn split_mut(&mut self, id: NodeId) -> Result<&mut Split, LayoutError> {
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Split(split)) => Ok(split),
            Some(NodeKind::Pane(_)) => Err(LayoutError::NodeNotSplit(id)),
            None => Err(LayoutError::MissingNode(id)),
        }
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), LayoutError> {
        let node = self.nodes.get_mut(&id).ok_or(LayoutError::MissingNode(id))?;
        node.parent = parent;
        Ok(())
    }

    fn apply_split(
        &mut self,
        target: PaneId,
        direction: SplitDirection,
        placement: Placement,
        seed: Pane,
    ) -> Result<PaneId, LayoutError> {
        let node = self.nodes.get(&target).ok_or(LayoutError::MissingNode(target))?;
        if !node.is_pane() {
            return Err(LayoutError::NodeNotPane(target));
        }
        if !seed.is_consistent() {
            return Err(LayoutError::InvalidPane(target));
        }
        let parent = node.parent;
        let min = self.options.min_pane_percent;
        let keep_percent = self
            .options
            .default_split_percent
            .clamp(min, (100.0 - min).max(min));
        let new_id = self.ids.allocate_node();

        if let Some(parent_id) = parent {
            let split = self.split_mut(parent_id)?;
            if split.direction == direction {
                let index = split
                    .position(target)
                    .ok_or(LayoutError::MissingNode(target))?;
                let share = split.sizes[index];
                let kept = share * keep_percent / 100.0;
                split.sizes[index] = kept;
                let insert_at = match placement {
                    Placement::Before => index,
                    Placement::After => index + 1,
                };
                split.children.insert(insert_at, new_id);
                split.sizes.insert(insert_at, share - kept);
                self.nodes
                    .insert(new_id, NodeRecord::pane(new_id, Some(parent_id), seed));
                tracing::trace!(pane_id = %target, new_pane = %new_id, split_id = %parent_id, "pane added to existing split");
                return Ok(new_id);
            }
        }

        let split_id = self.ids.allocate_node();
        let (children, sizes) = match placement {
            Placement::After => (vec![target, new_id], vec![keep_percent, 100.0 - keep_percent]),
            Placement::Before => (vec![new_id, target], vec![100.0 - keep_percent, keep_percent]),
        };
        self.nodes.insert(
            split_id,
            NodeRecord::split(
                split_id,
                parent,
                Split {
                    direction,
                    children,
                    sizes,
                },
            ),
        );
        self.nodes
            .insert(new_id, NodeRecord::pane(new_id, Some(split_id), seed));
        self.set_parent(target, Some(split_id))?;
        match parent {
            Some(parent_id) => self.replace_child(parent_id, target, split_id)?,
            None => self.root = Some(split_id),
        }
        tracing::trace!(pane_id = %target, new_pane = %new_id, split_id = %split_id, "pane split");
        Ok(new_id)
    }

    fn apply_close(&mut self, pane_id: PaneId) -> Result<ClosedPane, LayoutError> {
        let node = self.nodes.get(&pane_id).ok_or(LayoutError::MissingNode(pane_id))?;
        if !node.is_pane() {
            return Err(LayoutError::NodeNotPane(pane_id));
        }
        let parent_id = node.parent.ok_or(LayoutError::LastPane(pane_id))?;

        let pane = match self.nodes.remove(&pane_id).map(|node| node.kind) {
            Some(NodeKind::Pane(pane)) => pane,
            _ => return Err(LayoutError::MissingNode(pane_id)),
        };

        let split = self.split_mut(parent_id)?;
        let index = split
            .position(pane_id)
            .ok_or(LayoutError::MissingNode(pane_id))?;
        split.children.remove(index);
        split.sizes.remove(index);
        normalize_sizes(&mut split.sizes);
        let neighbor = split.children[index.saturating_sub(1).min(split.children.len() - 1)];

        if split.children.len() >= 2 {
            let successor = self
                .first_pane_in(neighbor)
                .ok_or(LayoutError::MissingNode(neighbor))?;
            return Ok(ClosedPane {
                pane_id,
                pane,
                successor,
            });
        }

        // One child left: promote it into the parent's slot.
        let only = neighbor;
        let successor = self
            .first_pane_in(only)
            .ok_or(LayoutError::MissingNode(only))?;
        let grandparent = self.nodes.remove(&parent_id).and_then(|node| node.parent);
        match grandparent {
            None => {
                self.root = Some(only);
                self.set_parent(only, None)?;
            }
            Some(grandparent_id) => {
                let gp_direction = self.split_mut(grandparent_id)?.direction;
                let same_direction = self
                    .split(only)
                    .is_some_and(|split| split.direction == gp_direction);
                if same_direction {
                    self.merge_into_parent(only, parent_id, grandparent_id)?;
                } else {
                    self.replace_child(grandparent_id, parent_id, only)?;
                    self.set_parent(only, Some(grandparent_id))?;
                }
            }
        }
        tracing::trace!(pane_id = %pane_id, successor = %successor, "split collapsed");
        Ok(ClosedPane {
            pane_id,
            pane,
            successor,
        })
    }

    /// Splice the children of `child_split` into `parent_id` at the slot held
    /// by `slot`, scaling their sizes by that slot's share.
    fn merge_into_parent(
        &mut self,
        child_split: NodeId,
        slot: NodeId,
        parent_id: NodeId,
    ) -> Result<(), LayoutError> {
        let merged = match self.nodes.remove(&child_split).map(|node| node.kind) {
            Some(NodeKind::Split(split)) => split,
            _ => return Err(LayoutError::NodeNotSplit(child_split)),
        };
        let parent = self.split_mut(parent_id)?;
        let index = parent.position(slot).ok_or(LayoutError::MissingNode(slot))?;
        let share = parent.sizes[index];
        let scaled: Vec<f32> = merged.sizes.iter().map(|size| size * share / 100.0).collect();
        parent
            .children
            .splice(index..=index, merged.children.iter().copied());
        parent.sizes.splice(index..=index, scaled);
        for child in merged.children {
            self.set_parent(child, Some(parent_id))?;
        }
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent_id: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    ) -> Result<(), LayoutError> {
        let split = self.split_mut(parent_id)?;
        let index = split
            .position(old_child)
            .ok_or(LayoutError::MissingNode(old_child))?;
        split.children[index] = new_child;
        Ok(())
    }
}

/// Rescale sizes to sum to 100; falls back to equal shares.
fn normalize_sizes(sizes: &mut [f32]) {
    let sum: f32 = sizes.iter().sum();
    if sizes.is_empty() {
        return;
    }
    if sum > 0.0 && sum.is_finite() {
        for size in sizes.iter_mut() {
            *size = *size * 100.0 / sum;
        }
    } else {
        let equal = 100.0 / sizes.len() as f32;
        sizes.fill(equal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_root(tree: &SplitTree) -> &Split {
        tree.root()
            .and_then(|root| tree.split(root))
            .expect("root is a split")
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut tree = SplitTree::new();
        assert!(!tree.is_initialized());
        let first = tree.initialize();
        assert_eq!(tree.initialize(), first);
        assert_eq!(tree.pane_count(), 1);
        tree.validate().expect("valid");
    }

    #[test]
    fn split_creates_fifty_fifty_split() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let root = split_root(&tree);
        assert_eq!(root.direction, SplitDirection::Vertical);
        assert_eq!(root.children, vec![p1, p2]);
        assert_eq!(root.sizes, vec![50.0, 50.0]);
        assert_eq!(tree.pane_ids(), vec![p1, p2]);
    }

    #[test]
    fn split_before_orders_new_pane_first() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Horizontal, Placement::Before, Pane::empty())
            .expect("split");
        assert_eq!(tree.pane_ids(), vec![p2, p1]);
    }

    #[test]
    fn same_direction_split_inserts_sibling() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let p3 = tree
            .split_pane(p2, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let root = split_root(&tree);
        assert_eq!(root.children, vec![p1, p2, p3]);
        assert_eq!(root.sizes, vec![50.0, 25.0, 25.0]);
        assert_eq!(tree.nodes().count(), 4);
    }

    #[test]
    fn cross_direction_split_nests() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let p3 = tree
            .split_pane(p2, SplitDirection::Horizontal, Placement::After, Pane::empty())
            .expect("split");
        assert_eq!(tree.pane_ids(), vec![p1, p2, p3]);
        let root = split_root(&tree);
        let nested = tree.split(root.children[1]).expect("nested split");
        assert_eq!(nested.direction, SplitDirection::Horizontal);
        assert_eq!(tree.node(p3).and_then(|n| n.parent), Some(root.children[1]));
    }

    #[test]
    fn last_pane_cannot_be_closed() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let before = tree.state_hash();
        assert_eq!(tree.close_pane(p1), Err(LayoutError::LastPane(p1)));
        assert_eq!(tree.state_hash(), before);
    }

    #[test]
    fn closing_one_of_two_collapses_to_single_pane() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let closed = tree.close_pane(p2).expect("close");
        assert_eq!(closed.successor, p1);
        assert_eq!(tree.root(), Some(p1));
        assert_eq!(tree.node(p1).and_then(|n| n.parent), None);
        assert_eq!(tree.nodes().count(), 1);
    }

    #[test]
    fn closing_from_three_renormalizes_sizes() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let p3 = tree
            .split_pane(p2, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let closed = tree.close_pane(p1).expect("close");
        assert_eq!(closed.successor, p2);
        let root = split_root(&tree);
        assert_eq!(root.children, vec![p2, p3]);
        assert_eq!(root.sizes, vec![50.0, 50.0]);
    }

    #[test]
    fn collapse_merges_same_direction_grandchild() {
        // V[ p1, H[ p2, V[p3, p4] ] ] - closing p2 promotes V[p3,p4] into the root V.
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let p3 = tree
            .split_pane(p2, SplitDirection::Horizontal, Placement::After, Pane::empty())
            .expect("split");
        let p4 = tree
            .split_pane(p3, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let closed = tree.close_pane(p2).expect("close");
        assert_eq!(closed.successor, p3);
        let root = split_root(&tree);
        assert_eq!(root.children, vec![p1, p3, p4]);
        assert_eq!(root.sizes, vec![50.0, 25.0, 25.0]);
        assert_eq!(tree.pane_count(), 3);
        tree.validate().expect("valid");
    }

    #[test]
    fn closed_pane_returns_its_tabs() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let seed = Pane::with_buffers([quire_core::BufferId::MIN]);
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, seed.clone())
            .expect("split");
        let closed = tree.close_pane(p2).expect("close");
        assert_eq!(closed.pane, seed);
    }

    #[test]
    fn resize_validates_sizes() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        tree.split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let root = tree.root().expect("root");
        tree.resize(root, vec![30.0, 70.0]).expect("resize");
        assert_eq!(split_root(&tree).sizes, vec![30.0, 70.0]);
        assert!(matches!(
            tree.resize(root, vec![30.0, 60.0]),
            Err(LayoutError::InvalidSizes { .. })
        ));
        assert!(matches!(
            tree.resize(root, vec![2.0, 98.0]),
            Err(LayoutError::InvalidSizes { .. })
        ));
        assert_eq!(tree.resize(p1, vec![100.0]), Err(LayoutError::NodeNotSplit(p1)));
    }

    #[test]
    fn resize_between_clamps_to_minimum() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        tree.split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        let root = tree.root().expect("root");
        assert_eq!(tree.resize_between(root, 0, 10.0), Ok(10.0));
        assert_eq!(split_root(&tree).sizes, vec![60.0, 40.0]);
        assert_eq!(tree.resize_between(root, 0, 80.0), Ok(35.0));
        assert_eq!(split_root(&tree).sizes, vec![95.0, 5.0]);
        assert_eq!(
            tree.resize_between(root, 1, 1.0),
            Err(LayoutError::IndexOutOfRange {
                split_id: root,
                index: 1
            })
        );
        assert_eq!(
            tree.resize_between(root, usize::MAX, 1.0),
            Err(LayoutError::IndexOutOfRange {
                split_id: root,
                index: usize::MAX
            })
        );
        assert_eq!(split_root(&tree).sizes, vec![95.0, 5.0]);
    }

    #[test]
    fn invalid_seed_is_rejected_without_change() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let bad = Pane {
            buffer_ids: Vec::new(),
            active_buffer: Some(quire_core::BufferId::MIN),
        };
        let before = tree.clone();
        assert_eq!(
            tree.split_pane(p1, SplitDirection::Vertical, Placement::After, bad),
            Err(LayoutError::InvalidPane(p1))
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn snapshot_round_trip_preserves_hash() {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        tree.split_pane(p2, SplitDirection::Horizontal, Placement::Before, Pane::empty())
            .expect("split");
        let snapshot = tree.to_snapshot();
        assert_eq!(snapshot.state_hash(), tree.state_hash());
        let json = snapshot.to_json().expect("json");
        let restored =
            SplitTree::from_snapshot(SplitTreeSnapshot::from_json(&json).expect("parse"))
                .expect("valid");
        assert_eq!(restored.state_hash(), tree.state_hash());
        assert_eq!(restored.pane_ids(), tree.pane_ids());
    }
}
