#![forbid(unsafe_code)]

//! Node records stored in the split-tree arena.

use quire_core::{BufferId, NodeId};
use serde::{Deserialize, Serialize};

/// Orientation of a split.
///
/// `Vertical` splits are divided by vertical rules, so children sit side by
/// side (left to right). `Horizontal` splits stack children top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

/// Where a new pane goes relative to the pane being split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Left of (vertical) or above (horizontal) the target.
    Before,
    /// Right of (vertical) or below (horizontal) the target.
    #[default]
    After,
}

impl Placement {
    /// Return `(first, second)` ordering for the target and the new node.
    #[must_use]
    pub fn ordered<T>(self, target: T, new_node: T) -> (T, T) {
        match self {
            Self::Before => (new_node, target),
            Self::After => (target, new_node),
        }
    }
}

/// A leaf viewport showing one active buffer among its tabs.
///
/// `active_buffer` is `None` iff `buffer_ids` is empty, and is otherwise one
/// of `buffer_ids`. A buffer appears at most once per pane.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pane {
    pub buffer_ids: Vec<BufferId>,
    pub active_buffer: Option<BufferId>,
}

impl Pane {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A pane with the given tabs (duplicates dropped); the first is active.
    #[must_use]
    pub fn with_buffers(ids: impl IntoIterator<Item = BufferId>) -> Self {
        let mut pane = Self::default();
        for id in ids {
            pane.push(id, false);
        }
        pane
    }

    #[must_use]
    pub fn contains(&self, buffer_id: BufferId) -> bool {
        self.buffer_ids.contains(&buffer_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer_ids.is_empty()
    }

    /// Whether the active-buffer and uniqueness rules hold.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let active_ok = match self.active_buffer {
            None => self.buffer_ids.is_empty(),
            Some(active) => self.buffer_ids.contains(&active),
        };
        let unique = self
            .buffer_ids
            .iter()
            .enumerate()
            .all(|(i, id)| !self.buffer_ids[..i].contains(id));
        active_ok && unique
    }

    /// Append a tab if absent. Activates it when asked or when nothing was active.
    ///
    /// Returns `true` if the tab was newly added.
    pub(crate) fn push(&mut self, buffer_id: BufferId, activate: bool) -> bool {
        let added = if self.contains(buffer_id) {
            false
        } else {
            self.buffer_ids.push(buffer_id);
            true
        };
        if activate || self.active_buffer.is_none() {
            self.active_buffer = Some(buffer_id);
        }
        added
    }

    /// Remove a tab. If it was active, the tab now at its index (or the one
    /// before it) becomes active.
    pub(crate) fn remove(&mut self, buffer_id: BufferId) -> bool {
        let Some(index) = self.buffer_ids.iter().position(|id| *id == buffer_id) else {
            return false;
        };
        self.buffer_ids.remove(index);
        if self.active_buffer == Some(buffer_id) {
            let next = index.min(self.buffer_ids.len().saturating_sub(1));
            self.active_buffer = self.buffer_ids.get(next).copied();
        }
        true
    }
}

/// An interior node dividing its area between ordered children.
///
/// `sizes[i]` is the percentage of the split's extent given to `children[i]`;
/// sizes sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub direction: SplitDirection,
    pub children: Vec<NodeId>,
    pub sizes: Vec<f32>,
}

impl Split {
    /// Index of `child` among the children.
    #[must_use]
    pub fn position(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|id| *id == child)
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Pane(Pane),
    Split(Split),
}

/// One arena record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl NodeRecord {
    #[must_use]
    pub fn pane(id: NodeId, parent: Option<NodeId>, pane: Pane) -> Self {
        Self {
            id,
            parent,
            kind: NodeKind::Pane(pane),
        }
    }

    #[must_use]
    pub fn split(id: NodeId, parent: Option<NodeId>, split: Split) -> Self {
        Self {
            id,
            parent,
            kind: NodeKind::Split(split),
        }
    }

    #[must_use]
    pub fn as_pane(&self) -> Option<&Pane> {
        match &self.kind {
            NodeKind::Pane(pane) => Some(pane),
            NodeKind::Split(_) => None,
        }
    }

    #[must_use]
    pub fn as_split(&self) -> Option<&Split> {
        match &self.kind {
            NodeKind::Split(split) => Some(split),
            NodeKind::Pane(_) => None,
        }
    }

    #[must_use]
    pub fn is_pane(&self) -> bool {
        matches!(self.kind, NodeKind::Pane(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(n: u64) -> BufferId {
        BufferId::new(n).expect("non-zero")
    }

    #[test]
    fn push_activates_first_and_requested() {
        let mut pane = Pane::empty();
        assert!(pane.push(buf(1), false));
        assert_eq!(pane.active_buffer, Some(buf(1)));
        assert!(pane.push(buf(2), false));
        assert_eq!(pane.active_buffer, Some(buf(1)));
        assert!(!pane.push(buf(2), true));
        assert_eq!(pane.active_buffer, Some(buf(2)));
        assert_eq!(pane.buffer_ids, vec![buf(1), buf(2)]);
    }

    #[test]
    fn removing_active_tab_picks_neighbor() {
        let mut pane = Pane::with_buffers([buf(1), buf(2), buf(3)]);
        pane.active_buffer = Some(buf(2));
        assert!(pane.remove(buf(2)));
        assert_eq!(pane.active_buffer, Some(buf(3)));
        assert!(pane.remove(buf(3)));
        assert_eq!(pane.active_buffer, Some(buf(1)));
        assert!(pane.remove(buf(1)));
        assert_eq!(pane.active_buffer, None);
        assert!(pane.is_consistent());
        assert!(!pane.remove(buf(1)));
    }

    #[test]
    fn consistency_rules() {
        let mut pane = Pane::with_buffers([buf(1)]);
        assert!(pane.is_consistent());
        pane.active_buffer = Some(buf(9));
        assert!(!pane.is_consistent());
        pane.active_buffer = None;
        assert!(!pane.is_consistent());
        let dup = Pane {
            buffer_ids: vec![buf(1), buf(1)],
            active_buffer: Some(buf(1)),
        };
        assert!(!dup.is_consistent());
    }

    #[test]
    fn node_kind_serializes_with_type_tag() {
        let record = NodeRecord::pane(NodeId::MIN, None, Pane::with_buffers([buf(4)]));
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains(r#""type":"pane""#), "{json}");
        let back: NodeRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, record);
    }
}
