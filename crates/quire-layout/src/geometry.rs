#![forbid(unsafe_code)]

//! Pane geometry: solving the tree into rectangles, and the provider trait
//! drop-zone resolution reads from.

use std::collections::{BTreeMap, HashMap};

use quire_core::{NodeId, PaneId, Rect};

use crate::error::LayoutError;
use crate::model::{NodeKind, SplitDirection};
use crate::tree::SplitTree;

/// Source of live pane rectangles.
///
/// Returns `None` for a pane that cannot be measured (e.g. not mounted yet).
pub trait PaneGeometry {
    fn pane_rect(&self, pane_id: PaneId) -> Option<Rect>;
}

impl PaneGeometry for BTreeMap<PaneId, Rect> {
    fn pane_rect(&self, pane_id: PaneId) -> Option<Rect> {
        self.get(&pane_id).copied()
    }
}

impl PaneGeometry for HashMap<PaneId, Rect> {
    fn pane_rect(&self, pane_id: PaneId) -> Option<Rect> {
        self.get(&pane_id).copied()
    }
}

/// Rectangles for every node of a solved tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedGeometry {
    area: Rect,
    rects: BTreeMap<NodeId, Rect>,
}

impl SolvedGeometry {
    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    /// Rectangle of any node (pane or split).
    #[must_use]
    pub fn rect(&self, node_id: NodeId) -> Option<Rect> {
        self.rects.get(&node_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Rect)> + '_ {
        self.rects.iter().map(|(id, rect)| (*id, *rect))
    }
}

impl PaneGeometry for SolvedGeometry {
    fn pane_rect(&self, pane_id: PaneId) -> Option<Rect> {
        self.rect(pane_id)
    }
}

impl SplitTree {
    /// Divide `area` among the nodes according to split sizes.
    ///
    /// The last child of each split absorbs rounding drift so children tile
    /// their parent exactly.
    pub fn solve_layout(&self, area: Rect) -> Result<SolvedGeometry, LayoutError> {
        let root = self.root().ok_or(LayoutError::NotInitialized)?;
        let mut rects = BTreeMap::new();
        let mut stack = vec![(root, area)];
        while let Some((node_id, rect)) = stack.pop() {
            let node = self.node(node_id).ok_or(LayoutError::MissingNode(node_id))?;
            rects.insert(node_id, rect);
            let NodeKind::Split(split) = &node.kind else {
                continue;
            };
            let mut remaining = rect;
            let last = split.children.len().saturating_sub(1);
            for (i, (child, size)) in split.children.iter().zip(&split.sizes).enumerate() {
                let child_rect = if i == last {
                    remaining
                } else {
                    let (head, tail) = match split.direction {
                        SplitDirection::Vertical => remaining.split_columns(rect.width * size / 100.0),
                        SplitDirection::Horizontal => remaining.split_rows(rect.height * size / 100.0),
                    };
                    remaining = tail;
                    head
                };
                stack.push((*child, child_rect));
            }
        }
        Ok(SolvedGeometry { area, rects })
    }
}
