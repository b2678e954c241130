#![forbid(unsafe_code)]

//! Tab routing: which buffers each pane shows.
//!
//! These operations only touch buffer references. Destroying a buffer is the
//! buffer store's business.

use quire_core::{BufferId, PaneId};

use crate::error::LayoutError;
use crate::tree::SplitTree;

impl SplitTree {
    /// Open `buffer_id` as a tab in `pane_id` (no-op if already there) and
    /// optionally make it active.
    pub fn add_buffer(
        &mut self,
        pane_id: PaneId,
        buffer_id: BufferId,
        activate: bool,
    ) -> Result<(), LayoutError> {
        self.transact("add_buffer", |tree| {
            tree.pane_mut(pane_id)?.push(buffer_id, activate);
            Ok(())
        })
    }

    /// Drop the tab for `buffer_id` from `pane_id`. Returns the pane's new
    /// active buffer.
    pub fn remove_buffer(
        &mut self,
        pane_id: PaneId,
        buffer_id: BufferId,
    ) -> Result<Option<BufferId>, LayoutError> {
        self.transact("remove_buffer", |tree| {
            let pane = tree.pane_mut(pane_id)?;
            if !pane.remove(buffer_id) {
                return Err(LayoutError::BufferNotInPane { buffer_id, pane_id });
            }
            Ok(pane.active_buffer)
        })
    }

    /// Move a tab from one pane to another, activating it at the destination.
    ///
    /// Moving within the same pane just activates the tab.
    pub fn move_buffer(
        &mut self,
        buffer_id: BufferId,
        from: PaneId,
        to: PaneId,
    ) -> Result<(), LayoutError> {
        self.transact("move_buffer", |tree| {
            let source = tree.pane_mut(from)?;
            if !source.contains(buffer_id) {
                return Err(LayoutError::BufferNotInPane {
                    buffer_id,
                    pane_id: from,
                });
            }
            if from == to {
                source.active_buffer = Some(buffer_id);
                return Ok(());
            }
            source.remove(buffer_id);
            tree.pane_mut(to)?.push(buffer_id, true);
            tracing::trace!(buffer_id = %buffer_id, from = %from, to = %to, "buffer moved");
            Ok(())
        })
    }

    /// Make an existing tab the active one.
    pub fn set_active_buffer(
        &mut self,
        pane_id: PaneId,
        buffer_id: BufferId,
    ) -> Result<(), LayoutError> {
        self.transact("set_active_buffer", |tree| {
            let pane = tree.pane_mut(pane_id)?;
            if !pane.contains(buffer_id) {
                return Err(LayoutError::BufferNotInPane { buffer_id, pane_id });
            }
            pane.active_buffer = Some(buffer_id);
            Ok(())
        })
    }

    /// First pane (document order) showing `buffer_id`.
    #[must_use]
    pub fn find_pane_by_buffer(&self, buffer_id: BufferId) -> Option<PaneId> {
        self.panes()
            .find(|(_, pane)| pane.contains(buffer_id))
            .map(|(id, _)| id)
    }

    /// Every pane showing `buffer_id`, in document order.
    #[must_use]
    pub fn panes_with_buffer(&self, buffer_id: BufferId) -> Vec<PaneId> {
        self.panes()
            .filter(|(_, pane)| pane.contains(buffer_id))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pane, Placement, SplitDirection};

    fn buf(n: u64) -> BufferId {
        BufferId::new(n).expect("non-zero")
    }

    fn two_panes() -> (SplitTree, PaneId, PaneId) {
        let mut tree = SplitTree::new();
        let p1 = tree.initialize();
        let p2 = tree
            .split_pane(p1, SplitDirection::Vertical, Placement::After, Pane::empty())
            .expect("split");
        (tree, p1, p2)
    }

    #[test]
    fn move_buffer_activates_at_destination() {
        let (mut tree, p1, p2) = two_panes();
        tree.add_buffer(p1, buf(1), true).expect("add");
        tree.add_buffer(p1, buf(2), true).expect("add");
        tree.move_buffer(buf(2), p1, p2).expect("move");
        assert_eq!(tree.pane(p1).map(|p| p.active_buffer), Some(Some(buf(1))));
        let dest = tree.pane(p2).expect("pane");
        assert_eq!(dest.buffer_ids, vec![buf(2)]);
        assert_eq!(dest.active_buffer, Some(buf(2)));
    }

    #[test]
    fn moving_last_tab_leaves_empty_pane() {
        let (mut tree, p1, p2) = two_panes();
        tree.add_buffer(p1, buf(1), true).expect("add");
        tree.move_buffer(buf(1), p1, p2).expect("move");
        let source = tree.pane(p1).expect("pane");
        assert!(source.is_empty());
        assert_eq!(source.active_buffer, None);
        assert_eq!(tree.pane_count(), 2);
    }

    #[test]
    fn move_of_absent_buffer_fails_cleanly() {
        let (mut tree, p1, p2) = two_panes();
        let before = tree.state_hash();
        assert_eq!(
            tree.move_buffer(buf(5), p1, p2),
            Err(LayoutError::BufferNotInPane {
                buffer_id: buf(5),
                pane_id: p1
            })
        );
        assert_eq!(tree.state_hash(), before);
    }

    #[test]
    fn same_buffer_in_two_panes() {
        let (mut tree, p1, p2) = two_panes();
        tree.add_buffer(p1, buf(1), true).expect("add");
        tree.add_buffer(p2, buf(1), true).expect("add");
        assert_eq!(tree.panes_with_buffer(buf(1)), vec![p1, p2]);
        assert_eq!(tree.find_pane_by_buffer(buf(1)), Some(p1));
        assert_eq!(tree.remove_buffer(p1, buf(1)), Ok(None));
        assert_eq!(tree.panes_with_buffer(buf(1)), vec![p2]);
    }

    #[test]
    fn set_active_requires_tab() {
        let (mut tree, p1, _) = two_panes();
        tree.add_buffer(p1, buf(1), true).expect("add");
        tree.add_buffer(p1, buf(2), false).expect("add");
        tree.set_active_buffer(p1, buf(2)).expect("activate");
        assert_eq!(tree.pane(p1).and_then(|p| p.active_buffer), Some(buf(2)));
        assert!(tree.set_active_buffer(p1, buf(3)).is_err());
    }
}
