#![forbid(unsafe_code)]

//! The workspace service.
//!
//! [`Workspace`] ties the buffer store, the split tree and the tab
//! controller together, and owns one [`BufferSyncManager`] per editor
//! instance (a buffer shown in a pane). Hosts create it with
//! [`Workspace::init`] and tear it down with [`Workspace::dispose`], which
//! flushes every editor.
//!
//! # Invariants
//!
//! 1. Every buffer in the store is shown by at least one pane, except
//!    between a close request and its confirmation.
//! 2. Exactly one pane is active, and it exists in the tree.
//! 3. Editors exist only for (pane, buffer) pairs the tree shows.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use quire_buffer::{BufferStore, BufferSyncManager, Persistence, ReconcileOutcome};
use quire_core::{BufferId, PaneId, Point, QuireConfig};
use quire_layout::{LayoutOptions, Pane, PaneGeometry, Placement, SplitDirection, SplitTree};

use crate::drag::{DragPayload, DragSession, DropOutcome};
use crate::error::WorkspaceError;
use crate::tabs::{
    CloseOutcome, ConfirmChoice, ConfirmationPrompt, ConfirmationRequest, TabController,
};

pub type Result<T> = std::result::Result<T, WorkspaceError>;

type EditorKey = (PaneId, BufferId);

pub struct Workspace {
    config: QuireConfig,
    store: BufferStore,
    tree: SplitTree,
    tabs: TabController,
    editors: BTreeMap<EditorKey, BufferSyncManager>,
}

impl Workspace {
    /// A workspace with one empty pane.
    pub fn init(config: QuireConfig, persistence: Box<dyn Persistence>) -> Self {
        let mut tree = SplitTree::new().with_options(LayoutOptions::from(&config));
        let root = tree.initialize();
        tracing::info!(pane_id = %root, persistence = persistence.name(), "workspace initialized");
        Self {
            config,
            store: BufferStore::new(persistence),
            tree,
            tabs: TabController::new(root),
            editors: BTreeMap::new(),
        }
    }

    /// Flush every editor. All editors are flushed even if one fails; the
    /// first failure is returned.
    pub fn dispose(mut self) -> Result<()> {
        let mut first_error = None;
        for ((pane_id, buffer_id), editor) in std::mem::take(&mut self.editors) {
            if let Err(err) = editor.dispose(&mut self.store) {
                tracing::warn!(pane_id = %pane_id, buffer_id = %buffer_id, error = %err, "flush on dispose failed");
                first_error.get_or_insert(err);
            }
        }
        tracing::info!("workspace disposed");
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &QuireConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &BufferStore {
        &self.store
    }

    /// Direct store access for subscriptions and cursor/scroll updates.
    pub fn store_mut(&mut self) -> &mut BufferStore {
        &mut self.store
    }

    #[must_use]
    pub const fn tree(&self) -> &SplitTree {
        &self.tree
    }

    #[must_use]
    pub const fn tabs(&self) -> &TabController {
        &self.tabs
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// The pane new files open in and shortcuts act on.
    #[must_use]
    pub fn active_pane(&self) -> PaneId {
        self.tabs
            .active_pane()
            .filter(|pane| self.tree.pane(*pane).is_some())
            .or_else(|| self.tree.pane_ids().first().copied())
            .unwrap_or(PaneId::MIN)
    }

    /// Activate a pane; its active tab becomes the global active buffer.
    pub fn focus_pane(&mut self, pane_id: PaneId) -> Result<()> {
        let pane = self
            .tree
            .pane(pane_id)
            .ok_or(quire_layout::LayoutError::MissingNode(pane_id))?;
        let active = pane.active_buffer;
        self.tabs.set_active_pane(pane_id);
        self.store.set_active_buffer(active)?;
        Ok(())
    }

    /// Activate a tab and focus its pane.
    pub fn activate_tab(&mut self, pane_id: PaneId, buffer_id: BufferId) -> Result<()> {
        self.tree.set_active_buffer(pane_id, buffer_id)?;
        self.focus_pane(pane_id)
    }

    // ------------------------------------------------------------------
    // Opening
    // ------------------------------------------------------------------

    /// Open `path` in the active pane. A file that is already open is
    /// activated there instead of loaded twice.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> Result<BufferId> {
        let buffer_id = self.store.open(path);
        let pane_id = self.active_pane();
        self.show_in(pane_id, buffer_id)?;
        Ok(buffer_id)
    }

    /// Create an untitled buffer in the active pane.
    pub fn new_untitled(&mut self) -> Result<BufferId> {
        let buffer_id = self.store.create_untitled();
        let pane_id = self.active_pane();
        self.show_in(pane_id, buffer_id)?;
        Ok(buffer_id)
    }

    fn show_in(&mut self, pane_id: PaneId, buffer_id: BufferId) -> Result<()> {
        self.tree.add_buffer(pane_id, buffer_id, true)?;
        self.focus_pane(pane_id)
    }

    // ------------------------------------------------------------------
    // Panes
    // ------------------------------------------------------------------

    pub fn split_pane(
        &mut self,
        pane_id: PaneId,
        direction: SplitDirection,
        placement: Placement,
    ) -> Result<PaneId> {
        let new_pane = self
            .tree
            .split_pane(pane_id, direction, placement, Pane::empty())?;
        self.focus_pane(new_pane)?;
        Ok(new_pane)
    }

    /// Close a pane. Its tabs move to the pane that takes its place, so no
    /// buffer is left without a pane. Returns that pane.
    pub fn close_pane(&mut self, pane_id: PaneId) -> Result<PaneId> {
        let closed = self.tree.close_pane(pane_id)?;
        for buffer_id in &closed.pane.buffer_ids {
            self.tree.add_buffer(closed.successor, *buffer_id, false)?;
        }
        let orphaned: Vec<EditorKey> = self
            .editors
            .keys()
            .filter(|(pane, _)| *pane == pane_id)
            .copied()
            .collect();
        for key in orphaned {
            self.detach_key(key)?;
        }
        self.tabs.forget_pane(pane_id);
        if self.tabs.active_pane() == Some(pane_id) {
            self.focus_pane(closed.successor)?;
        }
        tracing::debug!(
            pane_id = %pane_id,
            successor = %closed.successor,
            rehomed = closed.pane.buffer_ids.len(),
            "pane closed"
        );
        Ok(closed.successor)
    }

    // ------------------------------------------------------------------
    // Editors
    // ------------------------------------------------------------------

    /// Start an editor for a tab. Re-attaching an existing editor is a no-op.
    pub fn attach_editor(&mut self, pane_id: PaneId, buffer_id: BufferId) -> Result<()> {
        let pane = self
            .tree
            .pane(pane_id)
            .ok_or(quire_layout::LayoutError::MissingNode(pane_id))?;
        if !pane.contains(buffer_id) {
            return Err(quire_layout::LayoutError::BufferNotInPane { buffer_id, pane_id }.into());
        }
        if self.editors.contains_key(&(pane_id, buffer_id)) {
            return Ok(());
        }
        let editor = BufferSyncManager::attach(&self.store, buffer_id, self.config.sync_debounce())?;
        self.editors.insert((pane_id, buffer_id), editor);
        Ok(())
    }

    /// Flush and drop the editor of a tab.
    pub fn detach_editor(&mut self, pane_id: PaneId, buffer_id: BufferId) -> Result<()> {
        self.detach_key((pane_id, buffer_id))
    }

    fn detach_key(&mut self, key: EditorKey) -> Result<()> {
        match self.editors.remove(&key) {
            Some(editor) => Ok(editor.dispose(&mut self.store)?),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn editor(&self, pane_id: PaneId, buffer_id: BufferId) -> Option<&BufferSyncManager> {
        self.editors.get(&(pane_id, buffer_id))
    }

    /// Record a keystroke-level edit from an editor.
    pub fn update_editor_content(
        &mut self,
        pane_id: PaneId,
        buffer_id: BufferId,
        content: impl Into<String>,
        now: Instant,
    ) -> Result<()> {
        let editor = self
            .editors
            .get_mut(&(pane_id, buffer_id))
            .ok_or(WorkspaceError::NoEditor { pane_id, buffer_id })?;
        editor.update_local_content(content, now);
        Ok(())
    }

    /// Drive every editor: flush the ones whose window elapsed, then let
    /// each pick up writes made by the others. Returns the number of
    /// flushes.
    ///
    /// Two editors of one buffer do not merge; the last flush wins.
    pub fn poll(&mut self, now: Instant) -> Result<usize> {
        let mut flushed = 0;
        for editor in self.editors.values_mut() {
            if editor.poll(&mut self.store, now)? {
                flushed += 1;
            }
        }
        for ((pane_id, buffer_id), editor) in &mut self.editors {
            if editor.reconcile(&self.store)? == ReconcileOutcome::Deferred {
                tracing::trace!(pane_id = %pane_id, buffer_id = %buffer_id, "reconcile deferred");
            }
        }
        Ok(flushed)
    }

    /// Flush every editor of the buffer, then save it.
    pub fn save_buffer(&mut self, buffer_id: BufferId) -> Result<()> {
        self.flush_buffer(buffer_id)?;
        self.store.save_buffer(buffer_id)?;
        Ok(())
    }

    fn flush_buffer(&mut self, buffer_id: BufferId) -> Result<()> {
        for ((_, buffer), editor) in &mut self.editors {
            if *buffer == buffer_id {
                editor.sync_to_store(&mut self.store)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Closing tabs
    // ------------------------------------------------------------------

    /// Close a tab, asking `prompt` first if the buffer has unsaved changes.
    pub fn request_close_tab(
        &mut self,
        pane_id: PaneId,
        buffer_id: BufferId,
        prompt: &mut dyn ConfirmationPrompt,
    ) -> Result<CloseOutcome> {
        let pane = self
            .tree
            .pane(pane_id)
            .ok_or(quire_layout::LayoutError::MissingNode(pane_id))?;
        if !pane.contains(buffer_id) {
            return Err(quire_layout::LayoutError::BufferNotInPane { buffer_id, pane_id }.into());
        }
        if self.tabs.pending(pane_id).is_some() {
            return Err(WorkspaceError::ConfirmationPending(pane_id));
        }
        self.flush_buffer(buffer_id)?;

        let buffer = self
            .store
            .get_buffer(buffer_id)
            .ok_or(quire_buffer::BufferError::NotFound(buffer_id))?;
        if !buffer.is_dirty {
            return self.close_tab(pane_id, buffer_id);
        }
        let request = ConfirmationRequest {
            pane_id,
            buffer_id,
            file_name: buffer.name.clone(),
        };
        match prompt.confirm(&request) {
            Some(choice) => self.apply_choice(&request, choice),
            None => {
                self.tabs.park(request);
                Ok(CloseOutcome::AwaitingConfirmation)
            }
        }
    }

    /// Answer the confirmation parked on `pane_id`.
    pub fn resolve_confirmation(
        &mut self,
        pane_id: PaneId,
        choice: ConfirmChoice,
    ) -> Result<CloseOutcome> {
        let request = self
            .tabs
            .take(pane_id)
            .ok_or(WorkspaceError::NoPendingConfirmation(pane_id))?;
        self.apply_choice(&request, choice)
    }

    fn apply_choice(
        &mut self,
        request: &ConfirmationRequest,
        choice: ConfirmChoice,
    ) -> Result<CloseOutcome> {
        tracing::debug!(
            pane_id = %request.pane_id,
            buffer_id = %request.buffer_id,
            ?choice,
            "close confirmation answered"
        );
        match choice {
            ConfirmChoice::Cancel => Ok(CloseOutcome::Cancelled),
            ConfirmChoice::Discard => self.close_tab(request.pane_id, request.buffer_id),
            ConfirmChoice::Save => {
                self.save_buffer(request.buffer_id)?;
                self.close_tab(request.pane_id, request.buffer_id)
            }
        }
    }

    fn close_tab(&mut self, pane_id: PaneId, buffer_id: BufferId) -> Result<CloseOutcome> {
        self.editors.remove(&(pane_id, buffer_id));
        let next_active = self.tree.remove_buffer(pane_id, buffer_id)?;
        let buffer_destroyed = self.tree.find_pane_by_buffer(buffer_id).is_none();
        if buffer_destroyed {
            self.store.close_buffer(buffer_id)?;
        }
        if self.tabs.active_pane() == Some(pane_id) {
            self.store.set_active_buffer(next_active)?;
        }
        tracing::debug!(pane_id = %pane_id, buffer_id = %buffer_id, buffer_destroyed, "tab closed");
        Ok(CloseOutcome::Closed { buffer_destroyed })
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Start dragging the tab of `buffer_id` out of `pane_id`.
    pub fn begin_tab_drag(&self, pane_id: PaneId, buffer_id: BufferId) -> Result<DragSession> {
        let pane = self
            .tree
            .pane(pane_id)
            .ok_or(quire_layout::LayoutError::MissingNode(pane_id))?;
        if !pane.contains(buffer_id) {
            return Err(quire_layout::LayoutError::BufferNotInPane { buffer_id, pane_id }.into());
        }
        Ok(DragSession::begin(DragPayload::Tab {
            buffer_id,
            source_pane_id: pane_id,
        }))
    }

    /// Update the drop target under `point`.
    pub fn hover_drag(
        &self,
        session: &mut DragSession,
        point: Point,
        geometry: &dyn PaneGeometry,
    ) -> Option<quire_layout::DropZone> {
        session.hover(
            point,
            &self.tree.pane_ids(),
            geometry,
            self.config.drop_edge_threshold_px,
        )
    }

    /// Release the drag at `point`. Returns `None`, changing nothing, when
    /// no zone is under the pointer or the dragged tab is no longer in its
    /// source pane.
    ///
    /// A center zone moves the tab into that pane; an edge zone splits the
    /// pane toward that side and moves the tab into the new half. Files are
    /// opened (or found already open) and placed the same way.
    pub fn drop(
        &mut self,
        mut session: DragSession,
        point: Point,
        geometry: &dyn PaneGeometry,
    ) -> Result<Option<DropOutcome>> {
        let Some(zone) = self.hover_drag(&mut session, point, geometry) else {
            session.cancel();
            return Ok(None);
        };
        let outcome = match session.payload().clone() {
            DragPayload::Tab {
                buffer_id,
                source_pane_id,
            } => {
                // The tab may have been closed or moved since the drag began.
                if !self
                    .tree
                    .pane(source_pane_id)
                    .is_some_and(|pane| pane.contains(buffer_id))
                {
                    tracing::debug!(
                        buffer_id = %buffer_id,
                        source_pane_id = %source_pane_id,
                        "stale tab drag dropped"
                    );
                    session.cancel();
                    return Ok(None);
                }
                let target = match zone.kind.split() {
                    Some((direction, placement)) => {
                        self.tree
                            .split_pane(zone.pane_id, direction, placement, Pane::empty())?
                    }
                    None => zone.pane_id,
                };
                self.tree.move_buffer(buffer_id, source_pane_id, target)?;
                if target != source_pane_id {
                    self.detach_key((source_pane_id, buffer_id))?;
                }
                outcome_for(buffer_id, target, zone.pane_id)
            }
            DragPayload::File { path } => {
                let buffer_id = self.store.open(&path);
                let target = match zone.kind.split() {
                    Some((direction, placement)) => self.tree.split_pane(
                        zone.pane_id,
                        direction,
                        placement,
                        Pane::with_buffers([buffer_id]),
                    )?,
                    None => {
                        self.tree.add_buffer(zone.pane_id, buffer_id, true)?;
                        zone.pane_id
                    }
                };
                outcome_for(buffer_id, target, zone.pane_id)
            }
        };
        self.focus_pane(outcome.pane_id())?;
        tracing::debug!(?outcome, "drop applied");
        Ok(Some(outcome))
    }
}

fn outcome_for(buffer_id: BufferId, target: PaneId, zone_pane: PaneId) -> DropOutcome {
    if target == zone_pane {
        DropOutcome::Moved {
            buffer_id,
            pane_id: target,
        }
    } else {
        DropOutcome::Split {
            buffer_id,
            new_pane_id: target,
        }
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("store", &self.store)
            .field("tree", &self.tree)
            .field("tabs", &self.tabs)
            .field("editors", &self.editors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_buffer::{BufferContent, MemoryPersistence};
    use quire_core::Rect;
    use quire_layout::{NodeKind, SplitDirection};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn workspace() -> (Workspace, MemoryPersistence) {
        let files = MemoryPersistence::new();
        files.insert("a.md", BufferContent::Text("# A\n".to_string()));
        files.insert("b.md", BufferContent::Text("# B\n".to_string()));
        let ws = Workspace::init(QuireConfig::default(), Box::new(files.clone()));
        (ws, files)
    }

    #[test]
    fn open_file_goes_to_active_pane_once() {
        let (mut ws, _) = workspace();
        let a = ws.open_file("a.md").expect("open");
        let again = ws.open_file("a.md").expect("open");
        assert_eq!(a, again);
        let pane = ws.tree().pane(ws.active_pane()).expect("pane");
        assert_eq!(pane.buffer_ids, vec![a]);
        assert_eq!(ws.store().active_buffer(), Some(a));
    }

    #[test]
    fn focus_follows_panes() {
        let (mut ws, _) = workspace();
        let left = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        let right = ws
            .split_pane(left, SplitDirection::Vertical, Placement::After)
            .expect("split");
        assert_eq!(ws.active_pane(), right);
        assert_eq!(ws.store().active_buffer(), None);
        ws.focus_pane(left).expect("focus");
        assert_eq!(ws.store().active_buffer(), Some(a));
    }

    #[test]
    fn close_pane_rehomes_tabs() {
        let (mut ws, _) = workspace();
        let left = ws.active_pane();
        let right = ws
            .split_pane(left, SplitDirection::Vertical, Placement::After)
            .expect("split");
        let b = ws.open_file("b.md").expect("open");
        assert_eq!(ws.close_pane(right).expect("close"), left);
        assert!(ws.tree().pane(left).expect("pane").contains(b));
        assert_eq!(ws.active_pane(), left);
        assert!(matches!(
            ws.close_pane(left),
            Err(WorkspaceError::Layout(quire_layout::LayoutError::LastPane(_)))
        ));
    }

    #[test]
    #[traced_test]
    fn clean_tab_closes_without_prompt() {
        let (mut ws, _) = workspace();
        let pane = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        let outcome = ws
            .request_close_tab(pane, a, &mut crate::tabs::DeferredPrompt)
            .expect("close");
        assert_eq!(outcome, CloseOutcome::Closed { buffer_destroyed: true });
        assert!(ws.store().get_buffer(a).is_none());
        assert!(ws.tree().pane(pane).expect("pane").is_empty());
        assert!(logs_contain("tab closed"));
    }

    #[test]
    fn buffer_survives_while_another_pane_shows_it() {
        let (mut ws, _) = workspace();
        let left = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        let right = ws
            .split_pane(left, SplitDirection::Vertical, Placement::After)
            .expect("split");
        ws.open_file("a.md").expect("open in right");
        let outcome = ws
            .request_close_tab(right, a, &mut ConfirmChoice::Discard)
            .expect("close");
        assert_eq!(outcome, CloseOutcome::Closed { buffer_destroyed: false });
        assert!(ws.store().get_buffer(a).is_some());
    }

    #[test]
    fn save_choice_saves_then_closes() {
        let (mut ws, files) = workspace();
        let pane = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        ws.attach_editor(pane, a).expect("editor");
        let now = Instant::now();
        ws.update_editor_content(pane, a, "# A!\n", now).expect("type");

        let outcome = ws
            .request_close_tab(pane, a, &mut crate::tabs::DeferredPrompt)
            .expect("request");
        assert_eq!(outcome, CloseOutcome::AwaitingConfirmation);
        assert!(matches!(
            ws.request_close_tab(pane, a, &mut crate::tabs::DeferredPrompt),
            Err(WorkspaceError::ConfirmationPending(_))
        ));

        let outcome = ws
            .resolve_confirmation(pane, ConfirmChoice::Save)
            .expect("resolve");
        assert_eq!(outcome, CloseOutcome::Closed { buffer_destroyed: true });
        assert_eq!(
            files.get(Path::new("a.md")),
            Some(BufferContent::Text("# A!\n".to_string()))
        );
    }

    #[test]
    fn cancel_leaves_everything() {
        let (mut ws, _) = workspace();
        let pane = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        ws.attach_editor(pane, a).expect("editor");
        ws.update_editor_content(pane, a, "changed", Instant::now())
            .expect("type");
        let outcome = ws
            .request_close_tab(pane, a, &mut ConfirmChoice::Cancel)
            .expect("close");
        assert_eq!(outcome, CloseOutcome::Cancelled);
        assert!(ws.tree().pane(pane).expect("pane").contains(a));
        assert_eq!(ws.store().get_buffer(a).and_then(|b| b.text()), Some("changed"));
    }

    #[test]
    fn poll_flushes_after_the_window() {
        let (mut ws, _) = workspace();
        let pane = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        ws.attach_editor(pane, a).expect("editor");
        let t0 = Instant::now();
        ws.update_editor_content(pane, a, "x", t0).expect("type");
        assert_eq!(ws.poll(t0 + Duration::from_millis(100)).expect("poll"), 0);
        assert_eq!(ws.poll(t0 + Duration::from_millis(600)).expect("poll"), 1);
        assert_eq!(ws.store().get_buffer(a).and_then(|b| b.text()), Some("x"));
    }

    #[test]
    fn file_drop_on_edge_opens_in_new_pane() {
        let (mut ws, _) = workspace();
        let root = ws.active_pane();
        let geometry = ws
            .tree()
            .solve_layout(Rect::new(0.0, 0.0, 800.0, 600.0))
            .expect("layout");
        let session = DragSession::begin(DragPayload::File {
            path: "b.md".into(),
        });
        let outcome = ws
            .drop(session, Point::new(400.0, 590.0), &geometry)
            .expect("drop")
            .expect("zone");
        let DropOutcome::Split {
            buffer_id,
            new_pane_id,
        } = outcome
        else {
            panic!("expected a split, got {outcome:?}");
        };
        assert_eq!(ws.active_pane(), new_pane_id);
        assert_eq!(ws.tree().pane(new_pane_id).expect("pane").buffer_ids, vec![buffer_id]);
        let root_split = ws.tree().root().and_then(|id| ws.tree().node(id)).expect("root");
        let NodeKind::Split(split) = &root_split.kind else {
            panic!("root should be a split");
        };
        assert_eq!(split.direction, SplitDirection::Horizontal);
        assert_eq!(split.children, vec![root, new_pane_id]);
    }

    #[test]
    fn drop_outside_changes_nothing() {
        let (mut ws, _) = workspace();
        let pane = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        let before = ws.tree().state_hash();
        let geometry = ws
            .tree()
            .solve_layout(Rect::new(0.0, 0.0, 800.0, 600.0))
            .expect("layout");
        let session = ws.begin_tab_drag(pane, a).expect("drag");
        assert_eq!(
            ws.drop(session, Point::new(-10.0, -10.0), &geometry).expect("drop"),
            None
        );
        assert_eq!(ws.tree().state_hash(), before);
    }

    #[test]
    fn stale_tab_drop_leaves_layout_alone() {
        let (mut ws, _) = workspace();
        let left = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        let right = ws
            .split_pane(left, SplitDirection::Vertical, Placement::After)
            .expect("split");
        let session = ws.begin_tab_drag(left, a).expect("drag");
        ws.request_close_tab(left, a, &mut ConfirmChoice::Discard)
            .expect("close");

        let before = ws.tree().state_hash();
        let sizes = ws.tree().split(ws.tree().root().expect("root")).expect("split").sizes.clone();
        let geometry = ws
            .tree()
            .solve_layout(Rect::new(0.0, 0.0, 800.0, 600.0))
            .expect("layout");
        // Right edge of the right pane: would split in the same direction.
        assert_eq!(
            ws.drop(session, Point::new(795.0, 300.0), &geometry).expect("drop"),
            None
        );
        assert_eq!(ws.tree().state_hash(), before);
        assert_eq!(ws.tree().pane_count(), 2);
        assert_eq!(
            ws.tree().split(ws.tree().root().expect("root")).expect("split").sizes,
            sizes
        );
        assert!(ws.tree().pane(right).expect("right").is_empty());
    }

    #[test]
    fn dispose_flushes_pending_edits() {
        let (mut ws, files) = workspace();
        let pane = ws.active_pane();
        let a = ws.open_file("a.md").expect("open");
        ws.attach_editor(pane, a).expect("editor");
        ws.update_editor_content(pane, a, "late edit", Instant::now())
            .expect("type");
        ws.dispose().expect("dispose");
        // Flushed into the store, not saved to disk.
        assert_eq!(
            files.get(Path::new("a.md")),
            Some(BufferContent::Text("# A\n".to_string()))
        );
    }
}
