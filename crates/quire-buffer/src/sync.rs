#![forbid(unsafe_code)]

//! Debounced bridge between an editing surface and the buffer store.
//!
//! The editing surface calls [`BufferSyncManager::update_local_content`] on
//! every keystroke. Local state changes immediately; the store write is
//! deferred until the sync window has been quiet, so a burst of keystrokes
//! costs one store write and one round of subscriber notifications.
//!
//! ```text
//!  keystroke ─► local_content ─► Debouncer<String> ──poll(now)──► BufferStore
//!                    ▲                                                │
//!                    └────────────── reconcile() ◄────────────────────┘
//! ```
//!
//! # Dirty flags
//!
//! The manager's `is_dirty` means "unflushed local edits exist". It is
//! unrelated to [`crate::Buffer::is_dirty`], which tracks unsaved changes
//! relative to disk.
//!
//! # External changes
//!
//! [`BufferSyncManager::reconcile`] compares the store revision against the
//! last revision this manager wrote or adopted. A foreign write is adopted
//! only when there are no unflushed local edits; otherwise the local edit
//! wins when it next flushes.

use std::time::{Duration, Instant};

use quire_core::{BufferId, DebounceStats, Debouncer};

use crate::store::{BufferError, BufferStore};

/// Result of [`BufferSyncManager::reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The store has not been written by anyone else.
    Unchanged,
    /// A foreign write was adopted as local state.
    Applied,
    /// A foreign write was ignored because local edits are pending.
    Deferred,
}

/// Per-editor sync adapter.
#[derive(Debug, Clone)]
pub struct BufferSyncManager {
    buffer_id: BufferId,
    local_content: String,
    last_synced: String,
    is_dirty: bool,
    seen_revision: u64,
    pending: Debouncer<String>,
}

impl BufferSyncManager {
    /// Bind to an editable text buffer, seeding local state from the store.
    pub fn attach(
        store: &BufferStore,
        buffer_id: BufferId,
        window: Duration,
    ) -> Result<Self, BufferError> {
        let buffer = store
            .get_buffer(buffer_id)
            .ok_or(BufferError::NotFound(buffer_id))?;
        let text = match buffer.text() {
            Some(text) if buffer.is_editable => text.to_string(),
            _ => return Err(BufferError::NotEditable(buffer_id)),
        };
        tracing::debug!(buffer_id = %buffer_id, window_ms = window.as_millis() as u64, "sync manager attached");
        Ok(Self {
            buffer_id,
            last_synced: text.clone(),
            local_content: text,
            is_dirty: false,
            seen_revision: buffer.revision,
            pending: Debouncer::new(window),
        })
    }

    #[must_use]
    pub const fn buffer_id(&self) -> BufferId {
        self.buffer_id
    }

    #[must_use]
    pub fn local_content(&self) -> &str {
        &self.local_content
    }

    /// Content as of the last flush or adopted external change.
    #[must_use]
    pub fn last_synced(&self) -> &str {
        &self.last_synced
    }

    /// Whether local edits have not reached the store yet.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    #[must_use]
    pub fn has_pending_flush(&self) -> bool {
        self.pending.is_pending()
    }

    /// When the pending flush becomes due.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.deadline()
    }

    #[must_use]
    pub const fn stats(&self) -> DebounceStats {
        self.pending.stats()
    }

    /// Record a local edit and (re)start the flush window at `now`.
    pub fn update_local_content(&mut self, content: impl Into<String>, now: Instant) {
        self.local_content = content.into();
        self.is_dirty = self.local_content != self.last_synced;
        if self
            .pending
            .schedule(self.local_content.clone(), now)
            .is_some()
        {
            tracing::trace!(buffer_id = %self.buffer_id, "pending flush superseded");
        }
    }

    /// Flush if the window has elapsed at `now`. Returns whether a write happened.
    pub fn poll(&mut self, store: &mut BufferStore, now: Instant) -> Result<bool, BufferError> {
        match self.pending.poll(now) {
            Some(content) => self.commit(store, content).map(|()| true),
            None => Ok(false),
        }
    }

    /// Cancel the window and write the pending content now.
    pub fn sync_to_store(&mut self, store: &mut BufferStore) -> Result<bool, BufferError> {
        match self.pending.flush() {
            Some(content) => self.commit(store, content).map(|()| true),
            None => Ok(false),
        }
    }

    /// Flush pending edits, then persist the buffer.
    pub fn save(&mut self, store: &mut BufferStore) -> Result<(), BufferError> {
        self.sync_to_store(store)?;
        store.save_buffer(self.buffer_id)
    }

    /// Pick up writes made to the store by anyone else.
    pub fn reconcile(&mut self, store: &BufferStore) -> Result<ReconcileOutcome, BufferError> {
        let buffer = store
            .get_buffer(self.buffer_id)
            .ok_or(BufferError::NotFound(self.buffer_id))?;
        if buffer.revision == self.seen_revision {
            return Ok(ReconcileOutcome::Unchanged);
        }
        if self.is_dirty || self.pending.is_pending() {
            tracing::debug!(
                buffer_id = %self.buffer_id,
                store_revision = buffer.revision,
                seen_revision = self.seen_revision,
                "external change deferred; local edits pending"
            );
            return Ok(ReconcileOutcome::Deferred);
        }
        let text = buffer.text().unwrap_or_default().to_string();
        self.local_content.clone_from(&text);
        self.last_synced = text;
        self.seen_revision = buffer.revision;
        tracing::debug!(buffer_id = %self.buffer_id, revision = buffer.revision, "external change applied");
        Ok(ReconcileOutcome::Applied)
    }

    /// Flush anything pending before the editor goes away.
    pub fn dispose(mut self, store: &mut BufferStore) -> Result<(), BufferError> {
        self.sync_to_store(store).map(|_| ())
    }

    fn commit(&mut self, store: &mut BufferStore, content: String) -> Result<(), BufferError> {
        store.commit_content(self.buffer_id, content.clone())?;
        self.last_synced = content;
        self.is_dirty = self.local_content != self.last_synced;
        self.seen_revision = store.revision(self.buffer_id).unwrap_or(self.seen_revision);
        tracing::trace!(buffer_id = %self.buffer_id, revision = self.seen_revision, "flushed to store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferContent;
    use crate::persistence::MemoryPersistence;

    const WINDOW: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup() -> (BufferStore, BufferId) {
        let mut store = BufferStore::new(Box::new(MemoryPersistence::new()));
        let id = store.create_untitled();
        (store, id)
    }

    #[test]
    fn attach_rejects_unknown_and_read_only() {
        let backend = MemoryPersistence::new();
        backend.insert("/w/logo.png", BufferContent::Bytes(vec![1]));
        let mut store = BufferStore::new(Box::new(backend));
        let image = store.open("/w/logo.png");
        assert!(matches!(
            BufferSyncManager::attach(&store, image, WINDOW),
            Err(BufferError::NotEditable(_))
        ));
        let ghost = BufferId::new(99).expect("non-zero");
        assert!(matches!(
            BufferSyncManager::attach(&store, ghost, WINDOW),
            Err(BufferError::NotFound(_))
        ));
    }

    #[test]
    fn edit_is_local_until_window_elapses() {
        let (mut store, id) = setup();
        let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
        let t0 = Instant::now();
        sync.update_local_content("hi", t0);
        assert_eq!(sync.local_content(), "hi");
        assert!(!sync.poll(&mut store, t0 + ms(499)).expect("poll"));
        assert_eq!(store.get_buffer(id).and_then(|b| b.text()), Some(""));
        assert!(sync.poll(&mut store, t0 + ms(500)).expect("poll"));
        assert_eq!(store.get_buffer(id).and_then(|b| b.text()), Some("hi"));
    }

    #[test]
    fn sync_to_store_flushes_immediately() {
        let (mut store, id) = setup();
        let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
        sync.update_local_content("abc", Instant::now());
        assert!(sync.sync_to_store(&mut store).expect("sync"));
        assert!(!sync.has_pending_flush());
        assert!(!sync.is_dirty());
        assert!(!sync.sync_to_store(&mut store).expect("nothing pending"));
    }

    #[test]
    fn reconcile_applies_when_clean() {
        let (mut store, id) = setup();
        let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
        assert_eq!(sync.reconcile(&store).expect("ok"), ReconcileOutcome::Unchanged);
        store
            .apply_external_change(id, BufferContent::Text("from disk".into()))
            .expect("external");
        assert_eq!(sync.reconcile(&store).expect("ok"), ReconcileOutcome::Applied);
        assert_eq!(sync.local_content(), "from disk");
        assert_eq!(sync.reconcile(&store).expect("ok"), ReconcileOutcome::Unchanged);
    }

    #[test]
    fn reconcile_defers_while_typing_and_local_wins() {
        let (mut store, id) = setup();
        let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
        let t0 = Instant::now();
        sync.update_local_content("typing", t0);
        store
            .apply_external_change(id, BufferContent::Text("from disk".into()))
            .expect("external");
        assert_eq!(sync.reconcile(&store).expect("ok"), ReconcileOutcome::Deferred);
        assert_eq!(sync.local_content(), "typing");

        sync.poll(&mut store, t0 + WINDOW).expect("flush");
        assert_eq!(store.get_buffer(id).and_then(|b| b.text()), Some("typing"));
        assert_eq!(sync.reconcile(&store).expect("ok"), ReconcileOutcome::Unchanged);
    }

    #[test]
    fn dispose_flushes_pending_edit() {
        let (mut store, id) = setup();
        let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
        sync.update_local_content("last words", Instant::now());
        sync.dispose(&mut store).expect("dispose");
        assert_eq!(store.get_buffer(id).and_then(|b| b.text()), Some("last words"));
    }

    #[test]
    fn flush_to_closed_buffer_reports_not_found() {
        let (mut store, id) = setup();
        let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
        sync.update_local_content("x", Instant::now());
        store.close_buffer(id).expect("close");
        assert!(matches!(
            sync.sync_to_store(&mut store),
            Err(BufferError::NotFound(_))
        ));
    }
}
