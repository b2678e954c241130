#![forbid(unsafe_code)]

//! The buffer store: single writer of all buffer state.
//!
//! Panes and editors hold [`BufferId`]s and read through [`BufferStore::get_buffer`].
//! Every mutation emits a [`BufferEvent`] to the subscribers registered for
//! that buffer (or for all buffers).
//!
//! # Invariants
//!
//! 1. A buffer with `is_editable == false` never has its content replaced by
//!    [`BufferStore::update_buffer_content`].
//! 2. `revision` increases by one on every content write, whatever the source.
//! 3. A failed save leaves `is_dirty` untouched and records `error`.
//! 4. At most one buffer exists per file path.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use quire_core::{BufferId, IdAllocator};

use crate::buffer::{Buffer, BufferContent, BufferKind, CursorPosition, ScrollPosition};
use crate::persistence::{Persistence, PersistenceError};

/// Errors returned by [`BufferStore`] operations.
#[derive(Debug)]
pub enum BufferError {
    NotFound(BufferId),
    NotEditable(BufferId),
    /// Save requested for a buffer that has never had a file path.
    NoPath(BufferId),
    Persistence {
        buffer_id: BufferId,
        source: PersistenceError,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "buffer {id} not found"),
            Self::NotEditable(id) => write!(f, "buffer {id} is not editable"),
            Self::NoPath(id) => write!(f, "buffer {id} has no file path"),
            Self::Persistence { buffer_id, source } => {
                write!(f, "persistence failed for buffer {buffer_id}: {source}")
            }
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferEvent {
    Opened { buffer_id: BufferId },
    LoadFailed { buffer_id: BufferId, message: String },
    ContentChanged { buffer_id: BufferId, revision: u64 },
    DirtyChanged { buffer_id: BufferId, is_dirty: bool },
    Saved { buffer_id: BufferId },
    SaveFailed { buffer_id: BufferId, message: String },
    CursorMoved { buffer_id: BufferId, cursor: CursorPosition },
    ScrollChanged { buffer_id: BufferId, scroll: ScrollPosition },
    ActiveChanged { buffer_id: Option<BufferId> },
    Closed { buffer_id: BufferId },
}

impl BufferEvent {
    /// The buffer this event concerns, if it concerns exactly one.
    #[must_use]
    pub fn buffer_id(&self) -> Option<BufferId> {
        match self {
            Self::Opened { buffer_id }
            | Self::LoadFailed { buffer_id, .. }
            | Self::ContentChanged { buffer_id, .. }
            | Self::DirtyChanged { buffer_id, .. }
            | Self::Saved { buffer_id }
            | Self::SaveFailed { buffer_id, .. }
            | Self::CursorMoved { buffer_id, .. }
            | Self::ScrollChanged { buffer_id, .. }
            | Self::Closed { buffer_id } => Some(*buffer_id),
            Self::ActiveChanged { buffer_id } => *buffer_id,
        }
    }
}

/// Handle returned by [`BufferStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&BufferEvent)>;

struct Subscriber {
    id: SubscriptionId,
    filter: Option<BufferId>,
    callback: Callback,
}

impl Subscriber {
    fn wants(&self, event: &BufferEvent) -> bool {
        match self.filter {
            None => true,
            Some(filter) => event.buffer_id() == Some(filter),
        }
    }
}

/// Owner of every open [`Buffer`].
pub struct BufferStore {
    persistence: Box<dyn Persistence>,
    buffers: BTreeMap<BufferId, Buffer>,
    ids: IdAllocator,
    active_buffer: Option<BufferId>,
    untitled_count: u64,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl BufferStore {
    #[must_use]
    pub fn new(persistence: Box<dyn Persistence>) -> Self {
        Self {
            persistence,
            buffers: BTreeMap::new(),
            ids: IdAllocator::new(),
            active_buffer: None,
            untitled_count: 0,
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Name of the persistence backend in use.
    #[must_use]
    pub fn persistence_name(&self) -> &str {
        self.persistence.name()
    }

    #[must_use]
    pub fn get_buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: BufferId) -> bool {
        self.buffers.contains_key(&id)
    }

    /// All buffers in id order.
    pub fn buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// The buffer already open for `path`, if any.
    #[must_use]
    pub fn find_by_path(&self, path: &Path) -> Option<BufferId> {
        self.buffers
            .values()
            .find(|buffer| buffer.path.as_deref() == Some(path))
            .map(|buffer| buffer.id)
    }

    /// Current content revision of a buffer.
    #[must_use]
    pub fn revision(&self, id: BufferId) -> Option<u64> {
        self.buffers.get(&id).map(|buffer| buffer.revision)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open `path`, or return the buffer already open for it.
    ///
    /// Load failures do not close the buffer: it stays open with `error` set
    /// so the user can see what went wrong and retry.
    pub fn open(&mut self, path: impl AsRef<Path>) -> BufferId {
        let path = path.as_ref();
        if let Some(existing) = self.find_by_path(path) {
            tracing::debug!(buffer_id = %existing, path = %path.display(), "open: already open");
            return existing;
        }

        let id = self.ids.allocate_buffer();
        self.buffers.insert(id, Buffer::loading(id, path));
        self.emit(BufferEvent::Opened { buffer_id: id });

        let result = self.persistence.load(path);
        let Some(buffer) = self.buffers.get_mut(&id) else {
            return id;
        };
        buffer.is_loading = false;
        match result {
            Ok(loaded) => {
                if buffer.kind == BufferKind::Text && loaded.content.as_text().is_none() {
                    buffer.kind = BufferKind::Binary;
                    buffer.is_editable = false;
                    buffer.mime_type = BufferKind::Binary.mime_type(None).to_string();
                }
                buffer.file_size = loaded.metadata.size;
                if let Some(modified) = loaded.metadata.modified {
                    buffer.last_modified = modified;
                }
                buffer.saved_content = loaded.content.clone();
                buffer.content = loaded.content;
                buffer.revision += 1;
                let revision = buffer.revision;
                tracing::debug!(buffer_id = %id, path = %path.display(), size = buffer.file_size, "buffer loaded");
                self.emit(BufferEvent::ContentChanged {
                    buffer_id: id,
                    revision,
                });
            }
            Err(err) => {
                let message = err.to_string();
                buffer.error = Some(message.clone());
                tracing::warn!(buffer_id = %id, path = %path.display(), error = %message, "buffer load failed");
                self.emit(BufferEvent::LoadFailed {
                    buffer_id: id,
                    message,
                });
            }
        }
        id
    }

    /// Create an empty editable buffer named `Untitled-N`.
    pub fn create_untitled(&mut self) -> BufferId {
        self.untitled_count += 1;
        let id = self.ids.allocate_buffer();
        let name = format!("Untitled-{}", self.untitled_count);
        tracing::debug!(buffer_id = %id, name = %name, "untitled buffer created");
        self.buffers.insert(id, Buffer::untitled(id, name));
        self.emit(BufferEvent::Opened { buffer_id: id });
        id
    }

    /// Destroy a buffer. Clears the active buffer if it pointed here.
    pub fn close_buffer(&mut self, id: BufferId) -> Result<Buffer, BufferError> {
        let buffer = self.buffers.remove(&id).ok_or(BufferError::NotFound(id))?;
        tracing::debug!(buffer_id = %id, dirty = buffer.is_dirty, "buffer closed");
        if self.active_buffer == Some(id) {
            self.active_buffer = None;
            self.emit(BufferEvent::ActiveChanged { buffer_id: None });
        }
        self.emit(BufferEvent::Closed { buffer_id: id });
        Ok(buffer)
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Replace a buffer's content. Dirty state is left to the caller.
    pub fn update_buffer_content(
        &mut self,
        id: BufferId,
        content: BufferContent,
    ) -> Result<(), BufferError> {
        let buffer = self.buffers.get_mut(&id).ok_or(BufferError::NotFound(id))?;
        if !buffer.is_editable {
            tracing::warn!(buffer_id = %id, "rejected content update on read-only buffer");
            return Err(BufferError::NotEditable(id));
        }
        buffer.content = content;
        buffer.revision += 1;
        buffer.last_modified = SystemTime::now();
        let revision = buffer.revision;
        tracing::trace!(buffer_id = %id, revision, "content updated");
        self.emit(BufferEvent::ContentChanged {
            buffer_id: id,
            revision,
        });
        Ok(())
    }

    /// Replace content and derive `is_dirty` from the saved baseline.
    pub fn commit_content(
        &mut self,
        id: BufferId,
        text: impl Into<String>,
    ) -> Result<(), BufferError> {
        self.update_buffer_content(id, BufferContent::Text(text.into()))?;
        let dirty = self
            .buffers
            .get(&id)
            .is_some_and(Buffer::differs_from_saved);
        self.set_buffer_dirty(id, dirty)
    }

    pub fn set_buffer_dirty(&mut self, id: BufferId, dirty: bool) -> Result<(), BufferError> {
        let buffer = self.buffers.get_mut(&id).ok_or(BufferError::NotFound(id))?;
        if buffer.is_dirty == dirty {
            return Ok(());
        }
        buffer.is_dirty = dirty;
        self.emit(BufferEvent::DirtyChanged {
            buffer_id: id,
            is_dirty: dirty,
        });
        Ok(())
    }

    /// The file changed underneath us: adopt it as both content and baseline.
    pub fn apply_external_change(
        &mut self,
        id: BufferId,
        content: BufferContent,
    ) -> Result<(), BufferError> {
        let buffer = self.buffers.get_mut(&id).ok_or(BufferError::NotFound(id))?;
        buffer.file_size = content.len() as u64;
        buffer.saved_content = content.clone();
        buffer.content = content;
        buffer.revision += 1;
        buffer.last_modified = SystemTime::now();
        buffer.error = None;
        let revision = buffer.revision;
        tracing::debug!(buffer_id = %id, revision, "external change applied");
        self.emit(BufferEvent::ContentChanged {
            buffer_id: id,
            revision,
        });
        self.set_buffer_dirty(id, false)
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Persist a buffer to its path.
    ///
    /// On success the saved baseline becomes the current content and the
    /// buffer is clean. On failure `error` is recorded, dirty state is left
    /// alone, and nothing is retried.
    pub fn save_buffer(&mut self, id: BufferId) -> Result<(), BufferError> {
        let buffer = self.buffers.get(&id).ok_or(BufferError::NotFound(id))?;
        let Some(path) = buffer.path.clone() else {
            return self.fail_save(id, BufferError::NoPath(id));
        };
        let content = buffer.content.clone();

        match self.persistence.save(&path, &content) {
            Ok(metadata) => {
                if let Some(buffer) = self.buffers.get_mut(&id) {
                    buffer.saved_content = content;
                    buffer.file_size = metadata.size;
                    if let Some(modified) = metadata.modified {
                        buffer.last_modified = modified;
                    }
                    buffer.error = None;
                }
                tracing::debug!(buffer_id = %id, path = %path.display(), "buffer saved");
                self.set_buffer_dirty(id, false)?;
                self.emit(BufferEvent::Saved { buffer_id: id });
                Ok(())
            }
            Err(source) => self.fail_save(
                id,
                BufferError::Persistence {
                    buffer_id: id,
                    source,
                },
            ),
        }
    }

    /// Assign a new path (name, extension and MIME type follow) and save.
    pub fn save_buffer_as(
        &mut self,
        id: BufferId,
        path: impl Into<PathBuf>,
    ) -> Result<(), BufferError> {
        let path = path.into();
        let buffer = self.buffers.get_mut(&id).ok_or(BufferError::NotFound(id))?;
        let relabeled = Buffer::loading(id, &path);
        buffer.name = relabeled.name;
        buffer.extension = relabeled.extension;
        if buffer.kind == BufferKind::Text {
            buffer.mime_type = relabeled.mime_type;
        }
        buffer.path = Some(path);
        self.save_buffer(id)
    }

    fn fail_save(&mut self, id: BufferId, err: BufferError) -> Result<(), BufferError> {
        let message = err.to_string();
        tracing::warn!(buffer_id = %id, error = %message, "buffer save failed");
        if let Some(buffer) = self.buffers.get_mut(&id) {
            buffer.error = Some(message.clone());
        }
        self.emit(BufferEvent::SaveFailed {
            buffer_id: id,
            message,
        });
        Err(err)
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    /// Set the process-wide most recently focused buffer.
    pub fn set_active_buffer(&mut self, id: Option<BufferId>) -> Result<(), BufferError> {
        if let Some(id) = id
            && !self.buffers.contains_key(&id)
        {
            return Err(BufferError::NotFound(id));
        }
        if self.active_buffer != id {
            self.active_buffer = id;
            self.emit(BufferEvent::ActiveChanged { buffer_id: id });
        }
        Ok(())
    }

    #[must_use]
    pub const fn active_buffer(&self) -> Option<BufferId> {
        self.active_buffer
    }

    pub fn set_cursor(&mut self, id: BufferId, cursor: CursorPosition) -> Result<(), BufferError> {
        let buffer = self.buffers.get_mut(&id).ok_or(BufferError::NotFound(id))?;
        if buffer.cursor == cursor {
            return Ok(());
        }
        buffer.cursor = cursor;
        self.emit(BufferEvent::CursorMoved {
            buffer_id: id,
            cursor,
        });
        Ok(())
    }

    pub fn set_scroll(&mut self, id: BufferId, scroll: ScrollPosition) -> Result<(), BufferError> {
        let buffer = self.buffers.get_mut(&id).ok_or(BufferError::NotFound(id))?;
        if buffer.scroll == scroll {
            return Ok(());
        }
        buffer.scroll = scroll;
        self.emit(BufferEvent::ScrollChanged {
            buffer_id: id,
            scroll,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register a callback for events on one buffer (`Some`) or all buffers (`None`).
    pub fn subscribe(
        &mut self,
        filter: Option<BufferId>,
        callback: impl FnMut(&BufferEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|sub| sub.id != id);
        self.subscribers.len() != before
    }

    fn emit(&mut self, event: BufferEvent) {
        for sub in &mut self.subscribers {
            if sub.wants(&event) {
                (sub.callback)(&event);
            }
        }
    }
}

impl fmt::Debug for BufferStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferStore")
            .field("persistence", &self.persistence.name())
            .field("buffers", &self.buffers.len())
            .field("active_buffer", &self.active_buffer)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
