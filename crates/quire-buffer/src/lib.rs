#![forbid(unsafe_code)]

//! Buffers: the canonical content of every open document.
//!
//! - [`Buffer`] - content plus metadata for one open document
//! - [`BufferStore`] - the single writer of buffer state, with subscribers
//! - [`Persistence`] - the load/save collaborator ([`MemoryPersistence`], [`FsPersistence`])
//! - [`BufferSyncManager`] - debounced bridge between an editing surface and the store
//!
//! # Example
//! ```
//! use std::time::{Duration, Instant};
//! use quire_buffer::{BufferStore, BufferSyncManager, MemoryPersistence};
//!
//! let mut store = BufferStore::new(Box::new(MemoryPersistence::new()));
//! let id = store.create_untitled();
//! let mut sync = BufferSyncManager::attach(&store, id, Duration::from_millis(500)).unwrap();
//!
//! let t0 = Instant::now();
//! sync.update_local_content("hello", t0);
//! assert!(sync.is_dirty());
//! sync.poll(&mut store, t0 + Duration::from_millis(600)).unwrap();
//! assert_eq!(store.get_buffer(id).unwrap().text(), Some("hello"));
//! assert!(!sync.is_dirty());
//! ```

pub mod buffer;
pub mod persistence;
pub mod store;
pub mod sync;

pub use buffer::{Buffer, BufferContent, BufferKind, CursorPosition, ScrollPosition};
pub use persistence::{
    FileMetadata, FsPersistence, LoadedFile, MemoryPersistence, Persistence, PersistenceError,
};
pub use store::{BufferError, BufferEvent, BufferStore, SubscriptionId};
pub use sync::{BufferSyncManager, ReconcileOutcome};
