//! End-to-end behavior of the store + sync manager pair.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use quire_buffer::{
    BufferEvent, BufferStore, BufferSyncManager, FsPersistence, MemoryPersistence,
    ReconcileOutcome,
};

const WINDOW: Duration = Duration::from_millis(500);

fn content_writes(store: &mut BufferStore) -> Rc<Cell<usize>> {
    let writes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&writes);
    store.subscribe(None, move |event| {
        if matches!(event, BufferEvent::ContentChanged { .. }) {
            counter.set(counter.get() + 1);
        }
    });
    writes
}

#[test]
fn typing_hello_then_waiting_flushes_once() {
    let mut store = BufferStore::new(Box::new(MemoryPersistence::new()));
    let id = store.create_untitled();
    let writes = content_writes(&mut store);
    let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");

    let t0 = Instant::now();
    assert!(!sync.is_dirty());
    let mut typed = String::new();
    for (i, ch) in "hello".chars().enumerate() {
        typed.push(ch);
        sync.update_local_content(typed.clone(), t0 + Duration::from_millis(80 * i as u64));
        assert!(!sync.poll(&mut store, t0 + Duration::from_millis(80 * i as u64)).expect("poll"));
    }
    assert!(sync.is_dirty());

    let after = t0 + Duration::from_millis(80 * 4) + Duration::from_millis(501);
    assert!(sync.poll(&mut store, after).expect("poll"));
    assert!(!sync.is_dirty());

    let buffer = store.get_buffer(id).expect("buffer");
    assert_eq!(buffer.text(), Some("hello"));
    // Unsaved relative to disk, independent of the sync flag.
    assert!(buffer.is_dirty);
    assert_eq!(writes.get(), 1);
}

#[test]
fn save_forces_sync_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "# Notes\n").expect("seed");

    let mut store = BufferStore::new(Box::new(FsPersistence));
    let id = store.open(&path);
    let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
    sync.update_local_content("# Notes\n\nmore\n", Instant::now());
    sync.save(&mut store).expect("save");

    assert_eq!(
        std::fs::read_to_string(&path).expect("read back"),
        "# Notes\n\nmore\n"
    );
    let buffer = store.get_buffer(id).expect("buffer");
    assert!(!buffer.is_dirty);
    assert!(!sync.is_dirty());
}

#[test]
fn two_editors_on_one_buffer_last_flush_wins() {
    let mut store = BufferStore::new(Box::new(MemoryPersistence::new()));
    let id = store.create_untitled();
    let mut left = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");
    let mut right = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");

    let t0 = Instant::now();
    left.update_local_content("left", t0);
    right.update_local_content("right", t0 + Duration::from_millis(100));
    left.poll(&mut store, t0 + WINDOW).expect("left flush");
    assert_eq!(right.reconcile(&store).expect("ok"), ReconcileOutcome::Deferred);
    right
        .poll(&mut store, t0 + Duration::from_millis(100) + WINDOW)
        .expect("right flush");

    assert_eq!(store.get_buffer(id).and_then(|b| b.text()), Some("right"));
    assert_eq!(left.reconcile(&store).expect("ok"), ReconcileOutcome::Applied);
    assert_eq!(left.local_content(), "right");
}

proptest! {
    #[test]
    fn burst_of_updates_writes_store_once_with_last_value(
        edits in proptest::collection::vec(("[a-z ]{0,12}", 0u64..499), 1..30),
    ) {
        let mut store = BufferStore::new(Box::new(MemoryPersistence::new()));
        let id = store.create_untitled();
        let writes = content_writes(&mut store);
        let mut sync = BufferSyncManager::attach(&store, id, WINDOW).expect("attach");

        let mut now = Instant::now();
        for (text, gap) in &edits {
            now += Duration::from_millis(*gap);
            sync.poll(&mut store, now).expect("poll");
            sync.update_local_content(text.clone(), now);
        }
        sync.poll(&mut store, now + WINDOW).expect("poll");

        let last = &edits[edits.len() - 1].0;
        prop_assert_eq!(writes.get(), 1);
        prop_assert_eq!(store.get_buffer(id).and_then(|b| b.text()), Some(last.as_str()));
        prop_assert!(!sync.is_dirty());
    }
}
