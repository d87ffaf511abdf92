// ── Generic reactive entity collection ──
//
// Lock-free concurrent storage with O(1) lookups and push-based
// change notification via `watch` channels.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A lock-free, reactive collection for a single entity type.
///
/// Uses `DashMap` for concurrent lookups and a `watch` channel for
/// push-based change notification. Every mutation rebuilds the snapshot
/// that subscribers receive; snapshots are ordered by key so renders are
/// stable between refreshes.
pub(crate) struct EntityCollection<K, T>
where
    K: Eq + Hash + Ord + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    by_key: DashMap<K, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<K, T> EntityCollection<K, T>
where
    K: Eq + Hash + Ord + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_key: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or update an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: K, entity: T) -> bool {
        let is_new = self.by_key.insert(key, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        is_new
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &K) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, key: &K) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn clear(&self) {
        self.by_key.clear();
        self.rebuild_snapshot();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Return all current keys in the collection.
    pub(crate) fn keys(&self) -> Vec<K> {
        self.by_key.iter().map(|r| r.key().clone()).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collects under the `watch` lock, so concurrent rebuilds are
    /// serialized and the last one sees every finished insert.
    fn rebuild_snapshot(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let mut entries: Vec<(K, Arc<T>)> = self
                .by_key
                .iter()
                .map(|r| (r.key().clone(), Arc::clone(r.value())))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            *snap = Arc::new(entries.into_iter().map(|(_, v)| v).collect());
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_reports_new_keys() {
        let col: EntityCollection<u32, String> = EntityCollection::new();
        assert!(col.upsert(1, "hello".into()));
        assert!(!col.upsert(1, "world".into()));
        assert_eq!(*col.get(&1).unwrap(), "world");
    }

    #[test]
    fn snapshot_is_sorted_by_key() {
        let col: EntityCollection<u32, &'static str> = EntityCollection::new();
        col.upsert(3, "c");
        col.upsert(1, "a");
        col.upsert(2, "b");

        let snap = col.snapshot();
        let values: Vec<&str> = snap.iter().map(|v| **v).collect();
        assert_eq!(values, ["a", "b", "c"]);
    }

    #[test]
    fn remove_and_clear() {
        let col: EntityCollection<u32, String> = EntityCollection::new();
        col.upsert(1, "x".into());
        col.upsert(2, "y".into());

        assert_eq!(*col.remove(&1).unwrap(), "x");
        assert!(col.remove(&1).is_none());
        assert_eq!(col.len(), 1);

        col.clear();
        assert!(col.snapshot().is_empty());
    }

    #[test]
    fn subscribers_see_mutations() {
        let col: EntityCollection<u32, String> = EntityCollection::new();
        let mut rx = col.subscribe();
        col.upsert(7, "seven".into());

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[test]
    fn concurrent_upserts_leave_a_current_snapshot() {
        for _ in 0..50 {
            let col: Arc<EntityCollection<u32, u32>> = Arc::new(EntityCollection::new());
            for key in 0..8 {
                col.upsert(key, 0);
            }

            let workers: Vec<_> = (0..8)
                .map(|key| {
                    let col = Arc::clone(&col);
                    std::thread::spawn(move || {
                        col.upsert(key, 1);
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }

            let snap = col.snapshot();
            let values: Vec<u32> = snap.iter().map(|v| **v).collect();
            assert_eq!(values, vec![1; 8]);
        }
    }
}
