// ── Reactive entity streams ──
//
// Subscription handles vended by the `DataStore`. A UI holds one per view
// and re-renders whenever `changed()` resolves.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Shared, immutable view of a whole collection.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// A subscription to one collection of the store.
pub struct EntityStream<T: Send + Sync + 'static> {
    current: Snapshot<T>,
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last `changed()`.
    pub fn current(&self) -> &Snapshot<T> {
        &self.current
    }

    /// Latest snapshot, without marking it seen.
    pub fn latest(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Whether the collection moved since the last `changed()`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> SnapshotStream<T> {
        SnapshotStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` of snapshots: yields the current one first, then one per change.
pub struct SnapshotStream<T: Send + Sync + 'static> {
    inner: WatchStream<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> Stream for SnapshotStream<T> {
    type Item = Snapshot<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
