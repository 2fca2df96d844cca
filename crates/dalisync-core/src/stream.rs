// ── Reactive snapshot stream ──
//
// Subscription handle for consumers that want to follow refreshes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::{Notification, Snapshot};

/// A subscription to the coordinator's snapshot.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting into a `Stream`.
pub struct SnapshotStream {
    current: Notification,
    receiver: watch::Receiver<Notification>,
}

impl SnapshotStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Notification>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The notification captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Notification {
        &self.current
    }

    /// The latest snapshot (may have changed since `current`).
    pub fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.receiver.borrow().snapshot)
    }

    /// Wait for the next refresh attempt, successful or not.
    /// Returns `None` once the coordinator has been dropped.
    pub async fn changed(&mut self) -> Option<Notification> {
        self.receiver.changed().await.ok()?;
        let n = self.receiver.borrow_and_update().clone();
        self.current = n.clone();
        Some(n)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The first item is the current notification.
    pub fn into_stream(self) -> NotificationStream {
        NotificationStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct NotificationStream {
    inner: WatchStream<Notification>,
}

impl Stream for NotificationStream {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
