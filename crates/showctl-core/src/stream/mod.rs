// ── Reactive mirror streams ──
//
// Subscription types for consuming mirror changes from the controller.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::Mirror;

pub use filter::{KnobFilter, PatchFilter};

/// A subscription to the client mirror.
///
/// Provides point-in-time snapshot access and change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct MirrorStream {
    current: Arc<Mirror>,
    receiver: watch::Receiver<Arc<Mirror>>,
}

impl MirrorStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Mirror>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<Mirror> {
        &self.current
    }

    /// Wait for the next change. `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<Arc<Mirror>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Turn the subscription into a `Stream` that yields the current
    /// snapshot first, then one snapshot per change.
    pub fn into_stream(self) -> MirrorWatchStream {
        MirrorWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a fresh mirror snapshot on every change.
pub struct MirrorWatchStream {
    inner: WatchStream<Arc<Mirror>>,
}

impl Stream for MirrorWatchStream {
    type Item = Arc<Mirror>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
