//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`](crate::events::Event) to multiple
//! subscribers **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged (isolation).
//! - `shutdown()` drains every queue before returning.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for that
//!   subscriber).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::events::Event;

use super::Subscribe;

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sub);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        warn!(subscriber = s.name(), info = ?panic_err, "subscriber panicked");
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is dropped for it
    /// and a warning is logged with the subscriber's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = channel.name, reason = "full", "subscriber dropped event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = channel.name, reason = "closed", "subscriber dropped event");
                }
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }
    }

    #[derive(Default)]
    struct Narrow {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Narrow {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn shutdown_drains_queued_events() {
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone() as Arc<dyn Subscribe>]);
        set.emit(&Event::new(EventKind::DowntimeOpened));
        set.emit(&Event::new(EventKind::DowntimeClosed));
        set.shutdown().await;

        assert_eq!(
            *rec.seen.lock(),
            vec![EventKind::DowntimeOpened, EventKind::DowntimeClosed]
        );
    }

    #[tokio::test]
    async fn panicking_subscriber_does_not_affect_others() {
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![
            Arc::new(Panicker) as Arc<dyn Subscribe>,
            rec.clone() as Arc<dyn Subscribe>,
        ]);
        assert_eq!(set.len(), 2);
        set.emit(&Event::new(EventKind::KeepAliveBad));
        set.emit(&Event::new(EventKind::KeepAliveBad));
        set.shutdown().await;

        assert_eq!(rec.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_that_subscriber() {
        let narrow = Arc::new(Narrow::default());
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![
            narrow.clone() as Arc<dyn Subscribe>,
            rec.clone() as Arc<dyn Subscribe>,
        ]);

        // Workers cannot run before the first await on a current-thread runtime.
        set.emit(&Event::new(EventKind::DowntimeOpened));
        set.emit(&Event::new(EventKind::DowntimeClosed));
        set.emit(&Event::new(EventKind::DowntimeRemoved));
        set.shutdown().await;

        assert_eq!(*narrow.seen.lock(), vec![EventKind::DowntimeOpened]);
        assert_eq!(rec.seen.lock().len(), 3);
    }
}
