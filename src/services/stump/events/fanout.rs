//! Delivery of change events to the registered listeners

use std::fmt::Debug;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::mediaserver::{BookEvent, MediaServerEventListener, SeriesEvent};

/// Calls every listener in registration order. A listener that fails,
/// panics or times out is logged and skipped; the rest still run.
#[derive(Clone)]
pub struct EventFanout {
    listeners: Arc<Vec<Arc<dyn MediaServerEventListener>>>,
    timeout: Option<Duration>,
}

impl EventFanout {
    pub fn new(listeners: Vec<Arc<dyn MediaServerEventListener>>, timeout: Option<Duration>) -> Self {
        Self {
            listeners: Arc::new(listeners),
            timeout,
        }
    }

    pub async fn notify_books_added(&self, events: Vec<BookEvent>) {
        if events.is_empty() {
            return;
        }
        debug!(count = events.len(), listeners = self.listeners.len(), "Notifying books added");
        for (index, listener) in self.listeners.iter().enumerate() {
            let batch = events.clone();
            self.deliver(index, "on_books_added", &events, listener.on_books_added(batch))
                .await;
        }
    }

    pub async fn notify_series_deleted(&self, events: Vec<SeriesEvent>) {
        if events.is_empty() {
            return;
        }
        debug!(count = events.len(), listeners = self.listeners.len(), "Notifying series deleted");
        for (index, listener) in self.listeners.iter().enumerate() {
            let batch = events.clone();
            self.deliver(index, "on_series_deleted", &events, listener.on_series_deleted(batch))
                .await;
        }
    }

    async fn deliver<E, F>(&self, index: usize, callback: &str, events: &[E], call: F)
    where
        E: Debug,
        F: Future<Output = anyhow::Result<()>>,
    {
        let guarded = AssertUnwindSafe(call).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        listener = index,
                        callback,
                        timeout_ms = limit.as_millis() as u64,
                        events = ?events,
                        "Event listener timed out"
                    );
                    return;
                }
            },
            None => guarded.await,
        };

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(listener = index, callback, error = %e, events = ?events, "Event listener failed");
            }
            Err(_) => {
                warn!(listener = index, callback, events = ?events, "Event listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for EventFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFanout")
            .field("listeners", &self.listeners.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
