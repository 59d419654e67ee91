use crate::bus::Event;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Receiving side of a Flock event subscription.
///
/// A listener that falls behind the channel buffer, e.g. a notification writer waiting on
/// the database, loses the overwritten events and resumes from the oldest one still held.
/// The loss is logged once the listener catches up.
pub trait EventReceiverExt<T> {
    /// The next event, or `None` after the bus shut down or was dropped.
    ///
    /// Not called `recv` so the inherent `Receiver::recv` does not shadow it.
    fn recv_event(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;
}

impl<T: Event> EventReceiverExt<T> for Receiver<Arc<T>> {
    async fn recv_event(&mut self) -> Option<Arc<T>> {
        let event = std::any::type_name::<T>();
        let mut dropped = 0u64;

        loop {
            match self.recv().await {
                Ok(next) => {
                    if dropped > 0 {
                        warn!(event, dropped, "Listener fell behind the event bus, events dropped");
                    }
                    return Some(next);
                },
                Err(RecvError::Lagged(n)) => {
                    dropped = dropped.saturating_add(n);
                    debug!(event, dropped, "Listener lagging");
                },
                Err(RecvError::Closed) => {
                    debug!(event, "Event channel closed");
                    return None;
                },
            }
        }
    }
}
