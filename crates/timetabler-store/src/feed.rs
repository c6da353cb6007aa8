//! Change notification for store documents.
//!
//! Each store owns a [`ChangeFeed`] and publishes the full document after every
//! successful write. [`Subscription`] runs a listener on its own task for the
//! updates that match a filter; dropping or cancelling the handle stops delivery.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

/// Callback invoked with each delivered value.
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

pub const DEFAULT_FEED_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct ChangeFeed<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> ChangeFeed<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, value: T) {
        // Err only means nobody is listening.
        let _ = self.sender.send(value);
    }

    pub fn receiver(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + Send + 'static> Default for ChangeFeed<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// Handle to a running listener.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, F>(mut receiver: broadcast::Receiver<T>, filter: F, listener: Listener<T>) -> Self
    where
        T: Clone + Send + 'static,
        F: Fn(&T) -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(value) => {
                        if filter(&value) {
                            listener(value);
                        }
                    }
                    // Documents are pushed whole, so the next matching update catches up.
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Subscriber fell behind the change feed");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { handle }
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
