use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{Result, StreamError};

/// Number of items the handoff queue holds.
///
/// Draining on close relies on this staying small: the consumer pulls one
/// item at a time until it sees [`Item::End`].
pub const QUEUE_CAPACITY: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Chunk(Bytes),
    End,
}

/// Closed flag of a consumer, readable from the producer's thread.
#[derive(Debug, Clone, Default)]
pub struct ClosedFlag(Arc<AtomicBool>);

impl ClosedFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Producer half of the handoff queue.
#[derive(Debug)]
pub struct QueueSender {
    tx: mpsc::Sender<Item>,
}

/// Consumer half of the handoff queue.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Item>,
}

/// Single-slot queue usable from both tasks and blocking threads.
pub fn handoff_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (QueueSender { tx }, QueueReceiver { rx })
}

impl QueueSender {
    /// Suspend the calling task until there is room, then push `item`.
    ///
    /// Fails with [`StreamError::ReaderClosed`] if the receiver is gone.
    pub async fn put(&self, item: Item) -> Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_| StreamError::ReaderClosed)
    }

    /// Block the current thread until there is room, then push `item`.
    ///
    /// # Panics
    /// When called from inside an async task.
    pub fn put_blocking(&self, item: Item) -> Result<()> {
        self.tx
            .blocking_send(item)
            .map_err(|_| StreamError::ReaderClosed)
    }
}

impl QueueReceiver {
    /// Suspend the calling task until an item is available.
    /// A dropped sender reads as [`Item::End`].
    pub async fn get(&mut self) -> Item {
        self.rx.recv().await.unwrap_or(Item::End)
    }

    /// Block the current thread until an item is available.
    /// A dropped sender reads as [`Item::End`].
    ///
    /// # Panics
    /// When called from inside an async task.
    pub fn get_blocking(&mut self) -> Item {
        self.rx.blocking_recv().unwrap_or(Item::End)
    }

    #[cfg(test)]
    pub(crate) fn try_get(&mut self) -> Option<Item> {
        self.rx.try_recv().ok()
    }
}
