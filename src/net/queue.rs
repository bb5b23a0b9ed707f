//! Bounded FIFO between the intake and dispatch loops.
//!
//! Backed by an `embassy-sync` channel so it can live in a `static`.
//! `push` blocks when full; nothing is ever dropped.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use futures_lite::future::block_on;

use crate::config::CONNECTION_QUEUE_DEPTH;

// Links esp-idf-hal's critical-section impl, which the raw mutex above
// needs on the device.  Host builds get theirs from `critical-section/std`.
#[cfg(target_os = "espidf")]
use esp_idf_hal as _;

pub struct ConnectionQueue<T> {
    inner: Channel<CriticalSectionRawMutex, T, CONNECTION_QUEUE_DEPTH>,
}

impl<T> ConnectionQueue<T> {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    /// Enqueue, waiting for space as long as it takes.
    pub fn push(&self, item: T) {
        block_on(self.inner.send(item));
    }

    /// Enqueue only if there is space.  A full queue hands the item back.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        self.inner.try_send(item).map_err(|TrySendError::Full(item)| item)
    }

    /// Dequeue, waiting indefinitely for an item.
    pub fn pop(&self) -> T {
        block_on(self.inner.receive())
    }

    pub fn try_pop(&self) -> Option<T> {
        self.inner.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        CONNECTION_QUEUE_DEPTH
    }
}

impl<T> Default for ConnectionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
