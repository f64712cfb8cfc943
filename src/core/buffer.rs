//! # Bounded FIFO buffer with cancellable blocking operations.
//!
//! [`BoundedBuffer`] is the shared queue producers and consumers exchange items
//! through. It follows the classic two-semaphore construction:
//!
//! ```text
//!            free (permits = empty slots)       filled (permits = queued items)
//! put(x):    acquire free ──► lock; push_back(x) ──► filled += 1
//! take():    acquire filled ──► lock; pop_front() ──► free += 1
//! ```
//!
//! ## Rules
//! - `len() <= capacity()` at all times: a slot permit is held before every push.
//! - FIFO: items leave in the order they were pushed.
//! - Waiting is signal-driven (semaphore wakeups), never polling.
//! - A waiting `put`/`take` races its permit against the caller's
//!   [`CancellationToken`]; on cancellation the pending acquire is dropped, so no
//!   permit leaks and the deque is untouched.
//! - [`peek`](BoundedBuffer::peek) copies the deque under the same short lock and
//!   never waits on capacity.
//!
//! The type is usable on its own: `try_put`/`try_take` are the non-waiting
//! variants, and [`close`](BoundedBuffer::close) seals the buffer. The
//! simulation closes a run's buffer once its workers are gone, so a stopped
//! run's contents stay frozen.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::select;
use tokio::sync::{Semaphore, SemaphorePermit, TryAcquireError};
use tokio_util::sync::CancellationToken;

use crate::error::BufferError;

/// Value moved from producers to consumers.
pub type Item = u32;

/// Fixed-capacity FIFO queue with blocking, cancellable `put` / `take`.
#[derive(Debug)]
pub struct BoundedBuffer {
    items: Mutex<VecDeque<Item>>,
    free: Semaphore,
    filled: Semaphore,
    capacity: usize,
}

impl BoundedBuffer {
    /// Largest supported capacity.
    pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

    /// Creates an empty buffer holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        if capacity > Self::MAX_CAPACITY {
            return Err(BufferError::CapacityTooLarge);
        }
        Ok(Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            free: Semaphore::new(capacity),
            filled: Semaphore::new(0),
            capacity,
        })
    }

    /// Appends `item` at the back, waiting while the buffer is full.
    ///
    /// ### Errors
    /// - [`BufferError::Cancelled`] if `token` fires first (buffer unchanged)
    /// - [`BufferError::Closed`] if the buffer is or becomes closed
    pub async fn put(&self, item: Item, token: &CancellationToken) -> Result<(), BufferError> {
        let permit = Self::acquire(&self.free, token).await?;
        permit.forget();
        self.lock().push_back(item);
        self.filled.add_permits(1);
        Ok(())
    }

    /// Removes and returns the front item, waiting while the buffer is empty.
    ///
    /// ### Errors
    /// - [`BufferError::Cancelled`] if `token` fires first (buffer unchanged)
    /// - [`BufferError::Closed`] if the buffer is or becomes closed
    pub async fn take(&self, token: &CancellationToken) -> Result<Item, BufferError> {
        let permit = Self::acquire(&self.filled, token).await?;
        permit.forget();
        self.pop_front()
    }

    /// Appends without waiting. Returns `Ok(false)` if the buffer is full.
    pub fn try_put(&self, item: Item) -> Result<bool, BufferError> {
        match self.free.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.lock().push_back(item);
                self.filled.add_permits(1);
                Ok(true)
            }
            Err(TryAcquireError::NoPermits) => Ok(false),
            Err(TryAcquireError::Closed) => Err(BufferError::Closed),
        }
    }

    /// Removes the front item without waiting. Returns `Ok(None)` if empty.
    pub fn try_take(&self) -> Result<Option<Item>, BufferError> {
        match self.filled.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.pop_front().map(Some)
            }
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(BufferError::Closed),
        }
    }

    /// Closes the buffer: every waiting and future `put`/`take` fails with
    /// [`BufferError::Closed`]. Queued items stay visible to [`peek`](Self::peek).
    pub fn close(&self) {
        self.free.close();
        self.filled.close();
    }

    /// True once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.free.is_closed()
    }

    /// Consistent front-to-back copy of the current contents.
    pub fn peek(&self) -> Vec<Item> {
        self.lock().iter().copied().collect()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no items are queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    async fn acquire<'a>(
        sem: &'a Semaphore,
        token: &CancellationToken,
    ) -> Result<SemaphorePermit<'a>, BufferError> {
        if token.is_cancelled() {
            return Err(BufferError::Cancelled);
        }
        select! {
            biased;
            _ = token.cancelled() => Err(BufferError::Cancelled),
            res = sem.acquire() => res.map_err(|_closed| BufferError::Closed),
        }
    }

    /// Pops after a `filled` permit was consumed.
    fn pop_front(&self) -> Result<Item, BufferError> {
        let item = self.lock().pop_front();
        match item {
            Some(item) => {
                self.free.add_permits(1);
                Ok(item)
            }
            // Permits track queued items one-to-one; only reachable if that broke.
            None => Err(BufferError::Closed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Item>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
