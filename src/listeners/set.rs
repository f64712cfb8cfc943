//! # ListenerSet: non-blocking fan-out over multiple listeners
//!
//! [`ListenerSet`] hands each [`StateChange`] to every listener **without
//! awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&StateChange)` returns immediately.
//! - Per-listener FIFO (mailbox order).
//! - Lifecycle notifications (`Started`, `Stopped`, observer changes) are never
//!   dropped. A full mailbox makes room by evicting its oldest queued `Tick`.
//! - Panics inside listeners are caught and logged (isolation); the listener
//!   keeps receiving later notifications.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different listeners.
//! - Ticks are best effort: a tick arriving at a full mailbox is dropped, and a
//!   queued tick may be evicted. Listeners pull fresh snapshots, so a later
//!   notification covers the loss.
//!
//! ## Diagram
//! ```text
//!    emit(&StateChange)
//!        ├────────────────► [mailbox L1] ─► worker L1 ─► on_state_change()
//!        ├────────────────► [mailbox L2] ─► worker L2 ─► on_state_change()
//!        └────────────────► [mailbox LN] ─► worker LN ─► on_state_change()
//!
//!  mailbox full:
//!    Tick           ─► dropped (warn)
//!    anything else  ─► evict oldest queued Tick, enqueue
//!                      (no Tick queued: enqueue past capacity)
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{debug, error, warn};

use crate::events::StateChange;

use super::Listen;

/// What happened to a notification handed to a [`Mailbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Queued,
    DroppedTick,
    EvictedTick,
    OverCapacity,
}

/// Single-consumer notification queue that never loses lifecycle changes.
struct Mailbox {
    queue: Mutex<VecDeque<StateChange>>,
    capacity: usize,
    ready: Notify,
    closed: AtomicBool,
}

impl Mailbox {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ready: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn push(&self, change: StateChange) -> Delivery {
        let mut queue = self.lock();
        let delivery = if queue.len() < self.capacity {
            Delivery::Queued
        } else if change.is_tick() {
            return Delivery::DroppedTick;
        } else if let Some(pos) = queue.iter().position(StateChange::is_tick) {
            queue.remove(pos);
            Delivery::EvictedTick
        } else {
            Delivery::OverCapacity
        };
        queue.push_back(change);
        drop(queue);
        self.ready.notify_one();
        delivery
    }

    /// Next queued change; `None` once closed and drained.
    async fn next(&self) -> Option<StateChange> {
        loop {
            if let Some(change) = self.lock().pop_front() {
                return Some(change);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            // `notify_one` stores a permit when nobody waits, so a push between
            // the check above and this await is not lost.
            self.ready.notified().await;
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.ready.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<StateChange>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Per-listener mailbox metadata.
struct ListenerChannel {
    name: &'static str,
    mailbox: Arc<Mailbox>,
}

/// Fan-out coordinator with per-listener mailboxes and worker tasks.
pub struct ListenerSet {
    channels: Vec<ListenerChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl ListenerSet {
    /// Creates a new set and spawns one worker task per listener.
    ///
    /// Must be called inside a tokio runtime. Minimum mailbox capacity is 1.
    #[must_use]
    pub fn new(listeners: Vec<Arc<dyn Listen>>) -> Self {
        let mut channels = Vec::with_capacity(listeners.len());
        let mut workers = Vec::with_capacity(listeners.len());

        for listener in listeners {
            let name = listener.name();
            let mailbox = Arc::new(Mailbox::new(listener.queue_capacity()));
            let inbox = Arc::clone(&mailbox);
            let l = Arc::clone(&listener);

            let handle = tokio::spawn(async move {
                while let Some(change) = inbox.next().await {
                    let fut = l.on_state_change(&change);
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        error!(
                            listener = l.name(),
                            info = %panic_message(panic_err.as_ref()),
                            "listener panicked"
                        );
                    }
                }
            });

            channels.push(ListenerChannel { name, mailbox });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one notification out to all listeners (non-blocking).
    ///
    /// Only ticks can be lost for a slow listener; see the module docs.
    pub fn emit(&self, change: &StateChange) {
        for channel in &self.channels {
            match channel.mailbox.push(*change) {
                Delivery::Queued => {}
                Delivery::DroppedTick => {
                    warn!(listener = channel.name, "listener dropped tick: mailbox full");
                }
                Delivery::EvictedTick => {
                    debug!(
                        listener = channel.name,
                        reason = change.reason.as_label(),
                        "evicted queued tick for lifecycle notification"
                    );
                }
                Delivery::OverCapacity => {
                    warn!(
                        listener = channel.name,
                        reason = change.reason.as_label(),
                        "listener mailbox over capacity"
                    );
                }
            }
        }
    }

    /// Graceful shutdown: close all mailboxes and await worker completion.
    ///
    /// Already queued notifications are still delivered.
    pub async fn shutdown(self) {
        for channel in &self.channels {
            channel.mailbox.close();
        }
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeReason;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Counter {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Listen for Counter {
        async fn on_state_change(&self, _change: &StateChange) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Listen for Exploder {
        async fn on_state_change(&self, change: &StateChange) {
            if change.reason == ChangeReason::Tick {
                panic!("boom");
            }
        }
        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    /// Records every reason it handles, taking `delay` per call.
    struct Slow {
        delay: Duration,
        seen: Mutex<Vec<ChangeReason>>,
    }

    #[async_trait]
    impl Listen for Slow {
        async fn on_state_change(&self, change: &StateChange) {
            tokio::time::sleep(self.delay).await;
            self.seen.lock().unwrap().push(change.reason);
        }
        fn name(&self) -> &'static str {
            "slow"
        }
        fn queue_capacity(&self) -> usize {
            2
        }
    }

    fn counter() -> Arc<Counter> {
        Arc::new(Counter {
            seen: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_every_listener_receives() {
        let a = counter();
        let b = counter();
        let set = ListenerSet::new(vec![a.clone(), b.clone()]);
        assert_eq!(set.len(), 2);

        set.emit(&StateChange::now(ChangeReason::Started));
        set.shutdown().await;

        assert_eq!(a.seen.load(Ordering::SeqCst), 1);
        assert_eq!(b.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_listener_is_isolated() {
        let c = counter();
        let set = ListenerSet::new(vec![Arc::new(Exploder), c.clone()]);

        set.emit(&StateChange::now(ChangeReason::Tick));
        set.emit(&StateChange::now(ChangeReason::Tick));
        set.shutdown().await;

        assert_eq!(c.seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_listener_does_not_block_emit() {
        let slow = Arc::new(Slow {
            delay: Duration::from_millis(200),
            seen: Mutex::new(Vec::new()),
        });
        let set = ListenerSet::new(vec![slow.clone()]);

        let res = tokio::time::timeout(Duration::from_millis(100), async {
            for _ in 0..50 {
                set.emit(&StateChange::now(ChangeReason::Tick));
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(res.is_ok());

        set.shutdown().await;
        // One in flight plus at most a full mailbox.
        assert!(slow.seen.lock().unwrap().len() <= 3);
    }

    #[tokio::test]
    async fn test_lifecycle_survives_full_mailbox() {
        let slow = Arc::new(Slow {
            delay: Duration::from_millis(20),
            seen: Mutex::new(Vec::new()),
        });
        let set = ListenerSet::new(vec![slow.clone()]);

        set.emit(&StateChange::now(ChangeReason::Started));
        for _ in 0..10 {
            set.emit(&StateChange::now(ChangeReason::Tick));
        }
        set.emit(&StateChange::now(ChangeReason::Stopped));
        set.shutdown().await;

        let seen = slow.seen.lock().unwrap().clone();
        assert!(seen.contains(&ChangeReason::Started));
        assert_eq!(seen.last(), Some(&ChangeReason::Stopped));
        assert!(seen.len() <= 4);
    }

    #[test]
    fn test_mailbox_eviction_rules() {
        let mailbox = Mailbox::new(2);
        assert_eq!(mailbox.push(StateChange::now(ChangeReason::Tick)), Delivery::Queued);
        assert_eq!(
            mailbox.push(StateChange::now(ChangeReason::ObserverAttached)),
            Delivery::Queued
        );
        assert_eq!(mailbox.push(StateChange::now(ChangeReason::Tick)), Delivery::DroppedTick);
        assert_eq!(
            mailbox.push(StateChange::now(ChangeReason::Stopped)),
            Delivery::EvictedTick
        );
        assert_eq!(
            mailbox.push(StateChange::now(ChangeReason::Started)),
            Delivery::OverCapacity
        );

        let reasons: Vec<ChangeReason> = mailbox.lock().iter().map(|c| c.reason).collect();
        assert_eq!(
            reasons,
            vec![
                ChangeReason::ObserverAttached,
                ChangeReason::Stopped,
                ChangeReason::Started
            ]
        );
    }

    #[tokio::test]
    async fn test_mailbox_drains_before_close() {
        let mailbox = Mailbox::new(4);
        mailbox.push(StateChange::now(ChangeReason::Started));
        mailbox.close();
        assert_eq!(
            mailbox.next().await.map(|c| c.reason),
            Some(ChangeReason::Started)
        );
        assert!(mailbox.next().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_set() {
        let set = ListenerSet::new(Vec::new());
        assert!(set.is_empty());
        set.emit(&StateChange::now(ChangeReason::Tick));
        set.shutdown().await;
    }
}
