//! # Bus for broadcasting state-change notifications.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from several sources (controller, scheduler).
//!
//! ## Architecture
//! ```text
//! Publishers:                         Receivers:
//!   Simulation ──┐
//!                ├────► Bus ───┬────► dispatcher ────► ListenerSet
//!   Scheduler  ──┘ (broadcast) └────► Simulation::subscribe() receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits on receivers.
//! - **Bounded capacity**: one ring buffer holds recent notifications for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: notifications sent with no receivers are dropped.

use tokio::sync::broadcast;

use super::event::StateChange;

/// Broadcast channel for [`StateChange`] notifications.
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<StateChange>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<StateChange>(capacity);
        Self { tx }
    }

    /// Publishes a notification to all active receivers.
    ///
    /// Returns immediately; with no receivers the notification is dropped.
    pub fn publish(&self, change: StateChange) {
        let _ = self.tx.send(change);
    }

    /// Creates a receiver for notifications sent **after** this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.tx.subscribe()
    }
}
