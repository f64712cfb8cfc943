//! # State-change notifications.
//!
//! A [`StateChange`] tells observers that the simulation's observable state may
//! have changed and *why* ([`ChangeReason`]). It deliberately carries no
//! simulation data: observers pull a fresh snapshot when they are notified.
//!
//! ## Ordering guarantees
//! Each notification has a globally unique sequence number (`seq`) that increases
//! monotonically across all publishers.
//!
//! ## Example
//! ```rust
//! use bufsim::{ChangeReason, StateChange};
//!
//! let a = StateChange::now(ChangeReason::Started);
//! let b = StateChange::now(ChangeReason::Tick);
//! assert!(b.seq > a.seq);
//! assert_eq!(a.reason.as_label(), "started");
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for notification ordering.
static CHANGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Why a notification was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    /// A run was started (workers spawned, scheduler armed).
    Started,
    /// Periodic scheduler tick while a run is active.
    Tick,
    /// A run was stopped; every worker is now terminated.
    Stopped,
    /// An external observer attached and wants the current state.
    ObserverAttached,
    /// An external observer detached.
    ObserverDetached,
}

impl ChangeReason {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ChangeReason::Started => "started",
            ChangeReason::Tick => "tick",
            ChangeReason::Stopped => "stopped",
            ChangeReason::ObserverAttached => "observer_attached",
            ChangeReason::ObserverDetached => "observer_detached",
        }
    }
}

/// A single state-change notification.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `reason`: what triggered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Trigger of this notification.
    pub reason: ChangeReason,
}

impl StateChange {
    /// Creates a notification stamped with the current time and next sequence number.
    pub fn now(reason: ChangeReason) -> Self {
        Self {
            seq: CHANGE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            reason,
        }
    }

    /// True for periodic ticks, false for out-of-band notifications.
    #[inline]
    pub fn is_tick(&self) -> bool {
        matches!(self.reason, ChangeReason::Tick)
    }
}
