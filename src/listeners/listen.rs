//! # Core listener trait
//!
//! `Listen` is the extension point for transports that deliver simulation state
//! to the outside world. Each listener is driven by a dedicated worker task fed
//! by a bounded mailbox owned by the [`ListenerSet`](crate::ListenerSet).
//!
//! ## Contract
//! - Implementations may be slow (network I/O); they never block the scheduler,
//!   the workers, or other listeners.
//! - If a listener's mailbox is full, **ticks** for that listener are dropped
//!   (warn). Lifecycle notifications are always delivered, so the last one a
//!   listener handles after a stop is `Stopped`.

use async_trait::async_trait;

use crate::events::StateChange;

/// Contract for state-change listeners.
#[async_trait]
pub trait Listen: Send + Sync + 'static {
    /// Handle a single notification.
    async fn on_state_change(&self, change: &StateChange);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this listener's mailbox.
    fn queue_capacity(&self) -> usize {
        64
    }
}
