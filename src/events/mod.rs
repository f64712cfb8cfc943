//! State-change events: types and broadcast bus.
//!
//! This module groups the notification **data model** and the **bus** used to
//! announce that simulation state changed.
//!
//! ## Contents
//! - [`ChangeReason`], [`StateChange`] why and when state changed
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Simulation` (start/stop/attach/detach), the broadcast
//!   scheduler (periodic ticks).
//! - **Consumers**: the simulation's dispatcher (fans out to `ListenerSet`) and
//!   any receiver obtained from `Simulation::subscribe()`.
//!
//! Events say *when*; listeners pull *what* through a snapshot.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{ChangeReason, StateChange};
