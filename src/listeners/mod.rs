//! # State-change listeners.
//!
//! This module provides the [`Listen`] trait and the [`ListenerSet`] that drives
//! registered listeners from the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//!   Simulation / Scheduler ── publish(StateChange) ──► Bus ──► dispatcher
//!                                                                │
//!                                                         ListenerSet::emit
//!                                                      ┌─────────┼─────────┐
//!                                                      ▼         ▼         ▼
//!                                                  [mbox L1]  [mbox L2]  [mbox LN] 
//!                                                      │         │         │
//!                                                   on_state_change(&StateChange)
//! ```
//!
//! A listener typically holds a [`SnapshotReader`](crate::SnapshotReader),
//! pulls the current [`SimulationState`](crate::SimulationState) when notified,
//! and pushes it to its own transport.
//!
//! ## Implementing a listener
//! ```no_run
//! use async_trait::async_trait;
//! use bufsim::{Listen, SnapshotReader, StateChange};
//!
//! struct Push {
//!     reader: SnapshotReader,
//! }
//!
//! #[async_trait]
//! impl Listen for Push {
//!     async fn on_state_change(&self, _change: &StateChange) {
//!         let _json = self.reader.snapshot().to_json();
//!         // send to connected clients...
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "push"
//!     }
//! }
//! ```

mod listen;
mod set;

#[cfg(feature = "logging")]
mod log;

pub use listen::Listen;
pub use set::ListenerSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
