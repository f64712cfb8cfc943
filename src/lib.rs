//! # bufsim
//!
//! **bufsim** runs an observable producer/consumer simulation over a bounded
//! buffer on tokio.
//!
//! Producers draw random items and put them into a fixed-capacity FIFO;
//! consumers take them out. Both simulate work with a random delay. Every
//! worker publishes whether it is `RUNNING`, `WAITING` on the buffer, or
//! `TERMINATED`, and observers receive periodic snapshots of the whole system.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            start(SimulationConfig) / stop() / apply(Command)
//!                                  │
//! ┌────────────────────────────────▼──────────────────────────────────┐
//! │  Simulation (controller)                                          │
//! │  - at most one active run                                         │
//! │  - SnapshotReader (current run view + running flag)               │
//! │  - Bus (broadcast StateChange)                                    │
//! │  - observer count                                                 │
//! └──────┬──────────────────┬─────────────────┬────────────────┬──────┘
//!        ▼                  ▼                 ▼                ▼
//!  ┌───────────┐     ┌───────────┐     ┌───────────┐   ┌───────────────┐
//!  │ Producer 1│ ... │ Consumer 1│ ... │ Consumer M│   │  Broadcast    │
//!  │  (task)   │     │  (task)   │     │  (task)   │   │  scheduler    │
//!  └─────┬─────┘     └─────▲─────┘     └─────▲─────┘   └───────┬───────┘
//!        │ put             │ take            │ take            │ Tick
//!        ▼                 │                 │                 ▼
//!  ┌─────────────────────────────────────────────┐     ┌───────────────┐
//!  │ BoundedBuffer (FIFO, capacity = bufferSize) │     │      Bus      │
//!  └─────────────────────────────────────────────┘     └───────┬───────┘
//!        every worker ──set(state)──► Registry                 ▼
//!                                                        dispatcher
//!                                                              ▼
//!                                                        ListenerSet
//!                                                   ┌──────────┼──────────┐
//!                                                   ▼          ▼          ▼
//!                                               listener1  listener2  listenerN
//!                                            (pull snapshot, push to clients)
//! ```
//!
//! ### Worker lifecycle
//! ```text
//! producer:  Running ─► work ─► Waiting ─► put ─┐     (repeat)
//! consumer:  Waiting ─► take ─► Running ─► work ┘     (repeat)
//!
//! exit on: run token cancelled | running flag cleared | buffer fault | panic
//! on exit: Terminated (absorbing; never changes again)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Controller**    | Start, stop, replace and dispose runs.                       | [`Simulation`], [`SimulationBuilder`]      |
//! | **Buffer**        | Bounded FIFO with cancellable blocking operations.           | [`BoundedBuffer`]                          |
//! | **Snapshots**     | Deep-copy state with a stable JSON shape.                    | [`SimulationState`], [`SnapshotReader`]    |
//! | **Listeners**     | Deliver state changes to transports without blocking.        | [`Listen`], [`ListenerSet`]                |
//! | **Commands**      | Decode client control messages.                              | [`Command`]                                |
//! | **Errors**        | Typed errors with stable log labels.                         | [`SimulationError`], [`ConfigError`]       |
//! | **Configuration** | Runtime settings and per-run shape.                          | [`Config`], [`SimulationConfig`]           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] listener _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use bufsim::{Config, DelayPolicy, Simulation, SimulationConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         work: DelayPolicy::new(Duration::from_millis(5), Duration::from_millis(20)),
//!         ..Config::default()
//!     };
//!     let sim = Simulation::builder(cfg).build();
//!
//!     sim.start(SimulationConfig::new(2, 1, 3)).await?;
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     println!("{}", sim.snapshot().to_json()?);
//!
//!     sim.stop().await?;
//!     assert!(!sim.snapshot().is_running);
//!     sim.dispose().await;
//!     Ok(())
//! }
//! ```
mod command;
mod config;
mod core;
mod error;
mod events;
mod listeners;
mod policies;

// ---- Public re-exports ----

pub use command::Command;
pub use config::{Config, SimulationConfig};
pub use core::{
    BoundedBuffer, Item, Role, Simulation, SimulationBuilder, SimulationState, SnapshotReader,
    Worker, WorkerState,
};
pub use error::{BufferError, CommandError, ConfigError, SimulationError, WorkerError};
pub use events::{Bus, ChangeReason, StateChange};
pub use listeners::{Listen, ListenerSet};
pub use policies::DelayPolicy;

// Optional: expose a simple built-in logging listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
