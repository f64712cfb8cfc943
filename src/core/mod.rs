//! Runtime core: buffer, workers and the simulation controller.
//!
//! The public entry point is [`Simulation`]; the rest is exposed for listeners
//! and tests that want to look at individual pieces.
//!
//! Internal modules:
//! - [`buffer`]: bounded FIFO with blocking, cancellable `put`/`take`;
//! - [`worker`]: producer and consumer loops and their observable state;
//! - [`registry`]: per-run map of worker states with absorbing termination;
//! - [`scheduler`]: periodic `Tick` publisher for the active run;
//! - [`snapshot`]: deep-copy snapshots of the current run;
//! - [`simulation`]: start/stop/dispose lifecycle and observer bookkeeping.

mod buffer;
mod builder;
mod registry;
mod scheduler;
mod simulation;
mod snapshot;
mod worker;

pub use buffer::{BoundedBuffer, Item};
pub use builder::SimulationBuilder;
pub use simulation::Simulation;
pub use snapshot::{SimulationState, SnapshotReader};
pub use worker::{Role, Worker, WorkerState};
