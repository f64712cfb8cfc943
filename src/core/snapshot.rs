//! # Point-in-time simulation snapshots.
//!
//! [`SimulationState`] is a deep copy of everything observable about the current
//! run; it is safe to serialize or ship elsewhere without further locking.
//!
//! [`SnapshotReader`] builds snapshots. It is a cheap, clonable read handle over
//! the controller's current run, so listeners can hold one without keeping the
//! controller itself alive.
//!
//! ## Wire shape
//! ```text
//! {
//!   "buffer":    [17, 4, 98],                         // front to back
//!   "producers": [{"id":1,"state":"WAITING"}, ...],   // sorted by id
//!   "consumers": [{"id":1,"state":"RUNNING"}, ...],   // sorted by id
//!   "isRunning": true
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

use super::buffer::{BoundedBuffer, Item};
use super::registry::Registry;
use super::worker::{Role, Worker};

/// Immutable copy of the simulation's observable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Buffer contents, front to back.
    pub buffer: Vec<Item>,
    /// Producers sorted by id.
    pub producers: Vec<Worker>,
    /// Consumers sorted by id.
    pub consumers: Vec<Worker>,
    /// Whether a run is active.
    #[serde(rename = "isRunning")]
    pub is_running: bool,
}

impl SimulationState {
    /// Serializes to the JSON wire shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Resources of one run that snapshots read from.
#[derive(Debug)]
pub(crate) struct RunView {
    pub buffer: Arc<BoundedBuffer>,
    pub registry: Arc<Registry>,
}

/// Clonable read handle producing [`SimulationState`] snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReader {
    current: Arc<ArcSwapOption<RunView>>,
    running: Arc<AtomicBool>,
}

impl SnapshotReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Captures the current state.
    ///
    /// Never blocks on buffer capacity or on controller lifecycle calls. Before
    /// the first run it returns an empty, not-running state.
    pub fn snapshot(&self) -> SimulationState {
        let is_running = self.is_running();
        match self.current_view() {
            Some(view) => SimulationState {
                buffer: view.buffer.peek(),
                producers: view.registry.workers(Role::Producer),
                consumers: view.registry.workers(Role::Consumer),
                is_running,
            },
            None => SimulationState {
                is_running,
                ..SimulationState::default()
            },
        }
    }

    /// Current value of the running flag.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn running_flag(&self) -> &Arc<AtomicBool> {
        &self.running
    }

    pub(crate) fn current_view(&self) -> Option<Arc<RunView>> {
        self.current.load_full()
    }

    pub(crate) fn install(&self, view: Arc<RunView>) {
        self.current.store(Some(view));
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}
