//! # Worker registry - last observed state of every worker in a run.
//!
//! One concurrent map per role, keyed by worker id:
//!
//! ```text
//! producer 1 ──set──► ┌───────────────────────────┐
//! producer 2 ──set──► │ producers: DashMap<id, W> │ ──► snapshot (sorted copy)
//! consumer 1 ──set──► │ consumers: DashMap<id, W> │ ──► stop (terminate_all)
//!                     └───────────────────────────┘
//! ```
//!
//! ## Rules
//! - Each entry has a single writer: the worker owning the [`WorkerSlot`].
//!   The only exception is [`Registry::terminate_all`] during stop.
//! - `Terminated` is absorbing: once an entry is terminated, later writes are
//!   rejected, so no snapshot can observe a worker coming back to life.
//! - Readers see whole [`Worker`] values (entries are replaced under the shard lock).
//! - A fresh registry is built for every run; runs never share one.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::worker::{Role, Worker, WorkerState};

/// Concurrent id → [`Worker`] maps for both roles.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    producers: DashMap<usize, Worker>,
    consumers: DashMap<usize, Worker>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, role: Role) -> &DashMap<usize, Worker> {
        match role {
            Role::Producer => &self.producers,
            Role::Consumer => &self.consumers,
        }
    }

    /// Inserts worker `id` in [`WorkerState::Running`].
    ///
    /// Returns `false` and leaves the entry alone if `id` is already registered.
    pub fn register(&self, role: Role, id: usize) -> bool {
        match self.map(role).entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(Worker::new(id));
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Updates the state of an existing entry.
    ///
    /// Returns `false` if the entry is unknown or already terminated.
    pub fn set(&self, role: Role, id: usize, state: WorkerState) -> bool {
        match self.map(role).get_mut(&id) {
            Some(mut entry) if !entry.state.is_terminal() => {
                entry.state = state;
                true
            }
            _ => false,
        }
    }

    /// Forces every entry of both roles into [`WorkerState::Terminated`].
    ///
    /// Returns how many entries changed.
    pub fn terminate_all(&self) -> usize {
        let mut changed = 0;
        for map in [&self.producers, &self.consumers] {
            for mut entry in map.iter_mut() {
                if !entry.state.is_terminal() {
                    entry.state = WorkerState::Terminated;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Returns a copy of all workers of `role`, sorted by id.
    pub fn workers(&self, role: Role) -> Vec<Worker> {
        let mut out: Vec<Worker> = self.map(role).iter().map(|entry| *entry.value()).collect();
        out.sort_unstable_by_key(|w| w.id);
        out
    }
}

#[cfg(test)]
impl Registry {
    /// Returns the current state of one worker.
    pub fn get(&self, role: Role, id: usize) -> Option<WorkerState> {
        self.map(role).get(&id).map(|entry| entry.state)
    }

    /// Number of registered workers of `role`.
    pub fn len(&self, role: Role) -> usize {
        self.map(role).len()
    }

    /// True if no workers of either role are registered.
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty() && self.consumers.is_empty()
    }

    /// Number of workers of `role` currently in `state`.
    pub fn count(&self, role: Role, state: WorkerState) -> usize {
        self.map(role).iter().filter(|e| e.state == state).count()
    }
}

/// Write handle for exactly one registry entry.
///
/// Handed to the worker that owns the entry; it is the only way a worker loop
/// touches the registry.
#[derive(Debug, Clone)]
pub(crate) struct WorkerSlot {
    registry: Arc<Registry>,
    role: Role,
    id: usize,
}

impl WorkerSlot {
    /// Registers worker `id` in `Running` and returns its slot.
    ///
    /// Ids are unique per run; an existing entry keeps its state.
    pub fn register(registry: Arc<Registry>, role: Role, id: usize) -> Self {
        registry.register(role, id);
        Self { registry, role, id }
    }

    /// Worker role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Worker id (unique within its role).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Publishes a new state for this worker (ignored once terminated).
    pub fn set(&self, state: WorkerState) -> bool {
        self.registry.set(self.role, self.id, state)
    }

    /// Moves this worker to `Terminated`. Returns `false` if it already was.
    pub fn terminate(&self) -> bool {
        self.set(WorkerState::Terminated)
    }
}

#[cfg(test)]
impl WorkerSlot {
    /// Last published state.
    pub fn state(&self) -> Option<WorkerState> {
        self.registry.get(self.role, self.id)
    }
}
