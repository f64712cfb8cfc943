use std::sync::Arc;

use crate::{
    config::Config,
    events::Bus,
    listeners::{Listen, ListenerSet},
};

use super::{simulation::Simulation, snapshot::SnapshotReader};

/// Builder for constructing a [`Simulation`] with optional listeners.
pub struct SimulationBuilder {
    cfg: Config,
    listeners: Vec<Arc<dyn Listen>>,
    reader: SnapshotReader,
}

impl SimulationBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            listeners: Vec::new(),
            reader: SnapshotReader::new(),
        }
    }

    /// Snapshot handle of the simulation being built.
    ///
    /// Lets a listener capture state on each notification before the
    /// simulation itself exists.
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// Sets state-change listeners.
    ///
    /// Listeners receive notifications through dedicated workers with bounded
    /// mailboxes; a slow or panicking listener does not affect the others.
    pub fn with_listeners(mut self, listeners: Vec<Arc<dyn Listen>>) -> Self {
        self.listeners = listeners;
        self
    }

    /// Adds a single listener.
    pub fn with_listener(mut self, listener: Arc<dyn Listen>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Builds the simulation and spawns its notification dispatcher.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Arc<Simulation> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listeners = ListenerSet::new(self.listeners);
        Arc::new(Simulation::new_internal(
            self.cfg,
            bus,
            self.reader,
            listeners,
        ))
    }
}
