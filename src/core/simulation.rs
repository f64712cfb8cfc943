//! # Simulation: owns the current run and drives its lifecycle.
//!
//! The [`Simulation`] owns the state-change [`Bus`], the listener dispatcher and
//! at most one active run (buffer, registry, worker tasks, scheduler).
//!
//! ## Key responsibilities
//! - **start**: validate, replace any active run, spawn workers, arm the scheduler
//! - **stop**: cancel, wait up to [`Config::grace`], force every worker terminated,
//!   announce the final state
//! - **snapshot**: lock-free point-in-time copy via [`SnapshotReader`]
//! - **observers**: attach/detach bookkeeping with immediate notifications
//!
//! ## High-level architecture
//! ```text
//! start(cfg):
//!   [active run?] ──► shutdown_run(old)             (full stop sequence)
//!   BoundedBuffer::new(cfg.buffer_size)
//!   Registry::new() + register producers 1..=N, consumers 1..=M (Running)
//!   reader.install(view); running = true
//!   run_token = runtime_token.child_token()
//!   JoinSet.spawn(worker::run(slot, ctx, run_token))  (one per worker)
//!   bus.publish(Started)
//!   BroadcastScheduler::arm(bus, interval, run_token)
//!
//! stop():
//!   running = false; run_token.cancel()
//!   timeout(grace, join all workers)
//!     ├─ Ok      → all stopped within grace
//!     └─ Elapsed → abort stragglers
//!   scheduler.disarm(); buffer.close(); registry.terminate_all()
//!   bus.publish(Stopped)
//!
//! Bus ──► dispatcher ──► ListenerSet::emit(&StateChange)
//! ```
//!
//! Lifecycle calls (`start`, `stop`, `dispose`) are serialized by an async mutex.
//! `snapshot` never takes it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::buffer::BoundedBuffer;
use super::builder::SimulationBuilder;
use super::registry::{Registry, WorkerSlot};
use super::scheduler::BroadcastScheduler;
use super::snapshot::{RunView, SimulationState, SnapshotReader};
use super::worker::{self, Role, WorkerCtx};
use crate::command::Command;
use crate::config::{Config, SimulationConfig};
use crate::error::SimulationError;
use crate::events::{Bus, ChangeReason, StateChange};
use crate::listeners::ListenerSet;

/// Resources owned by the active run.
struct ActiveRun {
    token: CancellationToken,
    workers: JoinSet<()>,
    scheduler: BroadcastScheduler,
    view: Arc<RunView>,
}

/// Bounded-buffer producer/consumer simulation controller.
///
/// Build one with [`Simulation::builder`] inside a tokio runtime.
pub struct Simulation {
    cfg: Config,
    bus: Bus,
    reader: SnapshotReader,
    active: AsyncMutex<Option<ActiveRun>>,
    observers: AtomicUsize,
    disposed: AtomicBool,
    runtime_token: CancellationToken,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Simulation {
    /// Returns a builder for configuring listeners.
    pub fn builder(cfg: Config) -> SimulationBuilder {
        SimulationBuilder::new(cfg)
    }

    /// Builds a simulation without listeners.
    pub fn new(cfg: Config) -> Arc<Self> {
        SimulationBuilder::new(cfg).build()
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        reader: SnapshotReader,
        listeners: ListenerSet,
    ) -> Self {
        let runtime_token = CancellationToken::new();
        let dispatcher = spawn_dispatcher(&bus, listeners, runtime_token.clone());
        Self {
            cfg,
            bus,
            reader,
            active: AsyncMutex::new(None),
            observers: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            runtime_token,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Starts a run, replacing any active one.
    ///
    /// Returns once all workers are spawned; they run until [`stop`](Self::stop).
    pub async fn start(&self, run: SimulationConfig) -> Result<(), SimulationError> {
        self.ensure_live()?;
        run.validate(&self.cfg)?;

        let mut active = self.active.lock().await;
        self.ensure_live()?;
        if let Some(previous) = active.take() {
            info!("replacing active simulation");
            self.shutdown_run(previous).await;
        }

        info!(
            producers = run.num_producers,
            consumers = run.num_consumers,
            buffer_size = run.buffer_size,
            "starting simulation"
        );

        let buffer = Arc::new(BoundedBuffer::new(run.buffer_size)?);
        let registry = Arc::new(Registry::new());
        let producers: Vec<WorkerSlot> = (1..=run.num_producers)
            .map(|id| WorkerSlot::register(registry.clone(), Role::Producer, id))
            .collect();
        let consumers: Vec<WorkerSlot> = (1..=run.num_consumers)
            .map(|id| WorkerSlot::register(registry.clone(), Role::Consumer, id))
            .collect();

        let view = Arc::new(RunView {
            buffer: buffer.clone(),
            registry,
        });
        self.reader.install(view.clone());
        self.reader.set_running(true);

        let token = self.runtime_token.child_token();
        let ctx = WorkerCtx {
            buffer,
            running: self.reader.running_flag().clone(),
            work: self.cfg.work,
            item_bound: self.cfg.item_bound_clamped(),
        };

        let mut workers = JoinSet::new();
        for slot in producers.into_iter().chain(consumers) {
            workers.spawn(worker::run(slot, ctx.clone(), token.clone()));
        }
        // Started goes out before the scheduler's first tick.
        self.bus.publish(StateChange::now(ChangeReason::Started));
        let scheduler =
            BroadcastScheduler::arm(self.bus.clone(), self.cfg.broadcast_interval, token.clone());

        *active = Some(ActiveRun {
            token,
            workers,
            scheduler,
            view,
        });
        Ok(())
    }

    /// Stops the active run. No-op if none is active.
    ///
    /// When this returns, every worker of the run is `Terminated`, the running
    /// flag is clear, and a `Stopped` notification has been published. The
    /// buffer is closed with its contents left in place for the final snapshot.
    pub async fn stop(&self) -> Result<(), SimulationError> {
        self.ensure_live()?;
        let mut active = self.active.lock().await;
        if let Some(run) = active.take() {
            self.shutdown_run(run).await;
        }
        Ok(())
    }

    /// Returns the current [`SimulationState`].
    pub fn snapshot(&self) -> SimulationState {
        self.reader.snapshot()
    }

    /// Returns a clonable snapshot handle for listeners.
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// True while a run is active.
    pub fn is_running(&self) -> bool {
        self.reader.is_running()
    }

    /// Subscribes to raw state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.bus.subscribe()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Applies a decoded transport command.
    pub async fn apply(&self, command: Command) -> Result<(), SimulationError> {
        debug!(action = command.as_label(), "command received");
        match command {
            Command::Start { config } => self.start(config).await,
            Command::Stop => self.stop().await,
        }
    }

    /// Records a new observer and triggers an immediate notification.
    ///
    /// Returns the number of attached observers.
    pub fn attach_observer(&self) -> Result<usize, SimulationError> {
        self.ensure_live()?;
        let count = self.observers.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(observers = count, "observer attached");
        self.bus
            .publish(StateChange::now(ChangeReason::ObserverAttached));
        Ok(count)
    }

    /// Records an observer leaving.
    ///
    /// If it was the last one and [`Config::stop_when_unobserved`] is set, the
    /// active run is stopped. Returns the number of remaining observers.
    pub async fn detach_observer(&self) -> Result<usize, SimulationError> {
        self.ensure_live()?;
        let prev = self
            .observers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        let count = prev.saturating_sub(1);
        debug!(observers = count, "observer detached");
        self.bus
            .publish(StateChange::now(ChangeReason::ObserverDetached));

        if prev > 0 && count == 0 && self.cfg.stop_when_unobserved {
            info!("last observer detached; stopping simulation");
            self.stop().await?;
        }
        Ok(count)
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.observers.load(Ordering::Acquire)
    }

    /// Stops any active run and shuts down notification delivery.
    ///
    /// Idempotent. Afterwards, lifecycle calls return [`SimulationError::Disposed`];
    /// [`snapshot`](Self::snapshot) keeps returning the final state.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        {
            let mut active = self.active.lock().await;
            if let Some(run) = active.take() {
                self.shutdown_run(run).await;
            }
        }
        self.runtime_token.cancel();

        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = dispatcher {
            let _ = handle.await;
        }
        info!("simulation disposed");
    }

    /// True once [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<(), SimulationError> {
        if self.is_disposed() {
            Err(SimulationError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Full stop sequence for one run. Caller holds the `active` lock.
    async fn shutdown_run(&self, mut run: ActiveRun) {
        info!("stopping simulation");
        self.reader.set_running(false);
        run.token.cancel();

        let grace = self.cfg.grace;
        let workers = &mut run.workers;
        let joined = time::timeout(grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await;
        match joined {
            Ok(()) => debug!(?grace, "all workers stopped within grace"),
            Err(_elapsed) => {
                warn!(?grace, stuck = run.workers.len(), "grace exceeded; aborting workers");
                run.workers.abort_all();
            }
        }

        run.scheduler.disarm().await;
        run.view.buffer.close();
        let forced = run.view.registry.terminate_all();
        if forced > 0 {
            debug!(forced, "forced workers to terminated");
        }
        self.bus.publish(StateChange::now(ChangeReason::Stopped));
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

/// Forwards bus notifications to the listener set until `token` fires.
fn spawn_dispatcher(bus: &Bus, listeners: ListenerSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(change) => listeners.emit(&change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "listener dispatcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        listeners.shutdown().await;
    })
}
