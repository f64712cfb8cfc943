//! # Broadcast scheduler: fixed-cadence `Tick` notifications.
//!
//! Armed by `Simulation::start` with the run's cancellation token, it publishes
//! one [`ChangeReason::Tick`] per period until the token fires. It holds no
//! simulation state; listeners pull snapshots when they hear a tick.
//!
//! ```text
//! arm(bus, period, token) ──► loop {
//!                               select! {
//!                                 token.cancelled() ─► exit
//!                                 interval.tick()   ─► bus.publish(Tick)
//!                               }
//!                             }
//! ```
//!
//! - The first tick fires immediately.
//! - Missed ticks are skipped rather than bursted after a stall.
//! - Publishing never waits on listeners, so a failing listener cannot stall
//!   the cadence.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::{Bus, ChangeReason, StateChange};

/// Smallest accepted period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to an armed scheduler task.
#[derive(Debug)]
pub(crate) struct BroadcastScheduler {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl BroadcastScheduler {
    /// Spawns the periodic publisher. It stops when `token` is cancelled.
    pub(crate) fn arm(bus: Bus, period: Duration, token: CancellationToken) -> Self {
        let period = period.max(MIN_PERIOD);
        let t = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                select! {
                    biased;
                    _ = t.cancelled() => break,
                    _ = ticker.tick() => bus.publish(StateChange::now(ChangeReason::Tick)),
                }
            }
            debug!("broadcast scheduler disarmed");
        });

        Self { token, handle }
    }

    /// Cancels the scheduler and waits for its task to exit.
    pub(crate) async fn disarm(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}
