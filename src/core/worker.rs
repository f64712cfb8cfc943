//! # Worker: one producer or consumer loop.
//!
//! Both roles share one state machine and differ only in where the blocking
//! buffer call sits relative to the simulated work:
//!
//! ```text
//! producer:                              consumer:
//! loop {                                 loop {
//!   ├─► active? else exit                  ├─► active? else exit
//!   ├─► Running                            ├─► Waiting
//!   ├─► sleep(work) (cancellable)          ├─► item = buffer.take() (may block)
//!   ├─► item = random                      ├─► Running
//!   ├─► Waiting                            └─► sleep(work) (cancellable)
//!   └─► buffer.put(item) (may block)     }
//! }
//!
//! on exit (return, fault, panic, abort): TerminateOnDrop ─► Terminated
//! ```
//!
//! ## Exit conditions
//! - run token cancelled or running flag cleared → graceful (debug log)
//! - buffer fault (closed) → error log
//! - panic inside the loop → caught, error log
//!
//! In every case the slot is moved to `Terminated` exactly once, and no buffer
//! operation follows.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::buffer::BoundedBuffer;
use super::registry::WorkerSlot;
use crate::error::WorkerError;
use crate::policies::DelayPolicy;

/// Which side of the buffer a worker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Puts items into the buffer.
    Producer,
    /// Takes items out of the buffer.
    Consumer,
}

impl Role {
    /// Returns a short stable label for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Consumer => "consumer",
        }
    }
}

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    /// Doing simulated work.
    Running,
    /// About to block, or blocked, on the buffer.
    Waiting,
    /// Finished; never changes again.
    Terminated,
}

impl WorkerState {
    /// True for [`WorkerState::Terminated`].
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Terminated)
    }
}

/// Observable worker record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Id, unique within the role, starting at 1.
    pub id: usize,
    /// Last published state.
    pub state: WorkerState,
}

impl Worker {
    /// A freshly spawned worker.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: WorkerState::Running,
        }
    }
}

/// Shared run resources handed to every worker.
#[derive(Clone)]
pub(crate) struct WorkerCtx {
    pub buffer: Arc<BoundedBuffer>,
    pub running: Arc<AtomicBool>,
    pub work: DelayPolicy,
    pub item_bound: u32,
}

impl WorkerCtx {
    fn is_active(&self, token: &CancellationToken) -> bool {
        !token.is_cancelled() && self.running.load(Ordering::Acquire)
    }
}

/// Marks the slot terminated when dropped, whichever way the loop ends.
struct TerminateOnDrop<'a>(&'a WorkerSlot);

impl Drop for TerminateOnDrop<'_> {
    fn drop(&mut self) {
        self.0.terminate();
    }
}

/// Runs one worker until cancellation or fault.
pub(crate) async fn run(slot: WorkerSlot, ctx: WorkerCtx, token: CancellationToken) {
    let body = async {
        match slot.role() {
            Role::Producer => produce(&slot, &ctx, &token).await,
            Role::Consumer => consume(&slot, &ctx, &token).await,
        }
    };
    supervise(&slot, body).await;
}

/// Drives `body` and moves `slot` to `Terminated` however it ends.
async fn supervise<F>(slot: &WorkerSlot, body: F)
where
    F: Future<Output = Result<(), WorkerError>>,
{
    let _terminate = TerminateOnDrop(slot);
    let role = slot.role().as_label();
    let id = slot.id();

    match std::panic::AssertUnwindSafe(body).catch_unwind().await {
        Ok(Ok(())) => debug!(role, id, "worker stopped"),
        Ok(Err(e)) => error!(role, id, error = %e, label = e.as_label(), "worker fault"),
        Err(panic_err) => {
            let info = panic_err
                .downcast_ref::<&'static str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_err.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(role, id, info = %info, "worker panicked");
        }
    }
}

async fn produce(
    slot: &WorkerSlot,
    ctx: &WorkerCtx,
    token: &CancellationToken,
) -> Result<(), WorkerError> {
    while ctx.is_active(token) {
        slot.set(WorkerState::Running);
        if !pause(ctx.work.next(), token).await {
            break;
        }

        let item = rand::rng().random_range(0..ctx.item_bound.max(1));

        slot.set(WorkerState::Waiting);
        match ctx.buffer.put(item, token).await {
            Ok(()) => info!(role = "producer", id = slot.id(), item, "produced"),
            Err(e) if e.is_cancelled() => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn consume(
    slot: &WorkerSlot,
    ctx: &WorkerCtx,
    token: &CancellationToken,
) -> Result<(), WorkerError> {
    while ctx.is_active(token) {
        slot.set(WorkerState::Waiting);
        let item = match ctx.buffer.take(token).await {
            Ok(item) => item,
            Err(e) if e.is_cancelled() => break,
            Err(e) => return Err(e.into()),
        };

        slot.set(WorkerState::Running);
        info!(role = "consumer", id = slot.id(), item, "consumed");
        if !pause(ctx.work.next(), token).await {
            break;
        }
    }
    Ok(())
}

/// Sleeps for `d`; returns `false` if `token` fired first.
async fn pause(d: Duration, token: &CancellationToken) -> bool {
    let sleep = time::sleep(d);
    tokio::pin!(sleep);
    select! {
        biased;
        _ = token.cancelled() => false,
        _ = &mut sleep => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Registry;

    fn ctx(capacity: usize, work: Duration) -> WorkerCtx {
        WorkerCtx {
            buffer: Arc::new(BoundedBuffer::new(capacity).unwrap()),
            running: Arc::new(AtomicBool::new(true)),
            work: DelayPolicy::constant(work),
            item_bound: 100,
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&WorkerState::Terminated).unwrap(),
            r#""TERMINATED""#
        );
        assert_eq!(
            serde_json::to_string(&Worker::new(4)).unwrap(),
            r#"{"id":4,"state":"RUNNING"}"#
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_producer_blocks_waiting_on_full_buffer() {
        let reg = Arc::new(Registry::new());
        let slot = WorkerSlot::register(reg.clone(), Role::Producer, 1);
        let ctx = ctx(2, Duration::from_millis(1));
        let buffer = ctx.buffer.clone();
        let token = CancellationToken::new();

        let handle = tokio::spawn(run(slot, ctx, token.clone()));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(buffer.len(), 2);
        assert!(buffer.peek().iter().all(|&x| x < 100));
        assert_eq!(reg.get(Role::Producer, 1), Some(WorkerState::Waiting));

        token.cancel();
        handle.await.unwrap();
        assert_eq!(reg.get(Role::Producer, 1), Some(WorkerState::Terminated));
        assert_eq!(buffer.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_consumer_waits_on_empty_buffer() {
        let reg = Arc::new(Registry::new());
        let slot = WorkerSlot::register(reg.clone(), Role::Consumer, 1);
        let ctx = ctx(1, Duration::from_millis(1));
        let buffer = ctx.buffer.clone();
        let token = CancellationToken::new();

        let handle = tokio::spawn(run(slot, ctx, token.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(reg.get(Role::Consumer, 1), Some(WorkerState::Waiting));

        buffer.try_put(11).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(buffer.is_empty());

        token.cancel();
        handle.await.unwrap();
        assert_eq!(reg.get(Role::Consumer, 1), Some(WorkerState::Terminated));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_running_flag_stops_loop() {
        let reg = Arc::new(Registry::new());
        let slot = WorkerSlot::register(reg.clone(), Role::Producer, 1);
        let ctx = ctx(1000, Duration::from_millis(1));
        let running = ctx.running.clone();

        let handle = tokio::spawn(run(slot, ctx, CancellationToken::new()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        running.store(false, Ordering::Release);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker did not observe running flag")
            .unwrap();
        assert_eq!(reg.get(Role::Producer, 1), Some(WorkerState::Terminated));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_closed_buffer_terminates_only_that_worker() {
        let reg = Arc::new(Registry::new());
        let ctx = ctx(1, Duration::from_millis(1));
        let token = CancellationToken::new();

        let consumer = tokio::spawn(run(
            WorkerSlot::register(reg.clone(), Role::Consumer, 1),
            ctx.clone(),
            token.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;

        ctx.buffer.close();
        consumer.await.unwrap();
        assert_eq!(reg.get(Role::Consumer, 1), Some(WorkerState::Terminated));
        assert!(!token.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_terminates_only_that_worker() {
        let reg = Arc::new(Registry::new());
        let ctx = ctx(4, Duration::from_millis(1));
        let buffer = ctx.buffer.clone();
        let token = CancellationToken::new();

        let sibling = tokio::spawn(run(
            WorkerSlot::register(reg.clone(), Role::Producer, 1),
            ctx,
            token.clone(),
        ));
        let doomed = WorkerSlot::register(reg.clone(), Role::Producer, 2);
        let crashed = tokio::spawn(async move {
            supervise(&doomed, async {
                doomed.set(WorkerState::Waiting);
                if doomed.id() == 2 {
                    panic!("injected failure");
                }
                Ok::<(), WorkerError>(())
            })
            .await;
        });

        // The panic is caught inside the task; the join succeeds.
        crashed.await.unwrap();
        assert_eq!(reg.get(Role::Producer, 2), Some(WorkerState::Terminated));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!reg.get(Role::Producer, 1).unwrap().is_terminal());
        assert_eq!(buffer.len(), 4);
        assert!(!token.is_cancelled());

        token.cancel();
        sibling.await.unwrap();
        assert_eq!(reg.get(Role::Producer, 1), Some(WorkerState::Terminated));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_abort_still_terminates() {
        let reg = Arc::new(Registry::new());
        let slot = WorkerSlot::register(reg.clone(), Role::Producer, 2);
        let ctx = ctx(1, Duration::from_secs(60));

        let handle = tokio::spawn(run(slot, ctx, CancellationToken::new()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(reg.get(Role::Producer, 2), Some(WorkerState::Running));

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(reg.get(Role::Producer, 2), Some(WorkerState::Terminated));
    }
}
