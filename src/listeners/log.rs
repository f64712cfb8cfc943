//! # Logging listener for debugging and demos.
//!
//! [`LogWriter`] emits one `tracing` record per notification with a compact
//! summary of the current snapshot.
//!
//! ## Output format
//! ```text
//! INFO state change reason="started" seq=1 buffer=0 items=[] producers=2 consumers=1 waiting=0 running=true
//! INFO state change reason="tick" seq=2 buffer=3 items=[17, 4, 98] producers=2 consumers=1 waiting=2 running=true
//! INFO state change reason="stopped" seq=9 buffer=3 items=[17, 4, 98] producers=2 consumers=1 waiting=0 running=false
//! ```

use async_trait::async_trait;
use tracing::info;

use crate::core::{SnapshotReader, WorkerState};
use crate::events::StateChange;

use super::Listen;

/// Logs every state change through `tracing`.
///
/// Enabled via the `logging` feature. Build it from
/// [`SimulationBuilder::reader`](crate::SimulationBuilder::reader).
pub struct LogWriter {
    reader: SnapshotReader,
}

impl LogWriter {
    /// Creates a writer that summarizes snapshots from `reader`.
    pub fn new(reader: SnapshotReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Listen for LogWriter {
    async fn on_state_change(&self, change: &StateChange) {
        let state = self.reader.snapshot();
        let waiting = state
            .producers
            .iter()
            .chain(&state.consumers)
            .filter(|w| w.state == WorkerState::Waiting)
            .count();
        info!(
            reason = change.reason.as_label(),
            seq = change.seq,
            buffer = state.buffer.len(),
            items = ?state.buffer,
            producers = state.producers.len(),
            consumers = state.consumers.len(),
            waiting,
            running = state.is_running,
            "state change"
        );
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
