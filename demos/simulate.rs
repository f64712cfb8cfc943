//! # Example: simulate
//!
//! Runs a small producer/consumer simulation and logs every state change.
//!
//! Demonstrates how to:
//! - Attach the built-in [`LogWriter`] listener through the builder's reader.
//! - Start a run, let it reach steady state, and inspect a snapshot.
//! - Replace the run with a different shape, then stop and dispose.
//!
//! ## Flow
//! ```text
//! Simulation::builder(cfg)
//!     ├─► with_listener(LogWriter)
//!     ├─► start(2 producers, 1 consumer, buffer 3)
//!     │     └─► Tick every 200ms ─► LogWriter logs the snapshot
//!     ├─► start(1 producer, 3 consumers, buffer 5)   (replaces the run)
//!     ├─► stop()  ─► Stopped
//!     └─► dispose()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=bufsim=debug cargo run --example simulate --features logging
//! ```

use std::{sync::Arc, time::Duration};

use bufsim::{Config, DelayPolicy, LogWriter, Simulation, SimulationConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config {
        work: DelayPolicy::new(Duration::from_millis(100), Duration::from_millis(400)),
        ..Config::default()
    };
    let builder = Simulation::builder(cfg);
    let writer = Arc::new(LogWriter::new(builder.reader()));
    let sim = builder.with_listener(writer).build();

    sim.attach_observer()?;
    sim.start(SimulationConfig::new(2, 1, 3)).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("{}", sim.snapshot().to_json()?);

    sim.start(SimulationConfig::new(1, 3, 5)).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    sim.stop().await?;
    println!("{}", sim.snapshot().to_json()?);

    sim.dispose().await;
    Ok(())
}
