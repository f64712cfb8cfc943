//! # Runtime and per-run configuration.
//!
//! Two configuration layers:
//! 1. [`Config`]: runtime settings fixed when the [`Simulation`](crate::Simulation)
//!    is built (cadence, grace period, pacing, limits).
//! 2. [`SimulationConfig`]: the shape of one run, supplied to
//!    [`Simulation::start`](crate::Simulation::start) and immutable for that run.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `grace = 0s` → no wait; stragglers are aborted immediately on stop

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::BoundedBuffer;
use crate::error::ConfigError;
use crate::policies::DelayPolicy;

/// Runtime configuration for the simulation controller.
///
/// ## Field semantics
/// - `broadcast_interval`: period of the scheduler's `Tick` notifications
/// - `grace`: how long `stop` waits for workers before forcing them terminated
/// - `work`: simulated work duration per produced/consumed item
/// - `item_bound`: produced items are drawn from `0..item_bound`
/// - `bus_capacity`: state-change bus ring buffer size (min 1)
/// - `max_workers`: ceiling on producers + consumers per run
/// - `stop_when_unobserved`: stop the run when the last observer detaches
#[derive(Clone, Debug)]
pub struct Config {
    /// Fixed period between scheduler ticks while a run is active.
    pub broadcast_interval: Duration,

    /// Best-effort wait for workers to observe cancellation during `stop`.
    ///
    /// Once it elapses, remaining worker tasks are aborted and every registry
    /// entry is forced to `Terminated` regardless.
    pub grace: Duration,

    /// Simulated work delay policy used by both roles.
    pub work: DelayPolicy,

    /// Exclusive upper bound for produced item values (min 1).
    pub item_bound: u32,

    /// Capacity of the state-change broadcast channel.
    ///
    /// Receivers lagging more than this many notifications skip the oldest.
    pub bus_capacity: usize,

    /// Maximum producers + consumers accepted by a single run.
    pub max_workers: usize,

    /// Stop the active run when the last attached observer detaches.
    pub stop_when_unobserved: bool,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the item bound clamped to a minimum of 1.
    #[inline]
    pub fn item_bound_clamped(&self) -> u32 {
        self.item_bound.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `broadcast_interval = 200ms` (5 Hz)
    /// - `grace = 250ms`
    /// - `work = 800ms..2000ms`
    /// - `item_bound = 100`
    /// - `bus_capacity = 256`
    /// - `max_workers = 256`
    /// - `stop_when_unobserved = true`
    fn default() -> Self {
        Self {
            broadcast_interval: Duration::from_millis(200),
            grace: Duration::from_millis(250),
            work: DelayPolicy::default(),
            item_bound: 100,
            bus_capacity: 256,
            max_workers: 256,
            stop_when_unobserved: true,
        }
    }
}

/// Shape of one simulation run.
///
/// Serialized with the wire keys `numProducers`, `numConsumers`, `bufferSize`.
///
/// ```
/// use bufsim::SimulationConfig;
///
/// let cfg = SimulationConfig::new(2, 1, 3);
/// assert_eq!(cfg.buffer_size, 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Number of producer workers (ids `1..=num_producers`).
    pub num_producers: usize,
    /// Number of consumer workers (ids `1..=num_consumers`).
    pub num_consumers: usize,
    /// Buffer capacity (at least 1).
    pub buffer_size: usize,
}

impl SimulationConfig {
    /// Creates a run configuration.
    pub fn new(num_producers: usize, num_consumers: usize, buffer_size: usize) -> Self {
        Self {
            num_producers,
            num_consumers,
            buffer_size,
        }
    }

    /// Total number of workers this run spawns.
    #[inline]
    pub fn total_workers(&self) -> usize {
        self.num_producers.saturating_add(self.num_consumers)
    }

    /// Checks the run against the runtime limits.
    ///
    /// Zero producers or zero consumers is accepted: the buffer then never
    /// fills (or never drains) from that side.
    pub fn validate(&self, runtime: &Config) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        if self.buffer_size > BoundedBuffer::MAX_CAPACITY {
            return Err(ConfigError::BufferTooLarge {
                requested: self.buffer_size,
                max: BoundedBuffer::MAX_CAPACITY,
            });
        }
        let requested = self.total_workers();
        if requested > runtime.max_workers {
            return Err(ConfigError::TooManyWorkers {
                requested,
                max: runtime.max_workers,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_buffer_rejected() {
        let err = SimulationConfig::new(1, 1, 0)
            .validate(&Config::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroBufferSize);
    }

    #[test]
    fn test_oversized_buffer_rejected() {
        let err = SimulationConfig::new(1, 1, usize::MAX)
            .validate(&Config::default())
            .unwrap_err();
        assert_eq!(err.as_label(), "config_buffer_too_large");
    }

    #[test]
    fn test_degenerate_sides_accepted() {
        let cfg = Config::default();
        assert!(SimulationConfig::new(0, 3, 1).validate(&cfg).is_ok());
        assert!(SimulationConfig::new(3, 0, 1).validate(&cfg).is_ok());
        assert!(SimulationConfig::new(0, 0, 1).validate(&cfg).is_ok());
    }

    #[test]
    fn test_worker_ceiling() {
        let cfg = Config {
            max_workers: 4,
            ..Config::default()
        };
        assert!(SimulationConfig::new(2, 2, 1).validate(&cfg).is_ok());
        assert_eq!(
            SimulationConfig::new(3, 2, 1).validate(&cfg),
            Err(ConfigError::TooManyWorkers {
                requested: 5,
                max: 4
            })
        );
    }

    #[test]
    fn test_wire_keys() {
        let cfg: SimulationConfig =
            serde_json::from_str(r#"{"numProducers":2,"numConsumers":1,"bufferSize":3}"#)
                .unwrap();
        assert_eq!(cfg, SimulationConfig::new(2, 1, 3));
    }

    #[test]
    fn test_negative_counts_unrepresentable() {
        let res: Result<SimulationConfig, _> =
            serde_json::from_str(r#"{"numProducers":-1,"numConsumers":1,"bufferSize":3}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_clamps() {
        let cfg = Config {
            bus_capacity: 0,
            item_bound: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.item_bound_clamped(), 1);
    }
}
