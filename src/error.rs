//! Error types used by the simulation runtime.
//!
//! - [`ConfigError`] - a [`SimulationConfig`](crate::SimulationConfig) was rejected.
//! - [`BufferError`] - a bounded-buffer operation did not complete.
//! - [`WorkerError`] - a worker loop ended through a fault path.
//! - [`SimulationError`] - errors returned to callers of the controller.
//! - [`CommandError`] - an inbound command could not be decoded.
//!
//! Every type provides `as_label` (stable snake_case string) for logs.

use thiserror::Error;

/// # Errors produced while validating a run configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The buffer must hold at least one item.
    #[error("buffer size must be at least 1")]
    ZeroBufferSize,

    /// The buffer is larger than the runtime can account for.
    #[error("buffer size {requested} exceeds the maximum of {max}")]
    BufferTooLarge {
        /// Requested capacity.
        requested: usize,
        /// Largest supported capacity.
        max: usize,
    },

    /// More workers were requested than the runtime allows.
    #[error("{requested} workers requested; at most {max} allowed")]
    TooManyWorkers {
        /// Producers plus consumers requested.
        requested: usize,
        /// Configured ceiling (`Config::max_workers`).
        max: usize,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroBufferSize => "config_zero_buffer_size",
            ConfigError::BufferTooLarge { .. } => "config_buffer_too_large",
            ConfigError::TooManyWorkers { .. } => "config_too_many_workers",
        }
    }
}

/// # Errors produced by [`BoundedBuffer`](crate::BoundedBuffer) operations.
///
/// `Cancelled` is not a fault: it is how a blocked `put`/`take` unwinds when the
/// caller's token fires. Use [`BufferError::is_cancelled`] to tell them apart.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// A buffer cannot be created with zero capacity.
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,

    /// Requested capacity exceeds [`BoundedBuffer::MAX_CAPACITY`](crate::BoundedBuffer::MAX_CAPACITY).
    #[error("buffer capacity exceeds the supported maximum")]
    CapacityTooLarge,

    /// The caller's cancellation token fired before the operation completed.
    #[error("buffer operation cancelled")]
    Cancelled,

    /// The buffer was closed; no further items move through it.
    #[error("buffer closed")]
    Closed,
}

impl BufferError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use bufsim::BufferError;
    ///
    /// assert_eq!(BufferError::Closed.as_label(), "buffer_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BufferError::ZeroCapacity => "buffer_zero_capacity",
            BufferError::CapacityTooLarge => "buffer_capacity_too_large",
            BufferError::Cancelled => "buffer_cancelled",
            BufferError::Closed => "buffer_closed",
        }
    }

    /// True for cooperative cancellation, false for genuine faults.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BufferError::Cancelled)
    }
}

/// # Faults that end a worker loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// A buffer operation failed with something other than cancellation.
    #[error("buffer fault: {0}")]
    Buffer(#[from] BufferError),
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Buffer(e) => e.as_label(),
        }
    }
}

/// # Errors returned by the [`Simulation`](crate::Simulation) controller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// The requested configuration was rejected before anything was spawned.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The run's buffer could not be created.
    #[error("buffer setup failed: {0}")]
    Buffer(#[from] BufferError),

    /// The controller was disposed and accepts no further commands.
    #[error("simulation disposed")]
    Disposed,
}

impl SimulationError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use bufsim::SimulationError;
    ///
    /// assert_eq!(SimulationError::Disposed.as_label(), "simulation_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SimulationError::InvalidConfig(e) => e.as_label(),
            SimulationError::Buffer(e) => e.as_label(),
            SimulationError::Disposed => "simulation_disposed",
        }
    }
}

/// # Errors produced while decoding an inbound [`Command`](crate::Command).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// Payload was not a well-formed command.
    #[error("malformed command: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CommandError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CommandError::Decode(_) => "command_malformed",
        }
    }
}
