//! Pacing policies.
//!
//! ## Contents
//! - [`DelayPolicy`] how long a worker "works" on each item (uniform range)
//!
//! ## Quick wiring
//! ```text
//! Config { work: DelayPolicy, .. }
//!      └─► core::worker uses:
//!           - work.next() before a producer's put / after a consumer's take
//! ```
//!
//! ## Defaults
//! - `DelayPolicy::default()` → uniform in `[800ms, 2000ms)`.

mod delay;

pub use delay::DelayPolicy;
