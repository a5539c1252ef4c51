//! Glide Animation
//!
//! Timed interpolation of a single value, sampled by a periodic ticker and
//! interruptible at any moment.
//!
//! # Features
//!
//! - **Ticker**: Periodic timestamps over a single-slot channel, missed ticks coalesce
//! - **Worker**: Drives a value from `at` to `to` over a fixed duration
//! - **Redirection**: Starting a new run tears the old one down first and
//!   continues from the live position
//! - **Run Counter**: Shared count of runs in flight, to observe convergence to idle
//! - **Easing**: Linear and exponential drive/decay curves

pub mod config;
pub mod counter;
pub mod easing;
pub mod error;
pub mod ticker;
pub mod worker;

pub use config::{RunConfig, WorkerConfig};
pub use counter::RunCounter;
pub use easing::{lerp, Easing};
pub use error::{AnimationError, Result};
pub use ticker::Ticker;
pub use worker::{Motion, RunOptions, Snapshot, UpdateFn, Worker, DEFAULT_TICK};
