//! Serializable worker and run configuration
//!
//! These mirror [`RunOptions`] for the parts that can be expressed in a
//! config file. Update callbacks and custom curves are code-only.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::worker::{RunOptions, DEFAULT_TICK};

/// Worker-level settings
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct WorkerConfig {
    /// Default sampling interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK.as_millis() as u64
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// A single run: where to go, how long to take, and which curve to follow
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunConfig {
    /// Target value
    pub to: f64,
    /// Jump to this value before running instead of continuing from the
    /// current position
    #[serde(default)]
    pub from: Option<f64>,
    /// Run duration in milliseconds; zero completes instantly
    #[serde(default)]
    pub duration_ms: u64,
    /// Sampling interval override in milliseconds
    #[serde(default)]
    pub tick_ms: Option<u64>,
    #[serde(default)]
    pub easing: Easing,
}

impl RunConfig {
    /// Convert into options for [`Worker::start`](crate::Worker::start)
    pub fn to_options(&self) -> RunOptions {
        let mut options = RunOptions::new()
            .to(self.to)
            .duration(Duration::from_millis(self.duration_ms))
            .easing(self.easing);
        if let Some(from) = self.from {
            options = options.from(from);
        }
        if let Some(tick_ms) = self.tick_ms {
            options = options.tick(Duration::from_millis(tick_ms));
        }
        options
    }
}
