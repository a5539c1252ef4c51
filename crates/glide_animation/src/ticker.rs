//! Periodic ticker
//!
//! A [`Ticker`] emits the current timestamp at a fixed interval until it is
//! stopped. Ticks are delivered through a single-slot channel: when the
//! previous tick has not been consumed yet the new one is dropped, so a slow
//! consumer sees coalesced ticks instead of a backlog.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{AnimationError, Result};

/// Emits timestamps every `period` until stopped
///
/// Must be created from within a Tokio runtime.
#[derive(Debug)]
pub struct Ticker {
    rx: mpsc::Receiver<Instant>,
    /// Keeps the output open after the timer task is gone
    _tx: mpsc::Sender<Instant>,
    task: JoinHandle<()>,
    period: Duration,
}

impl Ticker {
    /// Start a ticker that fires every `period`
    ///
    /// Fails with [`AnimationError::InvalidTickInterval`] if `period` is zero.
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(AnimationError::InvalidTickInterval(period));
        }

        let (tx, rx) = mpsc::channel(1);
        let timer_tx = tx.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                // Full slot: the consumer hasn't caught up, drop this tick
                let _ = timer_tx.try_send(Instant::now());
            }
        });

        Ok(Self {
            rx,
            _tx: tx,
            task,
            period,
        })
    }

    /// Wait for the next tick
    ///
    /// After [`stop`](Self::stop) this only yields a tick that was already
    /// buffered; otherwise it waits forever.
    pub async fn tick(&mut self) -> Instant {
        match self.rx.recv().await {
            Some(now) => now,
            // Unreachable while `_tx` is held, but never report a fake tick
            None => std::future::pending().await,
        }
    }

    /// Stop generating ticks. The output stays open.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
