//! Shared in-flight run counter
//!
//! A [`RunCounter`] is injected into a [`Worker`](crate::Worker) by the
//! caller. Every staged run increments it and every finalized run
//! decrements it, so once all activity settles the counter returns to the
//! value it held before the first run was requested.

use std::sync::Arc;

use tokio::sync::watch;

/// Thread-safe counter of requested-but-not-finalized runs
///
/// Clones share the same count.
#[derive(Clone, Debug)]
pub struct RunCounter {
    value: Arc<watch::Sender<i64>>,
}

impl RunCounter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter with an initial value
    pub fn starting_at(initial: i64) -> Self {
        let (value, _) = watch::channel(initial);
        Self {
            value: Arc::new(value),
        }
    }

    /// Current count
    pub fn get(&self) -> i64 {
        *self.value.borrow()
    }

    /// Increment and return the new count
    pub fn increment(&self) -> i64 {
        self.add(1)
    }

    /// Decrement and return the new count
    pub fn decrement(&self) -> i64 {
        self.add(-1)
    }

    fn add(&self, delta: i64) -> i64 {
        let mut updated = 0;
        self.value.send_modify(|n| {
            *n += delta;
            updated = *n;
        });
        updated
    }

    /// Wait until the count equals `target`
    ///
    /// Returns immediately if it already does.
    pub async fn wait_until(&self, target: i64) {
        let mut rx = self.value.subscribe();
        // The sender lives in `self`, so this cannot observe a closed channel
        let _ = rx.wait_for(|n| *n == target).await;
    }

    /// Wait until no runs are in flight (count reaches zero)
    pub async fn settled(&self) {
        self.wait_until(0).await;
    }
}

impl Default for RunCounter {
    fn default() -> Self {
        Self::new()
    }
}
