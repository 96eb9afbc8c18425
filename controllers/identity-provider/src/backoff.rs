//! Retry backoff for transient reconciliation failures.
//!
//! Transient errors requeue on a Fibonacci schedule: 5s, 5s, 10s, 15s, 25s,
//! 40s, ... capped at 300s. The sequence grows more slowly than exponential
//! backoff, which suits a reconcile loop that is already rate-limited by the
//! watch substrate. State is tracked per resource key and reset on the first
//! successful reconcile.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

const MIN_BACKOFF_SECONDS: u64 = 5;
const MAX_BACKOFF_SECONDS: u64 = 300;

/// Fibonacci backoff sequence
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min: u64,
    prev: u64,
    current: u64,
    max: u64,
}

impl FibonacciBackoff {
    /// Create a backoff sequence bounded by `min` and `max` seconds.
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min: min_seconds,
            prev: 0,
            current: min_seconds,
            max: max_seconds,
        }
    }

    /// Return the current delay and advance the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current);

        let next = self.prev + self.current;
        self.prev = self.current;
        self.current = next.min(self.max);

        delay
    }

    /// Restart the sequence from the minimum delay.
    pub fn reset(&mut self) {
        self.prev = 0;
        self.current = self.min;
    }
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(MIN_BACKOFF_SECONDS, MAX_BACKOFF_SECONDS)
    }
}

/// Per-resource retry state (resource key -> backoff sequence)
#[derive(Debug, Default)]
pub struct RetryTracker {
    states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl RetryTracker {
    /// Next retry delay for a resource, advancing its sequence.
    pub fn next_delay(&self, resource_key: &str) -> Duration {
        match self.states.lock() {
            Ok(mut states) => states
                .entry(resource_key.to_string())
                .or_default()
                .next_delay(),
            Err(e) => {
                warn!("Failed to lock retry states: {}, using minimum backoff", e);
                Duration::from_secs(MIN_BACKOFF_SECONDS)
            }
        }
    }

    /// Reset a resource's sequence after a successful reconcile.
    pub fn reset(&self, resource_key: &str) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                state.reset();
            }
        }
    }
}
