//! Poll clock and cancellable timer tasks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Counts display refresh ticks. Carries no data beyond the count.
#[derive(Debug, Clone)]
pub struct PollClock {
    interval: Duration,
    ticks: u64,
}

impl PollClock {
    pub fn new(interval: Duration) -> Self {
        Self { interval, ticks: 0 }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register one refresh tick.
    pub fn tick(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// A task that runs `action` every `period`, first after one full period.
///
/// The task is aborted on [`cancel`](Self::cancel) or drop. Must be created
/// inside a Tokio runtime.
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    pub fn spawn<F>(name: &'static str, period: Duration, mut action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                action();
            }
        });

        debug!(task = name, period_ms = period.as_millis() as u64, "Periodic task started");
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!(task = self.name, "Periodic task cancelled");
        }
        self.handle.abort();
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A task that runs `action` once after `delay` unless cancelled first.
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    pub fn spawn<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
