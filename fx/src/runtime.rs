//! Timer-driven host for a [`Calculator`].
//!
//! Owns the two periodic tasks (live rate, display poll) and the one-shot
//! advisory clear. All access to the calculator goes through one mutex, so
//! ticks and user commands apply strictly in arrival order. Every change is
//! published to subscribers as a fresh [`Snapshot`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use fxcalc_common::{ConversionDirection, Rate};

use crate::clock::{DelayedTask, PeriodicTask};
use crate::engine::{Calculator, Snapshot};
use crate::error::{FxError, FxResult};
use crate::mode::SwitchOutcome;

/// Runtime lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Created, timers not yet running.
    Idle,
    /// Timers running.
    Running,
    /// Timers cancelled; cannot be restarted.
    Stopped,
}

struct Shared {
    calculator: Mutex<Calculator>,
    state: RwLock<RuntimeState>,
    updates: watch::Sender<Snapshot>,
    advisory_timer: Mutex<Option<(u64, DelayedTask)>>,
    advisory_ttl: Duration,
}

impl Shared {
    /// Mutate the calculator and publish the result.
    ///
    /// The calculator lock is held until the snapshot is sent, so snapshots
    /// are published in the order the changes were applied.
    fn apply<R>(self: &Arc<Self>, f: impl FnOnce(&mut Calculator) -> R) -> R {
        let mut calculator = self.calculator.lock();
        let result = f(&mut calculator);
        let snapshot = calculator.snapshot();

        self.sync_advisory_timer(snapshot.advisory.as_ref().map(|a| a.generation));
        self.updates.send_replace(snapshot);
        result
    }

    /// Schedule a clear for an advisory raised before the timers started.
    fn resync_advisory(self: &Arc<Self>) {
        let calculator = self.calculator.lock();
        self.sync_advisory_timer(calculator.advisory().map(|a| a.generation));
    }

    /// Keep exactly one pending clear, for the advisory currently showing.
    ///
    /// Callers hold the calculator lock.
    fn sync_advisory_timer(self: &Arc<Self>, generation: Option<u64>) {
        let mut timer = self.advisory_timer.lock();

        match generation {
            Some(g) if timer.as_ref().is_some_and(|(scheduled, _)| *scheduled == g) => {}
            Some(g) if *self.state.read() == RuntimeState::Running => {
                let shared = Arc::clone(self);
                let task = DelayedTask::spawn(self.advisory_ttl, move || {
                    shared.apply(|c| c.expire_advisory(g));
                });
                debug!(generation = g, "Advisory clear scheduled");
                *timer = Some((g, task));
            }
            // Superseded or cleared by a user edit.
            _ => {
                timer.take();
            }
        }
    }
}

/// Runs a calculator on Tokio timers.
pub struct CalculatorRuntime {
    shared: Arc<Shared>,
    tasks: Mutex<Vec<PeriodicTask>>,
    rate_interval: Duration,
    poll_interval: Duration,
}

impl CalculatorRuntime {
    /// Wrap `calculator`. Timers do not run until [`start`](Self::start).
    pub fn new(calculator: Calculator) -> Self {
        let config = calculator.config().clone();
        let (updates, _) = watch::channel(calculator.snapshot());

        Self {
            shared: Arc::new(Shared {
                calculator: Mutex::new(calculator),
                state: RwLock::new(RuntimeState::Idle),
                updates,
                advisory_timer: Mutex::new(None),
                advisory_ttl: config.advisory_ttl,
            }),
            tasks: Mutex::new(Vec::new()),
            rate_interval: config.rate_tick_interval,
            poll_interval: config.poll_interval,
        }
    }

    /// Start the rate and poll timers. Must be called inside a Tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&self) -> FxResult<()> {
        {
            let mut state = self.shared.state.write();
            match *state {
                RuntimeState::Running => return Err(FxError::AlreadyStarted),
                RuntimeState::Stopped => return Err(FxError::Stopped),
                RuntimeState::Idle => *state = RuntimeState::Running,
            }
        }

        let rate_shared = Arc::clone(&self.shared);
        let rate_task = PeriodicTask::spawn("rate", self.rate_interval, move || {
            rate_shared.apply(|c| c.tick_rate());
        });

        let poll_shared = Arc::clone(&self.shared);
        let poll_task = PeriodicTask::spawn("poll", self.poll_interval, move || {
            poll_shared.apply(|c| c.tick_poll());
        });

        self.tasks.lock().extend([rate_task, poll_task]);
        self.shared.resync_advisory();

        info!(
            rate_interval_ms = self.rate_interval.as_millis() as u64,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Calculator runtime started"
        );
        Ok(())
    }

    /// Cancel every timer. Idempotent.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.shared.state.write(), RuntimeState::Stopped);

        for task in self.tasks.lock().drain(..) {
            task.cancel();
        }
        self.shared.advisory_timer.lock().take();

        if previous != RuntimeState::Stopped {
            info!("Calculator runtime stopped");
        }
    }

    pub fn state(&self) -> RuntimeState {
        *self.shared.state.read()
    }

    /// Receive a snapshot after every change and every poll tick.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.updates.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.calculator.lock().snapshot()
    }

    /// Read the calculator directly.
    pub fn with_calculator<R>(&self, f: impl FnOnce(&Calculator) -> R) -> R {
        f(&self.shared.calculator.lock())
    }

    pub fn set_input_text(&self, text: &str) {
        self.shared.apply(|c| c.set_input_text(text));
    }

    pub fn set_override_text(&self, text: &str) {
        self.shared.apply(|c| c.set_override_text(text));
    }

    pub fn set_override_enabled(&self, enabled: bool) {
        self.shared.apply(|c| c.set_override_enabled(enabled));
    }

    pub fn switch_direction(&self, direction: ConversionDirection) -> SwitchOutcome {
        self.shared.apply(|c| c.switch_direction(direction))
    }

    /// Apply a rate tick now, outside the timer schedule.
    pub fn tick_rate(&self) -> Rate {
        self.shared.apply(|c| c.tick_rate())
    }

    /// Apply a poll tick now, outside the timer schedule.
    pub fn tick_poll(&self) -> u64 {
        self.shared.apply(|c| c.tick_poll())
    }
}

impl Drop for CalculatorRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalculatorConfig;
    use crate::simulator::ScriptedDelta;
    use tokio_test::{assert_err, assert_ok};

    fn runtime(deltas: Vec<f64>) -> CalculatorRuntime {
        let calculator = Calculator::with_delta_source(
            CalculatorConfig::default(),
            Box::new(ScriptedDelta::new(deltas)),
        )
        .unwrap();
        CalculatorRuntime::new(calculator)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stop() {
        let rt = runtime(vec![]);
        assert_eq!(rt.state(), RuntimeState::Idle);

        assert_ok!(rt.start());
        assert_eq!(rt.state(), RuntimeState::Running);
        assert_eq!(rt.start(), Err(FxError::AlreadyStarted));

        rt.shutdown();
        assert_eq!(rt.state(), RuntimeState::Stopped);
        assert_err!(rt.start());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_drive_ticks() {
        let rt = runtime(vec![0.01, 0.01]);
        rt.start().unwrap();

        sleep_ms(3001).await;
        let snap = rt.snapshot();
        assert_eq!(snap.rate_ticks, 1);
        assert_eq!(snap.poll_ticks, 3);
        assert!((snap.live_rate.value() - 1.11).abs() < 1e-12);

        sleep_ms(3000).await;
        let snap = rt.snapshot();
        assert_eq!(snap.rate_ticks, 2);
        assert_eq!(snap.poll_ticks, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let rt = runtime(vec![]);
        rt.start().unwrap();

        sleep_ms(1001).await;
        rt.shutdown();
        sleep_ms(10_000).await;

        let snap = rt.snapshot();
        assert_eq!(snap.poll_ticks, 1);
        assert_eq!(snap.rate_ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_clears_after_ttl() {
        let rt = runtime(vec![0.05]);
        rt.set_override_text("1.11");
        rt.set_override_enabled(true);
        rt.start().unwrap();

        // Rate tick at 3000ms moves live to 1.15 and trips the override.
        sleep_ms(3001).await;
        let snap = rt.snapshot();
        assert!(!snap.override_state.enabled);
        assert!(!snap.advisory_message().is_empty());

        sleep_ms(2000).await;
        assert!(rt.snapshot().advisory.is_some());

        sleep_ms(600).await;
        assert!(rt.snapshot().advisory.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_edit_clears_advisory_early() {
        let rt = runtime(vec![0.05]);
        rt.set_override_text("1.11");
        rt.set_override_enabled(true);
        rt.start().unwrap();

        sleep_ms(3001).await;
        assert!(rt.snapshot().advisory.is_some());

        rt.set_override_text("1.15");
        assert!(rt.snapshot().advisory.is_none());
        assert!(rt.shared.advisory_timer.lock().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_poll_refresh() {
        let rt = runtime(vec![]);
        let mut updates = rt.subscribe();
        rt.start().unwrap();

        assert_ok!(updates.changed().await);
        assert_eq!(updates.borrow_and_update().poll_ticks, 1);

        assert_ok!(updates.changed().await);
        assert_eq!(updates.borrow_and_update().poll_ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_raised_before_start_clears_on_time() {
        let rt = runtime(vec![0.05]);
        rt.set_override_text("1.11");
        rt.set_override_enabled(true);
        rt.tick_rate();
        assert!(rt.snapshot().advisory.is_some());

        rt.start().unwrap();

        sleep_ms(2400).await;
        assert!(rt.snapshot().advisory.is_some());

        sleep_ms(200).await;
        assert!(rt.snapshot().advisory.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_published_snapshot_matches_state_under_contention() {
        let config = CalculatorConfig {
            rate_tick_interval: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
            seed: Some(11),
            ..Default::default()
        };
        let rt = Arc::new(CalculatorRuntime::new(Calculator::new(config).unwrap()));
        let updates = rt.subscribe();
        rt.start().unwrap();

        let mut writers = Vec::new();
        for w in 0..4 {
            let rt = Arc::clone(&rt);
            writers.push(tokio::spawn(async move {
                for i in 0..200 {
                    rt.set_input_text(&format!("{}", w * 1000 + i));
                    rt.tick_poll();
                    tokio::task::yield_now().await;
                }
            }));
        }
        for writer in writers {
            assert_ok!(writer.await);
        }
        rt.shutdown();

        // Publication happens under the calculator lock, so the last
        // published snapshot is the current state.
        rt.with_calculator(|c| assert_eq!(*updates.borrow(), c.snapshot()));
    }

    #[tokio::test]
    async fn test_manual_commands() {
        let rt = runtime(vec![]);

        rt.set_input_text("100");
        assert_eq!(
            rt.switch_direction(ConversionDirection::QuoteToBase),
            SwitchOutcome::Switched {
                carried: Some("110.00".to_string())
            }
        );
        assert_eq!(rt.snapshot().output_display(), "100.00");
        assert_eq!(rt.tick_poll(), 1);
        assert_eq!(rt.with_calculator(|c| c.history().len()), 2);
    }
}
