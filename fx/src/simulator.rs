//! Simulated live rate that drifts randomly on every tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use fxcalc_common::Rate;

use crate::config::CalculatorConfig;

/// Source of the random step applied to the live rate on each tick.
pub trait DeltaSource: Send {
    /// Draw the next delta. Implementations must stay within `[-max, +max]`.
    fn next_delta(&mut self, max: f64) -> f64;
}

/// Uniformly distributed deltas from a seedable generator.
pub struct UniformDelta {
    rng: StdRng,
}

impl UniformDelta {
    /// Create a generator seeded from `seed`, or from entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl DeltaSource for UniformDelta {
    fn next_delta(&mut self, max: f64) -> f64 {
        if max.is_nan() || max <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-max..=max)
    }
}

/// Replays a fixed list of deltas, then yields zero.
#[cfg(any(test, feature = "test-utils"))]
pub struct ScriptedDelta {
    deltas: std::collections::VecDeque<f64>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ScriptedDelta {
    /// Create a source that returns `deltas` in order.
    pub fn new(deltas: impl IntoIterator<Item = f64>) -> Self {
        Self {
            deltas: deltas.into_iter().collect(),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl DeltaSource for ScriptedDelta {
    fn next_delta(&mut self, max: f64) -> f64 {
        self.deltas.pop_front().unwrap_or(0.0).clamp(-max, max)
    }
}

/// The drifting live rate.
pub struct RateSimulator {
    live: Rate,
    max_delta: f64,
    floor: f64,
    ticks: u64,
    source: Box<dyn DeltaSource>,
}

impl RateSimulator {
    /// Create a simulator starting at `initial`.
    pub fn new(initial: Rate, max_delta: f64, floor: f64, source: Box<dyn DeltaSource>) -> Self {
        Self {
            live: Rate::floored(initial.value(), floor),
            max_delta,
            floor,
            ticks: 0,
            source,
        }
    }

    /// Create a simulator from configuration, with uniform deltas.
    pub fn from_config(config: &CalculatorConfig) -> Self {
        Self::with_source(config, Box::new(UniformDelta::new(config.seed)))
    }

    /// Create a simulator from configuration with a custom delta source.
    pub fn with_source(config: &CalculatorConfig, source: Box<dyn DeltaSource>) -> Self {
        let initial = Rate::floored(config.initial_rate, config.rate_floor);
        Self::new(initial, config.max_rate_delta, config.rate_floor, source)
    }

    /// Current live rate.
    pub fn live_rate(&self) -> Rate {
        self.live
    }

    /// Number of ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Move the live rate by one random step, never below the floor.
    pub fn tick(&mut self) -> Rate {
        let delta = self.source.next_delta(self.max_delta);
        let previous = self.live;
        self.live = Rate::floored(previous.value() + delta, self.floor);
        self.ticks += 1;

        debug!(
            tick = self.ticks,
            previous = previous.value(),
            delta,
            live = self.live.value(),
            "Live rate ticked"
        );

        self.live
    }
}
