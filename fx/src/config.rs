//! Calculator configuration.

use std::time::Duration;

use fxcalc_common::{constants, MIN_RATE};

use crate::error::{FxError, FxResult};

/// Largest per-tick step the simulator accepts.
pub const MAX_RATE_DELTA: f64 = 1_000.0;

/// Tunables for the rate simulation, override rule and history log.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorConfig {
    /// Live rate at start-up.
    pub initial_rate: f64,
    /// How often the live rate moves.
    pub rate_tick_interval: Duration,
    /// Largest absolute change applied by a single rate tick.
    pub max_rate_delta: f64,
    /// The live rate never drops below this.
    pub rate_floor: f64,
    /// How often the display is refreshed.
    pub poll_interval: Duration,
    /// Relative drift at which an active override is switched off.
    pub drift_threshold: f64,
    /// How long the auto-disable advisory stays visible.
    pub advisory_ttl: Duration,
    /// Maximum number of history entries kept.
    pub history_capacity: usize,
    /// Decimals used when fingerprinting history observations.
    pub fingerprint_decimals: usize,
    /// Seed for the rate simulator; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            initial_rate: 1.1,
            rate_tick_interval: constants::rate_tick_interval(),
            max_rate_delta: 0.05,
            rate_floor: MIN_RATE,
            poll_interval: constants::poll_interval(),
            drift_threshold: 0.02,
            advisory_ttl: constants::advisory_ttl(),
            history_capacity: 5,
            fingerprint_decimals: 6,
            seed: None,
        }
    }
}

impl CalculatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or malformed variables leave the default in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rate) = std::env::var("FXCALC_INITIAL_RATE") {
            if let Ok(rate) = rate.trim().parse() {
                config.initial_rate = rate;
            }
        }

        if let Ok(ms) = std::env::var("FXCALC_RATE_TICK_MS") {
            if let Ok(ms) = ms.trim().parse() {
                config.rate_tick_interval = Duration::from_millis(ms);
            }
        }

        if let Ok(ms) = std::env::var("FXCALC_POLL_MS") {
            if let Ok(ms) = ms.trim().parse() {
                config.poll_interval = Duration::from_millis(ms);
            }
        }

        if let Ok(seed) = std::env::var("FXCALC_SEED") {
            if let Ok(seed) = seed.trim().parse() {
                config.seed = Some(seed);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        let invalid = |msg: &str| Err(FxError::InvalidConfig(msg.to_string()));

        if !self.initial_rate.is_finite() || self.initial_rate <= 0.0 {
            return invalid("initial rate must be a positive number");
        }

        if !self.rate_floor.is_finite() || self.rate_floor <= 0.0 {
            return invalid("rate floor must be a positive number");
        }

        if !self.max_rate_delta.is_finite() || self.max_rate_delta < 0.0 {
            return invalid("max rate delta cannot be negative");
        }

        if self.max_rate_delta > MAX_RATE_DELTA {
            return invalid("max rate delta is too large");
        }

        if self.rate_tick_interval.is_zero() || self.poll_interval.is_zero() {
            return invalid("tick intervals cannot be zero");
        }

        if self.advisory_ttl.is_zero() {
            return invalid("advisory ttl cannot be zero");
        }

        if !(self.drift_threshold > 0.0 && self.drift_threshold < 1.0) {
            return invalid("drift threshold must be between 0 and 1");
        }

        if self.history_capacity == 0 {
            return invalid("history capacity cannot be 0");
        }

        Ok(())
    }
}
