//! The calculator: command surface over the rate, override, mode and history.

use serde::Serialize;
use tracing::{debug, info, instrument};

use fxcalc_common::{format_amount, ConversionDirection, Currency, CurrencyPair, Rate};

use crate::clock::PollClock;
use crate::config::CalculatorConfig;
use crate::error::FxResult;
use crate::history::{HistoryEntry, HistoryLog};
use crate::mode::{ModeSwitcher, SwitchOutcome};
use crate::override_rate::{Advisory, OverrideController, OverrideState};
use crate::pipeline::{self, Derived, PipelineInput, RateSource};
use crate::simulator::{DeltaSource, RateSimulator};

/// Single-pair currency calculator.
///
/// Every command updates state and then re-runs the derivation pipeline,
/// which applies the override drift rule and feeds the history log. Timers
/// live outside: a host calls [`tick_rate`](Self::tick_rate),
/// [`tick_poll`](Self::tick_poll) and
/// [`expire_advisory`](Self::expire_advisory) on its own schedule.
pub struct Calculator {
    config: CalculatorConfig,
    pair: CurrencyPair,
    simulator: RateSimulator,
    overrides: OverrideController,
    mode: ModeSwitcher,
    history: HistoryLog,
    poll: PollClock,
}

impl Calculator {
    /// Create a calculator whose live rate moves by uniform random steps.
    pub fn new(config: CalculatorConfig) -> FxResult<Self> {
        config.validate()?;
        let simulator = RateSimulator::from_config(&config);
        Ok(Self::assemble(config, simulator))
    }

    /// Create a calculator with a custom source of rate steps.
    pub fn with_delta_source(
        config: CalculatorConfig,
        source: Box<dyn DeltaSource>,
    ) -> FxResult<Self> {
        config.validate()?;
        let simulator = RateSimulator::with_source(&config, source);
        Ok(Self::assemble(config, simulator))
    }

    fn assemble(config: CalculatorConfig, simulator: RateSimulator) -> Self {
        let mut calculator = Self {
            pair: CurrencyPair::eur_usd(),
            overrides: OverrideController::new(config.drift_threshold),
            mode: ModeSwitcher::default(),
            history: HistoryLog::new(config.history_capacity, config.fingerprint_decimals),
            poll: PollClock::new(config.poll_interval),
            simulator,
            config,
        };

        info!(
            pair = %calculator.pair,
            live = calculator.simulator.live_rate().value(),
            "Calculator created"
        );

        calculator.refresh();
        calculator
    }

    // --- Commands ---

    /// Replace the amount text for the current "from" currency.
    #[instrument(level = "debug", skip(self))]
    pub fn set_input_text(&mut self, text: &str) {
        self.mode.set_input_text(text);
        self.refresh();
    }

    /// Replace the override rate text.
    #[instrument(level = "debug", skip(self))]
    pub fn set_override_text(&mut self, text: &str) {
        self.overrides.set_text(text);
        self.refresh();
    }

    /// Request the override on or off.
    #[instrument(level = "debug", skip(self))]
    pub fn set_override_enabled(&mut self, enabled: bool) {
        self.overrides.set_enabled(enabled);
        self.refresh();
    }

    /// Switch conversion direction, carrying the current output over as input.
    #[instrument(level = "debug", skip(self))]
    pub fn switch_direction(&mut self, direction: ConversionDirection) -> SwitchOutcome {
        let output = self.derive().conversion.output;
        let outcome = self.mode.switch_to(direction, output);
        if outcome != SwitchOutcome::Unchanged {
            self.refresh();
        }
        outcome
    }

    /// Advance the simulated live rate by one step.
    pub fn tick_rate(&mut self) -> Rate {
        let live = self.simulator.tick();
        self.refresh();
        live
    }

    /// Register a poll tick and re-evaluate everything.
    pub fn tick_poll(&mut self) -> u64 {
        let ticks = self.poll.tick();
        self.refresh();
        ticks
    }

    /// Clear the advisory raised as `generation`, if it is still showing.
    pub fn expire_advisory(&mut self, generation: u64) -> bool {
        let cleared = self.overrides.expire_advisory(generation);
        if cleared {
            debug!(generation, "Override advisory expired");
        }
        cleared
    }

    // --- Observable state ---

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn live_rate(&self) -> Rate {
        self.simulator.live_rate()
    }

    pub fn effective_rate(&self) -> Rate {
        self.overrides.effective_rate(self.simulator.live_rate())
    }

    pub fn rate_source(&self) -> RateSource {
        self.derive().rate_source
    }

    pub fn override_state(&self) -> &OverrideState {
        self.overrides.state()
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        self.overrides.advisory()
    }

    /// Advisory text, empty when none is showing.
    pub fn advisory_message(&self) -> &str {
        self.overrides.advisory().map_or("", |a| a.message.as_str())
    }

    pub fn direction(&self) -> ConversionDirection {
        self.mode.direction()
    }

    pub fn from_currency(&self) -> &Currency {
        self.mode.direction().from_currency(&self.pair)
    }

    pub fn to_currency(&self) -> &Currency {
        self.mode.direction().to_currency(&self.pair)
    }

    pub fn input_text(&self) -> &str {
        self.mode.input_text()
    }

    pub fn input_amount(&self) -> Option<f64> {
        self.mode.input_amount()
    }

    pub fn output_amount(&self) -> Option<f64> {
        self.derive().conversion.output
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// History entries, newest first.
    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.history.to_vec()
    }

    pub fn poll_ticks(&self) -> u64 {
        self.poll.ticks()
    }

    pub fn rate_ticks(&self) -> u64 {
        self.simulator.ticks()
    }

    /// Everything a host needs to render, computed from current state.
    pub fn snapshot(&self) -> Snapshot {
        let derived = self.derive();
        let summary = derived.conversion.summary();
        Snapshot {
            pair: self.pair.clone(),
            live_rate: self.simulator.live_rate(),
            effective_rate: derived.effective_rate,
            rate_source: derived.rate_source,
            override_state: self.overrides.state().clone(),
            override_toggle_available: self.overrides.toggle_available(),
            drift: derived.drift,
            advisory: self.overrides.advisory().cloned(),
            direction: self.mode.direction(),
            from_currency: derived.conversion.from_currency,
            to_currency: derived.conversion.to_currency,
            input_text: self.mode.input_text().to_string(),
            input_amount: derived.conversion.input,
            output_amount: derived.conversion.output,
            summary,
            history: self.history.to_vec(),
            rate_ticks: self.simulator.ticks(),
            poll_ticks: self.poll.ticks(),
        }
    }

    // --- Pipeline ---

    fn derive(&self) -> Derived {
        pipeline::derive(&PipelineInput {
            pair: &self.pair,
            live_rate: self.simulator.live_rate(),
            override_state: self.overrides.state(),
            drift_threshold: self.config.drift_threshold,
            direction: self.mode.direction(),
            input_text: self.mode.input_text(),
        })
    }

    fn refresh(&mut self) {
        let mut derived = self.derive();

        if derived.drift_breached {
            self.overrides.enforce_drift(self.simulator.live_rate());
            derived = self.derive();
        }

        self.history.record(&derived.observation, &self.pair);
    }
}

/// Read-only view of the calculator at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub pair: CurrencyPair,
    pub live_rate: Rate,
    pub effective_rate: Rate,
    pub rate_source: RateSource,
    pub override_state: OverrideState,
    pub override_toggle_available: bool,
    pub drift: Option<f64>,
    pub advisory: Option<Advisory>,
    pub direction: ConversionDirection,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub input_text: String,
    pub input_amount: Option<f64>,
    pub output_amount: Option<f64>,
    /// `100.00 EUR → 110.00 USD`, or the placeholder when the input is invalid.
    pub summary: String,
    pub history: Vec<HistoryEntry>,
    pub rate_ticks: u64,
    pub poll_ticks: u64,
}

impl Snapshot {
    /// The amount text parses to a finite number.
    pub fn input_valid(&self) -> bool {
        self.input_amount.is_some()
    }

    /// Output formatted for display, em-dash when undefined.
    pub fn output_display(&self) -> String {
        format_amount(self.output_amount)
    }

    /// Advisory text, empty when none is showing.
    pub fn advisory_message(&self) -> &str {
        self.advisory.as_ref().map_or("", |a| a.message.as_str())
    }
}
