//! Pure derivation of every computed value from a state snapshot.
//!
//! The calculator calls [`derive`] after each command instead of tracking
//! dependencies between values. Nothing here mutates state.

use serde::Serialize;

use fxcalc_common::{parse_decimal, ConversionDirection, CurrencyPair, Rate};

use crate::conversion::{convert_amount, Conversion};
use crate::history::Observation;
use crate::override_rate::OverrideState;

/// Where the effective rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Live,
    Override,
}

/// The state a derivation reads.
#[derive(Debug, Clone, Copy)]
pub struct PipelineInput<'a> {
    pub pair: &'a CurrencyPair,
    pub live_rate: Rate,
    pub override_state: &'a OverrideState,
    pub drift_threshold: f64,
    pub direction: ConversionDirection,
    pub input_text: &'a str,
}

/// Everything computed from a [`PipelineInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub effective_rate: Rate,
    pub rate_source: RateSource,
    /// Override rate in effect, if any.
    pub override_rate: Option<Rate>,
    /// Drift of the parsed override from the live rate, if one parses.
    pub drift: Option<f64>,
    /// An active override has reached the drift threshold.
    pub drift_breached: bool,
    pub conversion: Conversion,
    /// What the history log should observe.
    pub observation: Observation,
}

/// Compute the derived values for `input`.
pub fn derive(input: &PipelineInput<'_>) -> Derived {
    let override_rate = input.override_state.active_rate();
    let (effective_rate, rate_source) = match override_rate {
        Some(rate) => (rate, RateSource::Override),
        None => (input.live_rate, RateSource::Live),
    };

    let drift = input
        .override_state
        .parsed
        .map(|p| p.drift_from(input.live_rate));
    let drift_breached = override_rate.is_some()
        && drift.is_some_and(|d| d >= input.drift_threshold);

    let amount = parse_decimal(input.input_text);
    let output = convert_amount(amount, effective_rate, input.direction);

    let conversion = Conversion {
        direction: input.direction,
        from_currency: input.direction.from_currency(input.pair).clone(),
        to_currency: input.direction.to_currency(input.pair).clone(),
        input: amount,
        output,
        rate: effective_rate,
    };

    let observation = Observation {
        direction: input.direction,
        input: amount,
        output,
        live_rate: input.live_rate,
        override_rate,
    };

    Derived {
        effective_rate,
        rate_source,
        override_rate,
        drift,
        drift_breached,
        conversion,
        observation,
    }
}
