//! Bounded, deduplicated log of completed conversions.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use fxcalc_common::{
    format_fixed, now, ConversionDirection, Currency, CurrencyPair, Rate, Timestamp, PLACEHOLDER,
};

/// A recorded conversion. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// When the entry was recorded.
    pub timestamp: Timestamp,
    /// Live rate at record time.
    pub live_rate: Rate,
    /// Override in effect at record time, if any.
    pub override_rate: Option<Rate>,
    /// Input currency.
    pub from_currency: Currency,
    /// Output currency.
    pub to_currency: Currency,
    /// Input amount.
    pub from_amount: f64,
    /// Output amount.
    pub to_amount: f64,
}

/// The values a history entry is recorded from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub direction: ConversionDirection,
    pub input: Option<f64>,
    pub output: Option<f64>,
    pub live_rate: Rate,
    pub override_rate: Option<Rate>,
}

/// Rounded composite key used to skip repeat observations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint for an observation with both amounts defined.
    pub fn new(
        direction: ConversionDirection,
        input: f64,
        output: f64,
        live_rate: Rate,
        override_rate: Option<Rate>,
        decimals: usize,
    ) -> Self {
        let override_part = override_rate
            .map(|r| format_fixed(r.value(), decimals))
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        Self(format!(
            "{}|{}|{}|{}|{}",
            direction,
            format_fixed(input, decimals),
            format_fixed(output, decimals),
            format_fixed(live_rate.value(), decimals),
            override_part
        ))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newest-first log holding at most `capacity` entries.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    decimals: usize,
    last_fingerprint: Option<Fingerprint>,
}

impl HistoryLog {
    /// Create an empty log.
    pub fn new(capacity: usize, decimals: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            decimals,
            last_fingerprint: None,
        }
    }

    /// Record an observation.
    ///
    /// Does nothing unless both amounts are defined and the observation
    /// differs, after rounding, from the last one recorded. Returns the new
    /// entry when one was added.
    pub fn record(&mut self, observation: &Observation, pair: &CurrencyPair) -> Option<&HistoryEntry> {
        let (input, output) = match (observation.input, observation.output) {
            (Some(i), Some(o)) if i.is_finite() && o.is_finite() => (i, o),
            _ => return None,
        };

        let fingerprint = Fingerprint::new(
            observation.direction,
            input,
            output,
            observation.live_rate,
            observation.override_rate,
            self.decimals,
        );

        if self.last_fingerprint.as_ref() == Some(&fingerprint) {
            debug!(%fingerprint, "Observation unchanged, not recorded");
            return None;
        }

        let entry = HistoryEntry {
            id: Uuid::now_v7(),
            timestamp: now(),
            live_rate: observation.live_rate,
            override_rate: observation.override_rate,
            from_currency: observation.direction.from_currency(pair).clone(),
            to_currency: observation.direction.to_currency(pair).clone(),
            from_amount: input,
            to_amount: output,
        };

        info!(
            entry_id = %entry.id,
            %fingerprint,
            "Conversion recorded"
        );

        self.last_fingerprint = Some(fingerprint);
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);

        self.entries.front()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Copy of the entries, newest first.
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fingerprint of the last recorded observation.
    pub fn last_fingerprint(&self) -> Option<&Fingerprint> {
        self.last_fingerprint.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(input: f64, live: f64) -> Observation {
        let rate = Rate::new(live).unwrap();
        Observation {
            direction: ConversionDirection::BaseToQuote,
            input: Some(input),
            output: Some(input * live),
            live_rate: rate,
            override_rate: None,
        }
    }

    #[test]
    fn test_record_entry() {
        let mut log = HistoryLog::new(5, 6);
        let pair = CurrencyPair::eur_usd();

        let entry = log.record(&observation(100.0, 1.1), &pair).cloned().unwrap();

        assert_eq!(entry.from_currency, Currency::eur());
        assert_eq!(entry.to_currency, Currency::usd());
        assert_eq!(entry.from_amount, 100.0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_skips_undefined_amounts() {
        let mut log = HistoryLog::new(5, 6);
        let pair = CurrencyPair::eur_usd();
        let mut obs = observation(100.0, 1.1);
        obs.input = None;
        obs.output = None;

        assert!(log.record(&obs, &pair).is_none());
        assert!(log.is_empty());
        assert!(log.last_fingerprint().is_none());
    }

    #[test]
    fn test_dedup_consecutive() {
        let mut log = HistoryLog::new(5, 6);
        let pair = CurrencyPair::eur_usd();

        assert!(log.record(&observation(100.0, 1.1), &pair).is_some());
        assert!(log.record(&observation(100.0, 1.1), &pair).is_none());
        // Float noise below the fingerprint precision is ignored.
        assert!(log.record(&observation(100.0000000001, 1.1), &pair).is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_dedup_only_against_last() {
        let mut log = HistoryLog::new(5, 6);
        let pair = CurrencyPair::eur_usd();

        log.record(&observation(100.0, 1.1), &pair);
        log.record(&observation(200.0, 1.1), &pair);
        log.record(&observation(100.0, 1.1), &pair);

        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_override_changes_fingerprint() {
        let mut log = HistoryLog::new(5, 6);
        let pair = CurrencyPair::eur_usd();
        let mut obs = observation(100.0, 1.1);

        log.record(&obs, &pair);
        obs.override_rate = Rate::new(1.1);
        assert!(log.record(&obs, &pair).is_some());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = HistoryLog::new(5, 6);
        let pair = CurrencyPair::eur_usd();

        for i in 1..=7 {
            log.record(&observation(i as f64, 1.1), &pair);
        }

        let amounts: Vec<f64> = log.entries().map(|e| e.from_amount).collect();
        assert_eq!(amounts, vec![7.0, 6.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_ids_unique() {
        let mut log = HistoryLog::new(5, 6);
        let pair = CurrencyPair::eur_usd();
        log.record(&observation(1.0, 1.1), &pair);
        log.record(&observation(2.0, 1.1), &pair);

        let ids: Vec<Uuid> = log.entries().map(|e| e.id).collect();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = Fingerprint::new(
            ConversionDirection::QuoteToBase,
            110.0,
            100.0,
            Rate::new(1.1).unwrap(),
            None,
            6,
        );
        assert_eq!(fp.to_string(), "quote_to_base|110.000000|100.000000|1.100000|—");
    }
}
