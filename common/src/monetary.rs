//! Currency and rate types for FxCalc.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommonError, Result};

/// Smallest rate the engine will ever hold.
pub const MIN_RATE: f64 = 0.0001;

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Parse a currency code, rejecting anything that is not three ASCII letters.
    pub fn parse(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CommonError::InvalidCurrency(code.to_string()));
        }
        Ok(Self::new(trimmed))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A currency pair quoted as units of `quote` per one unit of `base`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency.
    pub base: Currency,
    /// Quote currency (pricing currency).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// The EUR/USD pair the calculator works on.
    pub fn eur_usd() -> Self {
        Self::new(Currency::eur(), Currency::usd())
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self::eur_usd()
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A positive, finite exchange rate.
///
/// Every stored rate goes through [`Rate::new`] or [`Rate::floored`], so a
/// `Rate` is never zero, negative, NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rate(f64);

impl Rate {
    /// Create a rate, returning `None` unless `value` is finite and `> 0`.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    /// Create a rate clamped to at least `floor`.
    ///
    /// A non-finite `value` collapses to `floor`. `floor` itself is clamped to
    /// [`MIN_RATE`] so the result is always valid.
    pub fn floored(value: f64, floor: f64) -> Self {
        let floor = if floor.is_finite() { floor.max(MIN_RATE) } else { MIN_RATE };
        if value.is_finite() {
            Self(value.max(floor))
        } else {
            Self(floor)
        }
    }

    /// Get the raw value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Relative distance of `self` from `reference`: `|self - reference| / reference`.
    pub fn drift_from(&self, reference: Rate) -> f64 {
        (self.0 - reference.0).abs() / reference.0
    }
}

impl TryFrom<f64> for Rate {
    type Error = CommonError;

    fn try_from(value: f64) -> Result<Self> {
        Rate::new(value).ok_or(CommonError::InvalidRate(value))
    }
}

impl From<Rate> for f64 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}
