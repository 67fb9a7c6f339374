//! Conversion direction over a currency pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CommonError;
use crate::monetary::{Currency, CurrencyPair};

/// Which way an amount is converted across a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDirection {
    /// Base into quote (EUR → USD): multiply by the rate.
    #[default]
    BaseToQuote,
    /// Quote into base (USD → EUR): divide by the rate.
    QuoteToBase,
}

impl ConversionDirection {
    /// Currency the input amount is denominated in.
    pub fn from_currency<'a>(&self, pair: &'a CurrencyPair) -> &'a Currency {
        match self {
            ConversionDirection::BaseToQuote => &pair.base,
            ConversionDirection::QuoteToBase => &pair.quote,
        }
    }

    /// Currency the output amount is denominated in.
    pub fn to_currency<'a>(&self, pair: &'a CurrencyPair) -> &'a Currency {
        match self {
            ConversionDirection::BaseToQuote => &pair.quote,
            ConversionDirection::QuoteToBase => &pair.base,
        }
    }

    /// The other direction.
    pub fn opposite(&self) -> Self {
        match self {
            ConversionDirection::BaseToQuote => ConversionDirection::QuoteToBase,
            ConversionDirection::QuoteToBase => ConversionDirection::BaseToQuote,
        }
    }

    /// Direction whose input currency is `currency`, if it belongs to `pair`.
    pub fn converting_from(currency: &Currency, pair: &CurrencyPair) -> Option<Self> {
        if *currency == pair.base {
            Some(ConversionDirection::BaseToQuote)
        } else if *currency == pair.quote {
            Some(ConversionDirection::QuoteToBase)
        } else {
            None
        }
    }
}

impl fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionDirection::BaseToQuote => write!(f, "base_to_quote"),
            ConversionDirection::QuoteToBase => write!(f, "quote_to_base"),
        }
    }
}

impl FromStr for ConversionDirection {
    type Err = CommonError;

    /// Accepts the snake_case names, or the input currency of the EUR/USD pair.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "base_to_quote" | "b2q" => Ok(ConversionDirection::BaseToQuote),
            "quote_to_base" | "q2b" => Ok(ConversionDirection::QuoteToBase),
            _ => Currency::parse(&normalized)
                .ok()
                .and_then(|c| Self::converting_from(&c, &CurrencyPair::eur_usd()))
                .ok_or_else(|| CommonError::InvalidDirection(s.to_string())),
        }
    }
}
