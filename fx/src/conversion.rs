//! Currency conversion across the pair.

use serde::Serialize;

use fxcalc_common::{format_amount, ConversionDirection, Currency, Rate, PLACEHOLDER};

/// Convert `amount` at `rate` in `direction`.
///
/// Returns `None` when the amount is not finite, the rate is not a positive
/// finite number, or the result overflows.
pub fn convert(amount: f64, rate: f64, direction: ConversionDirection) -> Option<f64> {
    if !amount.is_finite() || !rate.is_finite() || rate <= 0.0 {
        return None;
    }

    let output = match direction {
        ConversionDirection::BaseToQuote => amount * rate,
        ConversionDirection::QuoteToBase => amount / rate,
    };

    output.is_finite().then_some(output)
}

/// Convert an already-parsed amount at a validated rate.
pub fn convert_amount(
    amount: Option<f64>,
    rate: Rate,
    direction: ConversionDirection,
) -> Option<f64> {
    amount.and_then(|a| convert(a, rate.value(), direction))
}

/// A computed conversion with its currency labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    /// Direction the amount was converted in.
    pub direction: ConversionDirection,
    /// Input currency.
    pub from_currency: Currency,
    /// Output currency.
    pub to_currency: Currency,
    /// Parsed input amount, `None` when the input text is invalid.
    pub input: Option<f64>,
    /// Converted amount, `None` when undefined.
    pub output: Option<f64>,
    /// Rate the conversion used.
    pub rate: Rate,
}

impl Conversion {
    /// Both sides are defined.
    pub fn is_complete(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    /// One-line summary such as `100.00 EUR → 110.00 USD`.
    pub fn summary(&self) -> String {
        match self.input {
            Some(input) => format!(
                "{} {} → {} {}",
                format_amount(Some(input)),
                self.from_currency,
                format_amount(self.output),
                self.to_currency
            ),
            None => PLACEHOLDER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_convert_base_to_quote() {
        let out = convert(100.0, 1.1, ConversionDirection::BaseToQuote).unwrap();
        assert!((out - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_convert_quote_to_base() {
        let out = convert(110.0, 1.1, ConversionDirection::QuoteToBase).unwrap();
        assert!((out - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_convert_undefined_inputs() {
        let d = ConversionDirection::BaseToQuote;
        assert_eq!(convert(f64::NAN, 1.1, d), None);
        assert_eq!(convert(f64::INFINITY, 1.1, d), None);
        assert_eq!(convert(100.0, 0.0, d), None);
        assert_eq!(convert(100.0, -1.0, d), None);
        assert_eq!(convert(100.0, 0.0, ConversionDirection::QuoteToBase), None);
        assert_eq!(convert(f64::MAX, 2.0, d), None);
    }

    #[test]
    fn test_summary() {
        let conversion = Conversion {
            direction: ConversionDirection::BaseToQuote,
            from_currency: Currency::eur(),
            to_currency: Currency::usd(),
            input: Some(100.0),
            output: convert(100.0, 1.1, ConversionDirection::BaseToQuote),
            rate: Rate::new(1.1).unwrap(),
        };
        assert!(conversion.is_complete());
        assert_eq!(conversion.summary(), "100.00 EUR → 110.00 USD");

        let invalid = Conversion {
            input: None,
            output: None,
            ..conversion
        };
        assert!(!invalid.is_complete());
        assert_eq!(invalid.summary(), "—");
    }

    proptest! {
        #[test]
        fn round_trip_recovers_amount(x in -1.0e9f64..1.0e9, r in 0.0001f64..1000.0) {
            let there = convert(x, r, ConversionDirection::BaseToQuote).unwrap();
            let back = convert(there, r, ConversionDirection::QuoteToBase).unwrap();
            prop_assert!((back - x).abs() <= 1e-9 * x.abs().max(1.0));
        }
    }
}
