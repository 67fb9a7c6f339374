//! Conversion direction and the amount being converted.

use tracing::info;

use fxcalc_common::{format_fixed, parse_decimal, ConversionDirection, AMOUNT_DECIMALS};

/// Amount text shown when the calculator starts.
pub const DEFAULT_INPUT: &str = "100";

/// What a direction switch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Already converting in the requested direction.
    Unchanged,
    /// Direction flipped; `carried` is the new input text when the previous
    /// output was defined.
    Switched { carried: Option<String> },
}

/// Holds the direction and the raw input text.
#[derive(Debug, Clone)]
pub struct ModeSwitcher {
    direction: ConversionDirection,
    input_text: String,
}

impl Default for ModeSwitcher {
    fn default() -> Self {
        Self::new(ConversionDirection::BaseToQuote, DEFAULT_INPUT)
    }
}

impl ModeSwitcher {
    pub fn new(direction: ConversionDirection, input_text: impl Into<String>) -> Self {
        Self {
            direction,
            input_text: input_text.into(),
        }
    }

    pub fn direction(&self) -> ConversionDirection {
        self.direction
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// Parsed input amount; `None` when the text is not a finite number.
    pub fn input_amount(&self) -> Option<f64> {
        parse_decimal(&self.input_text)
    }

    pub fn set_input_text(&mut self, text: &str) {
        self.input_text = text.to_string();
    }

    /// Switch to `target`, carrying `current_output` over as the next input.
    ///
    /// `current_output` must be the output computed in the current direction.
    /// When it is undefined the input text is left as is.
    pub fn switch_to(
        &mut self,
        target: ConversionDirection,
        current_output: Option<f64>,
    ) -> SwitchOutcome {
        if target == self.direction {
            return SwitchOutcome::Unchanged;
        }

        let carried = current_output
            .filter(|v| v.is_finite())
            .map(|v| format_fixed(v, AMOUNT_DECIMALS));
        if let Some(text) = &carried {
            self.input_text = text.clone();
        }

        info!(
            from = %self.direction,
            to = %target,
            carried = ?carried,
            "Conversion direction switched"
        );
        self.direction = target;

        SwitchOutcome::Switched { carried }
    }
}
