//! Parsing of user-entered numbers and fixed-decimal display.

/// Shown in place of any value that is not a finite number.
pub const PLACEHOLDER: &str = "—";

/// Decimal places used when displaying amounts.
pub const AMOUNT_DECIMALS: usize = 2;

/// Decimal places used when displaying rates.
pub const RATE_DECIMALS: usize = 4;

/// Parse user-entered numeric text.
///
/// Surrounding whitespace is ignored and a comma decimal separator is
/// accepted in place of a period. Blank text, unparseable text and
/// non-finite results all yield `None`.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Format with a fixed number of decimals, or [`PLACEHOLDER`] if not finite.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    format!("{:.*}", decimals, value)
}

/// Format an optional value, using [`PLACEHOLDER`] for `None`.
pub fn format_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format_fixed(v, decimals))
}

/// Format an amount with [`AMOUNT_DECIMALS`].
pub fn format_amount(value: Option<f64>) -> String {
    format_opt(value, AMOUNT_DECIMALS)
}

/// Format a rate with [`RATE_DECIMALS`].
pub fn format_rate(value: Option<f64>) -> String {
    format_opt(value, RATE_DECIMALS)
}
