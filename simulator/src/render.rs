//! Text rendering of calculator snapshots.

use std::fmt::Write;

use chrono::Local;

use fxcalc_common::{format_amount, format_rate, PLACEHOLDER};
use fxcalc_fx::{HistoryEntry, RateSource, Snapshot};

/// Render the calculator panel.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    let source = match snapshot.rate_source {
        RateSource::Live => "(live)",
        RateSource::Override => "(override)",
    };
    let _ = writeln!(
        out,
        "Live {} rate: {}   Effective: {} {}",
        snapshot.pair,
        format_rate(Some(snapshot.live_rate.value())),
        format_rate(Some(snapshot.effective_rate.value())),
        source
    );

    let override_text = if snapshot.override_state.raw_text.is_empty() {
        PLACEHOLDER
    } else {
        snapshot.override_state.raw_text.as_str()
    };
    let toggle = match (
        snapshot.override_toggle_available,
        snapshot.override_state.enabled,
    ) {
        (false, _) => "unavailable",
        (true, true) => "on",
        (true, false) => "off",
    };
    let _ = writeln!(out, "Override: {override_text} [{toggle}]");

    if !snapshot.advisory_message().is_empty() {
        let _ = writeln!(out, "! {}", snapshot.advisory_message());
    }

    let _ = writeln!(
        out,
        "{} → {}: {} {} = {} {}",
        snapshot.from_currency,
        snapshot.to_currency,
        snapshot.input_text,
        snapshot.from_currency,
        snapshot.output_display(),
        snapshot.to_currency
    );

    if snapshot.input_valid() {
        let _ = writeln!(out, "  {}", snapshot.summary);
    } else {
        let _ = writeln!(out, "Enter a valid number");
    }

    out
}

/// Render the history table, newest first.
pub fn render_history(entries: &[HistoryEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Last {} conversions", entries.len());

    if entries.is_empty() {
        let _ = writeln!(out, "No history yet.");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<10} {:>8} {:>8} {:>16} {:>16}",
        "Time", "Live FX", "Override", "Input", "Output"
    );
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<10} {:>8} {:>8} {:>16} {:>16}",
            entry.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string(),
            format_rate(Some(entry.live_rate.value())),
            format_rate(entry.override_rate.map(|r| r.value())),
            format!("{} {}", format_amount(Some(entry.from_amount)), entry.from_currency),
            format!("{} {}", format_amount(Some(entry.to_amount)), entry.to_currency),
        );
    }

    out
}
