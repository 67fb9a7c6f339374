//! Manually entered rate that replaces the live rate while enabled.
//!
//! The override switches itself off once it drifts too far from the live
//! rate, raising a short-lived advisory. Each advisory carries a generation
//! number so a delayed clear only removes the advisory it was scheduled for.

use serde::Serialize;
use tracing::{debug, warn};

use fxcalc_common::{now, parse_decimal, Rate, Timestamp};

/// Message shown when the override is switched off for drifting.
pub const DRIFT_ADVISORY: &str = "Override disabled (≥ 2% away from live rate).";

/// User-facing override fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverrideState {
    /// Text as typed.
    pub raw_text: String,
    /// Parsed rate, present only when the text is a positive finite number.
    pub parsed: Option<Rate>,
    /// Whether the override is in effect. Never true while `parsed` is `None`.
    pub enabled: bool,
}

impl OverrideState {
    /// The override rate currently in effect, if any.
    pub fn active_rate(&self) -> Option<Rate> {
        if self.enabled {
            self.parsed
        } else {
            None
        }
    }
}

/// A transient notice raised by the auto-disable rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    /// Text to display.
    pub message: String,
    /// Monotonic id used to match the scheduled clear.
    pub generation: u64,
    /// When it was raised.
    pub raised_at: Timestamp,
}

/// Validates override input and applies the drift rule.
#[derive(Debug, Clone)]
pub struct OverrideController {
    state: OverrideState,
    drift_threshold: f64,
    advisory: Option<Advisory>,
    generation: u64,
}

impl OverrideController {
    /// Create a disabled, empty override.
    pub fn new(drift_threshold: f64) -> Self {
        Self {
            state: OverrideState::default(),
            drift_threshold,
            advisory: None,
            generation: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> &OverrideState {
        &self.state
    }

    /// Replace the override text.
    ///
    /// Clears any advisory. If the new text does not parse to a positive
    /// number the override is switched off.
    pub fn set_text(&mut self, text: &str) {
        self.advisory = None;
        self.state.raw_text = text.to_string();
        self.state.parsed = parse_decimal(text).and_then(Rate::new);

        if self.state.enabled && self.state.parsed.is_none() {
            debug!(text, "Override text no longer valid, disabling");
            self.state.enabled = false;
        }
    }

    /// Request the override on or off.
    ///
    /// Clears any advisory. Turning it on without a valid parsed rate
    /// leaves it off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.advisory = None;
        self.state.enabled = enabled && self.state.parsed.is_some();

        if enabled && !self.state.enabled {
            debug!(text = %self.state.raw_text, "Ignoring enable request without a valid override rate");
        }
    }

    /// Whether the host should offer the enable toggle.
    pub fn toggle_available(&self) -> bool {
        !self.state.raw_text.trim().is_empty()
    }

    /// Rate to convert with: the override when active, otherwise `live`.
    pub fn effective_rate(&self, live: Rate) -> Rate {
        self.state.active_rate().unwrap_or(live)
    }

    /// Relative drift of the parsed override from `live`.
    pub fn drift(&self, live: Rate) -> Option<f64> {
        self.state.parsed.map(|p| p.drift_from(live))
    }

    /// Whether an active override has drifted to or past the threshold.
    pub fn is_breached(&self, live: Rate) -> bool {
        self.state.enabled && self.drift(live).is_some_and(|d| d >= self.drift_threshold)
    }

    /// Switch the override off if it has drifted too far from `live`.
    ///
    /// Returns the generation of the advisory raised, if any.
    pub fn enforce_drift(&mut self, live: Rate) -> Option<u64> {
        if !self.is_breached(live) {
            return None;
        }

        let drift = self.drift(live).unwrap_or_default();
        self.state.enabled = false;
        self.generation += 1;
        self.advisory = Some(Advisory {
            message: DRIFT_ADVISORY.to_string(),
            generation: self.generation,
            raised_at: now(),
        });

        warn!(
            override_rate = ?self.state.parsed.map(|r| r.value()),
            live = live.value(),
            drift,
            threshold = self.drift_threshold,
            "Override auto-disabled"
        );

        Some(self.generation)
    }

    /// Current advisory.
    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisory.as_ref()
    }

    /// Clear the advisory if it is still the one raised as `generation`.
    pub fn expire_advisory(&mut self, generation: u64) -> bool {
        match &self.advisory {
            Some(a) if a.generation == generation => {
                self.advisory = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(v: f64) -> Rate {
        Rate::new(v).unwrap()
    }

    #[test]
    fn test_parse_override_text() {
        let mut ctl = OverrideController::new(0.02);

        ctl.set_text(" 1,105 ");
        assert_eq!(ctl.state().parsed, Some(rate(1.105)));

        for bad in ["", "abc", "0", "-1.1", "inf"] {
            ctl.set_text(bad);
            assert_eq!(ctl.state().parsed, None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_enable_requires_valid_rate() {
        let mut ctl = OverrideController::new(0.02);

        ctl.set_enabled(true);
        assert!(!ctl.state().enabled);

        ctl.set_text("abc");
        ctl.set_enabled(true);
        assert!(!ctl.state().enabled);

        ctl.set_text("1.1");
        ctl.set_enabled(true);
        assert!(ctl.state().enabled);
        assert_eq!(ctl.effective_rate(rate(1.2)), rate(1.1));
    }

    #[test]
    fn test_invalid_text_disables() {
        let mut ctl = OverrideController::new(0.02);
        ctl.set_text("1.1");
        ctl.set_enabled(true);

        ctl.set_text("");
        assert!(!ctl.state().enabled);
        assert_eq!(ctl.effective_rate(rate(1.2)), rate(1.2));
    }

    #[test]
    fn test_toggle_availability() {
        let mut ctl = OverrideController::new(0.02);
        assert!(!ctl.toggle_available());
        ctl.set_text("   ");
        assert!(!ctl.toggle_available());
        ctl.set_text("x");
        assert!(ctl.toggle_available());
    }

    #[test]
    fn test_drift_just_below_threshold_stays_enabled() {
        let mut ctl = OverrideController::new(0.02);
        ctl.set_text("1.12189");
        ctl.set_enabled(true);

        assert_eq!(ctl.enforce_drift(rate(1.1)), None);
        assert!(ctl.state().enabled);
        assert!(ctl.advisory().is_none());
    }

    #[test]
    fn test_drift_at_threshold_disables() {
        let mut ctl = OverrideController::new(0.02);
        ctl.set_text("1.02");
        ctl.set_enabled(true);

        assert_eq!(ctl.enforce_drift(rate(1.0)), Some(1));
        assert!(!ctl.state().enabled);
        assert_eq!(ctl.advisory().map(|a| a.message.as_str()), Some(DRIFT_ADVISORY));
        // The text is kept so the user can re-enable after the market moves back.
        assert_eq!(ctl.state().parsed, Some(rate(1.02)));
    }

    #[test]
    fn test_drift_below_live_disables() {
        let mut ctl = OverrideController::new(0.02);
        ctl.set_text("1.05");
        ctl.set_enabled(true);

        assert!(ctl.enforce_drift(rate(1.1)).is_some());
        assert!(!ctl.state().enabled);
    }

    #[test]
    fn test_disabled_override_never_raises() {
        let mut ctl = OverrideController::new(0.02);
        ctl.set_text("5.0");
        assert_eq!(ctl.enforce_drift(rate(1.1)), None);
        assert!(ctl.advisory().is_none());
    }

    #[test]
    fn test_user_edit_clears_advisory() {
        let mut ctl = OverrideController::new(0.02);
        ctl.set_text("2.0");
        ctl.set_enabled(true);
        ctl.enforce_drift(rate(1.0));
        assert!(ctl.advisory().is_some());

        ctl.set_enabled(false);
        assert!(ctl.advisory().is_none());

        ctl.set_enabled(true);
        ctl.enforce_drift(rate(1.0));
        assert!(ctl.advisory().is_some());
        ctl.set_text("2.01");
        assert!(ctl.advisory().is_none());
    }

    #[test]
    fn test_expire_matches_generation() {
        let mut ctl = OverrideController::new(0.02);
        ctl.set_text("2.0");
        ctl.set_enabled(true);
        let first = ctl.enforce_drift(rate(1.0)).unwrap();

        ctl.set_enabled(true);
        let second = ctl.enforce_drift(rate(1.0)).unwrap();
        assert!(second > first);

        assert!(!ctl.expire_advisory(first));
        assert!(ctl.advisory().is_some());
        assert!(ctl.expire_advisory(second));
        assert!(ctl.advisory().is_none());
    }
}
