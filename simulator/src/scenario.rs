//! Scripted calculator sessions.

use std::collections::VecDeque;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use fxcalc_common::ConversionDirection;
use fxcalc_fx::{Calculator, CalculatorConfig, DeltaSource, Snapshot, UniformDelta};

/// A scripted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Live rate to start from; the configured rate when absent.
    #[serde(default)]
    pub initial_rate: Option<f64>,
    /// Rate steps consumed by `TickRate` before falling back to random ones.
    #[serde(default)]
    pub rate_deltas: Vec<f64>,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Type into the amount field.
    SetAmount { text: String },
    /// Type into the override field.
    SetOverride { text: String },
    /// Click the override checkbox.
    EnableOverride { enabled: bool },
    /// Click a direction button.
    Switch { direction: ConversionDirection },
    /// Let the live rate tick `count` times.
    TickRate { count: u32 },
    /// Let the poll clock tick once.
    TickPoll,
    /// Let the advisory timer fire.
    ExpireAdvisory,
}

/// Outcome of replaying a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps_applied: usize,
    pub snapshot: Snapshot,
}

/// Scripted deltas first, then seeded uniform ones.
struct ReplayDelta {
    scripted: VecDeque<f64>,
    fallback: UniformDelta,
}

impl DeltaSource for ReplayDelta {
    fn next_delta(&mut self, max: f64) -> f64 {
        match self.scripted.pop_front() {
            Some(delta) => delta.clamp(-max, max),
            None => self.fallback.next_delta(max),
        }
    }
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario file by path.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "continuity" => Ok(Self::continuity()),
            "override-drift" => Ok(Self::override_drift()),
            "invalid-input" => Ok(Self::invalid_input()),
            path => Self::from_file(path),
        }
    }

    /// Read a JSON scenario file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Unknown scenario or unreadable file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid scenario file: {}", path.display()))
    }

    /// Replay every step against a fresh calculator.
    pub fn replay(&self, mut config: CalculatorConfig) -> anyhow::Result<ScenarioReport> {
        if let Some(rate) = self.initial_rate {
            config.initial_rate = rate;
        }

        let source = ReplayDelta {
            scripted: self.rate_deltas.iter().copied().collect(),
            fallback: UniformDelta::new(config.seed),
        };
        let mut calculator = Calculator::with_delta_source(config, Box::new(source))
            .with_context(|| format!("Cannot run scenario {}", self.name))?;

        info!(scenario = %self.name, steps = self.steps.len(), "Replaying scenario");

        for step in &self.steps {
            Self::apply(&mut calculator, step);
        }

        Ok(ScenarioReport {
            name: self.name.clone(),
            steps_applied: self.steps.len(),
            snapshot: calculator.snapshot(),
        })
    }

    fn apply(calculator: &mut Calculator, step: &ScenarioStep) {
        match step {
            ScenarioStep::SetAmount { text } => calculator.set_input_text(text),
            ScenarioStep::SetOverride { text } => calculator.set_override_text(text),
            ScenarioStep::EnableOverride { enabled } => calculator.set_override_enabled(*enabled),
            ScenarioStep::Switch { direction } => {
                calculator.switch_direction(*direction);
            }
            ScenarioStep::TickRate { count } => {
                for _ in 0..*count {
                    calculator.tick_rate();
                }
            }
            ScenarioStep::TickPoll => {
                calculator.tick_poll();
            }
            ScenarioStep::ExpireAdvisory => {
                if let Some(generation) = calculator.advisory().map(|a| a.generation) {
                    calculator.expire_advisory(generation);
                }
            }
        }
    }

    /// Convert, then flip back and forth.
    fn continuity() -> Self {
        Self {
            name: "continuity".to_string(),
            description: "Output becomes input on every direction switch".to_string(),
            initial_rate: Some(1.1),
            rate_deltas: Vec::new(),
            steps: vec![
                ScenarioStep::SetAmount {
                    text: "100".to_string(),
                },
                ScenarioStep::Switch {
                    direction: ConversionDirection::QuoteToBase,
                },
                ScenarioStep::Switch {
                    direction: ConversionDirection::BaseToQuote,
                },
            ],
        }
    }

    /// Override close to live, then the market walks away from it.
    fn override_drift() -> Self {
        Self {
            name: "override-drift".to_string(),
            description: "Override switches itself off once 2% from live".to_string(),
            initial_rate: Some(1.1),
            rate_deltas: vec![0.01, 0.02],
            steps: vec![
                ScenarioStep::SetOverride {
                    text: "1.105".to_string(),
                },
                ScenarioStep::EnableOverride { enabled: true },
                ScenarioStep::TickRate { count: 2 },
            ],
        }
    }

    /// Garbage in the amount field.
    fn invalid_input() -> Self {
        Self {
            name: "invalid-input".to_string(),
            description: "Unparseable amount shows a placeholder and records nothing".to_string(),
            initial_rate: Some(1.1),
            rate_deltas: Vec::new(),
            steps: vec![
                ScenarioStep::SetAmount {
                    text: "abc".to_string(),
                },
                ScenarioStep::TickPoll,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> CalculatorConfig {
        CalculatorConfig {
            seed: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_continuity_scenario() {
        let report = Scenario::load("continuity").unwrap().replay(config()).unwrap();

        assert_eq!(report.steps_applied, 3);
        assert_eq!(report.snapshot.direction, ConversionDirection::BaseToQuote);
        assert_eq!(report.snapshot.input_text, "100.00");
        assert_eq!(report.snapshot.output_display(), "110.00");
    }

    #[test]
    fn test_override_drift_scenario() {
        let report = Scenario::load("override-drift").unwrap().replay(config()).unwrap();
        let snap = report.snapshot;

        // 1.105 vs 1.13 is over 2% away.
        assert!(!snap.override_state.enabled);
        assert!(!snap.advisory_message().is_empty());
        assert!((snap.live_rate.value() - 1.13).abs() < 1e-9);
        assert_eq!(snap.history[1].override_rate.map(|r| r.value()), Some(1.105));
    }

    #[test]
    fn test_invalid_input_scenario() {
        let report = Scenario::load("invalid-input").unwrap().replay(config()).unwrap();

        assert_eq!(report.snapshot.output_display(), "—");
        assert_eq!(report.snapshot.history.len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "from-file",
                "initial_rate": 2.0,
                "steps": [
                    {{ "SetAmount": {{ "text": "10" }} }},
                    {{ "Switch": {{ "direction": "quote_to_base" }} }},
                    "TickPoll"
                ]
            }}"#
        )
        .unwrap();

        let scenario = Scenario::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(scenario.name, "from-file");
        assert_eq!(scenario.steps[2], ScenarioStep::TickPoll);

        let report = scenario.replay(config()).unwrap();
        assert_eq!(report.snapshot.input_text, "20.00");
        assert_eq!(report.snapshot.output_display(), "10.00");
    }

    #[test]
    fn test_unknown_scenario() {
        assert!(Scenario::load("no-such-scenario").is_err());
    }
}
