//! Session controller.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use fxcalc_fx::{Calculator, CalculatorConfig, CalculatorRuntime, Snapshot};

use crate::command::{Command, HELP};
use crate::render::{render_history, render_snapshot};
use crate::scenario::{Scenario, ScenarioReport};

/// How the session prints.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Print snapshots as JSON instead of text.
    pub json: bool,
    /// Print every published snapshot, not just command results.
    pub follow: bool,
}

/// Forward lines from `reader` on a detached thread.
///
/// The channel closes at end of input or on a read error. The thread is not
/// joined, so a read still blocked on a terminal never holds up exit.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("Input reader finished");
    });

    rx
}

/// Drives a calculator runtime from stdin.
pub struct SessionController {
    runtime: CalculatorRuntime,
    options: OutputOptions,
}

impl SessionController {
    /// Create a controller. Timers start in [`run`](Self::run).
    pub fn new(config: CalculatorConfig, options: OutputOptions) -> anyhow::Result<Self> {
        let calculator = Calculator::new(config)?;
        Ok(Self {
            runtime: CalculatorRuntime::new(calculator),
            options,
        })
    }

    /// Run until `quit`, end of input or Ctrl+C.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.runtime.start()?;
        info!("Session started, type `help` for commands");

        let mut updates = self.runtime.subscribe();
        let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));

        println!("{}", self.format_snapshot(&self.runtime.snapshot())?);

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        info!("End of input");
                        break;
                    };
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => {
                            if let Some(out) = self.execute(command)? {
                                println!("{out}");
                            }
                        }
                        Err(e) => println!("{e}"),
                    }
                }
                changed = updates.changed(), if self.options.follow => {
                    if changed.is_err() {
                        warn!("Snapshot channel closed");
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    println!("{}", self.format_snapshot(&snapshot)?);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        self.runtime.shutdown();
        Ok(())
    }

    /// Apply one command and return what to print.
    pub fn execute(&self, command: Command) -> anyhow::Result<Option<String>> {
        let changed = match command {
            Command::Amount(text) => {
                self.runtime.set_input_text(&text);
                true
            }
            Command::Override(text) => {
                self.runtime.set_override_text(&text);
                true
            }
            Command::Enable(enabled) => {
                self.runtime.set_override_enabled(enabled);
                true
            }
            Command::Switch(direction) => {
                self.runtime.switch_direction(direction);
                true
            }
            Command::Tick => {
                self.runtime.tick_rate();
                true
            }
            Command::Poll => {
                self.runtime.tick_poll();
                true
            }
            Command::Show => return self.format_snapshot(&self.runtime.snapshot()).map(Some),
            Command::History => {
                let entries = self.runtime.with_calculator(|c| c.history_entries());
                let out = if self.options.json {
                    serde_json::to_string_pretty(&entries)?
                } else {
                    render_history(&entries)
                };
                return Ok(Some(out));
            }
            Command::Help => return Ok(Some(HELP.to_string())),
            Command::Quit => return Ok(None),
        };

        // Followers already see every change.
        if changed && !self.options.follow {
            return self.format_snapshot(&self.runtime.snapshot()).map(Some);
        }
        Ok(None)
    }

    /// Replay `scenario` without timers and return the printable report.
    pub fn replay(
        scenario: &Scenario,
        config: CalculatorConfig,
        options: OutputOptions,
    ) -> anyhow::Result<String> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        let report = scenario.replay(config)?;
        if options.json {
            return Ok(serde_json::to_string_pretty(&report)?);
        }
        Ok(Self::render_report(&report))
    }

    fn render_report(report: &ScenarioReport) -> String {
        format!(
            "Scenario {} ({} steps)\n{}\n{}",
            report.name,
            report.steps_applied,
            render_snapshot(&report.snapshot),
            render_history(&report.snapshot.history)
        )
    }

    fn format_snapshot(&self, snapshot: &Snapshot) -> anyhow::Result<String> {
        if self.options.json {
            Ok(serde_json::to_string(snapshot)?)
        } else {
            Ok(render_snapshot(snapshot))
        }
    }

    pub fn runtime(&self) -> &CalculatorRuntime {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxcalc_common::ConversionDirection;

    fn controller(options: OutputOptions) -> SessionController {
        let config = CalculatorConfig {
            seed: Some(9),
            ..Default::default()
        };
        SessionController::new(config, options).unwrap()
    }

    #[test]
    fn test_execute_prints_state_after_change() {
        let ctl = controller(OutputOptions::default());

        let out = ctl.execute(Command::Amount("50".into())).unwrap().unwrap();
        assert!(out.contains("50 EUR = 55.00 USD"));

        let out = ctl
            .execute(Command::Switch(ConversionDirection::QuoteToBase))
            .unwrap()
            .unwrap();
        assert!(out.contains("USD → EUR: 55.00 USD = 50.00 EUR"));
    }

    #[test]
    fn test_follow_mode_suppresses_echo() {
        let ctl = controller(OutputOptions {
            follow: true,
            ..Default::default()
        });

        assert_eq!(ctl.execute(Command::Poll).unwrap(), None);
        assert!(ctl.execute(Command::Show).unwrap().is_some());
        assert_eq!(ctl.runtime().snapshot().poll_ticks, 1);
    }

    #[test]
    fn test_json_output() {
        let ctl = controller(OutputOptions {
            json: true,
            ..Default::default()
        });

        let out = ctl.execute(Command::Show).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["input_text"], "100");
        assert_eq!(value["direction"], "base_to_quote");

        let out = ctl.execute(Command::History).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(1));
    }

    #[tokio::test]
    async fn test_line_reader_forwards_until_eof() {
        let input = std::io::Cursor::new("amount 5\nswitch usd\n");
        let mut lines = spawn_line_reader(input);

        assert_eq!(lines.recv().await.as_deref(), Some("amount 5"));
        assert_eq!(lines.recv().await.as_deref(), Some("switch usd"));
        assert_eq!(lines.recv().await, None);
    }

    #[test]
    fn test_replay_report() {
        let scenario = Scenario::load("continuity").unwrap();
        let out = SessionController::replay(
            &scenario,
            CalculatorConfig::default(),
            OutputOptions::default(),
        )
        .unwrap();

        assert!(out.starts_with("Scenario continuity (3 steps)"));
        assert!(out.contains("Last 3 conversions"));
    }
}
