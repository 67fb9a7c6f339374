//! Interactive command parsing.

use std::str::FromStr;

use anyhow::{anyhow, bail};

use fxcalc_common::ConversionDirection;

/// A line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the amount text.
    Amount(String),
    /// Replace the override text.
    Override(String),
    /// Turn the override on or off.
    Enable(bool),
    /// Switch conversion direction.
    Switch(ConversionDirection),
    /// Apply a rate tick immediately.
    Tick,
    /// Apply a poll tick immediately.
    Poll,
    /// Print the current state.
    Show,
    /// Print the history table.
    History,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  amount <text>     set the amount to convert (a)
  override <text>   set the override rate (o)
  enable | disable  turn the override on or off
  switch <eur|usd>  switch direction; `eur` and `usd` work alone too
  tick | poll       apply a rate or poll tick now
  show | history    print state or the last conversions
  help | quit";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "amount" | "a" => Command::Amount(rest.to_string()),
            "override" | "o" => Command::Override(rest.to_string()),
            "enable" | "on" => Command::Enable(true),
            "disable" | "off" => Command::Enable(false),
            "switch" | "s" => {
                if rest.is_empty() {
                    bail!("switch needs a direction, e.g. `switch usd`");
                }
                Command::Switch(rest.parse().map_err(|e| anyhow!("{e}"))?)
            }
            "eur" | "usd" => Command::Switch(head.parse().map_err(|e| anyhow!("{e}"))?),
            "tick" => Command::Tick,
            "poll" => Command::Poll,
            "show" | "" => Command::Show,
            "history" | "h" => Command::History,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command `{other}`, try `help`"),
        };

        Ok(command)
    }
}
