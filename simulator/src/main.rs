//! FxCalc
//!
//! Interactive EUR/USD calculator over a simulated live rate.

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxcalc_fx::CalculatorConfig;

mod command;
mod controller;
mod render;
mod scenario;

use controller::{OutputOptions, SessionController};
use scenario::Scenario;

/// FxCalc CLI
#[derive(Parser, Debug)]
#[command(name = "fxcalc")]
#[command(about = "EUR/USD calculator with a simulated live rate and manual override")]
struct Args {
    /// Starting live rate (USD per EUR)
    #[arg(long)]
    initial_rate: Option<f64>,

    /// Random seed for reproducible rate movement
    #[arg(long)]
    seed: Option<u64>,

    /// Live rate tick interval in milliseconds
    #[arg(long)]
    rate_tick_ms: Option<u64>,

    /// Display poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Replay a built-in scenario or a JSON scenario file, then exit
    #[arg(short, long)]
    scenario: Option<String>,

    /// Print every state change, including timer ticks
    #[arg(short, long)]
    follow: bool,

    /// Print state as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<CalculatorConfig> {
        let mut config = CalculatorConfig::from_env();

        if let Some(rate) = self.initial_rate {
            config.initial_rate = rate;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ms) = self.rate_tick_ms {
            config.rate_tick_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    // stdout carries the calculator display.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let config = args.config()?;
    let options = OutputOptions {
        json: args.json,
        follow: args.follow,
    };

    info!("Starting FxCalc");
    info!("Initial rate: {}", config.initial_rate);

    if let Some(name) = &args.scenario {
        let scenario = Scenario::load(name)?;
        println!("{}", SessionController::replay(&scenario, config, options)?);
        return Ok(());
    }

    let controller = SessionController::new(config, options)?;
    controller.run().await?;

    let snapshot = controller.runtime().snapshot();
    info!("Session complete");
    info!("Rate ticks: {}", snapshot.rate_ticks);
    info!("Poll ticks: {}", snapshot.poll_ticks);
    info!("Conversions in history: {}", snapshot.history.len());

    Ok(())
}
