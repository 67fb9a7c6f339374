//! FxCalc Conversion Engine
//!
//! State and derivation engine for a single-pair currency calculator driven
//! by a simulated, randomly drifting live rate.
//!
//! # Features
//!
//! - Live rate simulation with an injectable random source
//! - Manual rate override that switches itself off on excessive drift
//! - Bidirectional conversion with continuity across direction switches
//! - Deduplicated, bounded conversion history
//! - Tokio runtime owning the rate, poll and advisory timers
//!
//! # Example
//!
//! ```rust
//! use fxcalc_fx::{Calculator, CalculatorConfig};
//! use fxcalc_common::ConversionDirection;
//!
//! let mut calculator = Calculator::new(CalculatorConfig::default()).unwrap();
//! calculator.set_input_text("100");
//! assert_eq!(calculator.snapshot().output_display(), "110.00");
//!
//! calculator.switch_direction(ConversionDirection::QuoteToBase);
//! assert_eq!(calculator.input_text(), "110.00");
//! ```

pub mod clock;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod history;
pub mod mode;
pub mod override_rate;
pub mod pipeline;
pub mod runtime;
pub mod simulator;

pub use clock::{DelayedTask, PeriodicTask, PollClock};
pub use config::CalculatorConfig;
pub use conversion::{convert, Conversion};
pub use engine::{Calculator, Snapshot};
pub use error::{FxError, FxResult};
pub use history::{Fingerprint, HistoryEntry, HistoryLog, Observation};
pub use mode::{ModeSwitcher, SwitchOutcome};
pub use override_rate::{Advisory, OverrideController, OverrideState, DRIFT_ADVISORY};
pub use pipeline::{derive, Derived, PipelineInput, RateSource};
pub use runtime::{CalculatorRuntime, RuntimeState};
pub use simulator::{DeltaSource, RateSimulator, UniformDelta};

#[cfg(any(test, feature = "test-utils"))]
pub use simulator::ScriptedDelta;
