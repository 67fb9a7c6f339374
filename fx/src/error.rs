//! FX calculator error types.

use thiserror::Error;

/// Errors surfaced by the calculator's fallible edges.
///
/// Commands on a running calculator never fail; invalid user input is
/// represented in the snapshot instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FxError {
    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Runtime timers are already running.
    #[error("Calculator runtime already started")]
    AlreadyStarted,

    /// Runtime was shut down and cannot be restarted.
    #[error("Calculator runtime has been stopped")]
    Stopped,
}

/// Result type for FX calculator operations.
pub type FxResult<T> = Result<T, FxError>;
