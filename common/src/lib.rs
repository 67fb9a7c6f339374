//! FxCalc Common Types
//!
//! This crate contains shared types used across the FxCalc workspace,
//! including currencies, the single supported pair, conversion direction,
//! the positive `Rate` newtype, numeric text parsing and display formatting.

pub mod direction;
pub mod error;
pub mod monetary;
pub mod numeric;
pub mod time;

pub use direction::*;
pub use error::*;
pub use monetary::*;
pub use numeric::*;
pub use time::*;
