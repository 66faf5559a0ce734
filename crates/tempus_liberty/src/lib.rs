//! Liberty cell attributes for Tempus.
//!
//! Holds the pieces of a liberty library that the analyzer keeps per cell:
//! Boolean function expressions ([`FuncExpr`]) and state-dependent leakage
//! power ([`LeakagePower`]).

#![warn(missing_docs)]

pub mod cell;
pub mod func_expr;
pub mod leakage;

pub use cell::LibertyCell;
pub use func_expr::{FuncExpr, FuncExprError};
pub use leakage::{LeakagePower, LeakagePowerAttrs};
