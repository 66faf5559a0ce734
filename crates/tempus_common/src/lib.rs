//! Shared foundational types for the Tempus timing analyzer.
//!
//! Provides interned names for pins, ports and clocks.

#![warn(missing_docs)]

pub mod ident;

pub use ident::{Ident, Interner};
