//! Diagnostics for the Tempus timing analyzer.
//!
//! Every user-facing problem (a malformed SDC command, a constraint naming a
//! pin the netlist does not have, a constraint gap found by `check_timing`)
//! becomes a [`Diagnostic`]. Diagnostics are collected in a thread-safe
//! [`DiagnosticSink`] and formatted by a [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
