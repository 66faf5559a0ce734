//! Timing constraint records as written in SDC.
//!
//! These are name-based and unresolved: a clock's sources or an I/O delay's
//! ports are interned names that may or may not exist in the netlist.
//! [`ConstraintStore::bind`](crate::store::ConstraintStore::bind) resolves
//! them against a [`TimingGraph`](crate::graph::TimingGraph).

use serde::{Deserialize, Serialize};
use tempus_common::Ident;
use tempus_diagnostics::Location;

/// All constraints read for a design, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingConstraints {
    /// `create_clock` and `create_generated_clock` definitions.
    pub clocks: Vec<ClockConstraint>,
    /// `set_input_delay` assertions.
    pub input_delays: Vec<IoDelay>,
    /// `set_output_delay` assertions.
    pub output_delays: Vec<IoDelay>,
    /// `set_max_delay` exceptions.
    pub max_delay_paths: Vec<MaxDelayPath>,
}

impl TimingConstraints {
    /// Creates an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the clock with the given name. Later definitions of the same
    /// name replace earlier ones, as `create_clock` does.
    pub fn find_clock(&self, name: Ident) -> Option<&ClockConstraint> {
        self.clocks.iter().rev().find(|c| c.name == name)
    }

    /// Number of clock definitions, generated clocks included.
    pub fn clock_count(&self) -> usize {
        self.clocks.len()
    }

    /// Appends everything from `other`, keeping file order.
    pub fn extend(&mut self, other: TimingConstraints) {
        self.clocks.extend(other.clocks);
        self.input_delays.extend(other.input_delays);
        self.output_delays.extend(other.output_delays);
        self.max_delay_paths.extend(other.max_delay_paths);
    }
}

/// A clock from `create_clock` or `create_generated_clock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConstraint {
    /// Clock name.
    pub name: Ident,
    /// Period in nanoseconds. Zero for generated clocks, whose period
    /// follows from the master.
    pub period_ns: f64,
    /// Ports or pins the clock is defined on. Empty for a virtual clock.
    pub sources: Vec<Ident>,
    /// Rise and fall edge times within the period, if given.
    pub waveform: Option<(f64, f64)>,
    /// Present for generated clocks.
    pub generated: Option<GeneratedClock>,
    /// Where the command appeared.
    pub origin: Option<Location>,
}

/// The derivation of a generated clock from its master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedClock {
    /// Master clock named with `-master_clock`, if any. When absent the
    /// master is whatever clock reaches the source pin.
    pub master: Option<Ident>,
    /// Master source pin from `-source`.
    pub source: Ident,
    /// `-divide_by` factor.
    pub divide_by: Option<u32>,
    /// `-multiply_by` factor.
    pub multiply_by: Option<u32>,
    /// `-invert` was given.
    pub invert: bool,
}

/// A `set_input_delay` or `set_output_delay` assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoDelay {
    /// The constrained port.
    pub port: Ident,
    /// Reference clock. `None` asserts an unclocked delay.
    pub clock: Option<Ident>,
    /// Delay in nanoseconds.
    pub delay_ns: f64,
    /// Where the command appeared.
    pub origin: Option<Location>,
}

/// A `set_max_delay` exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxDelayPath {
    /// `-from` objects.
    pub from: Vec<Ident>,
    /// `-to` objects.
    pub to: Vec<Ident>,
    /// Maximum delay in nanoseconds.
    pub delay_ns: f64,
    /// Where the command appeared.
    pub origin: Option<Location>,
}
