//! Leakage power groups.
//!
//! A liberty `leakage_power` group gives the static power a cell draws,
//! optionally qualified by a `when` condition on its pins:
//!
//! ```text
//! leakage_power () {
//!   when : "!A & B";
//!   value : 0.0123;
//! }
//! ```
//!
//! The reader collects a group's attributes into [`LeakagePowerAttrs`] and
//! then hands them to [`LeakagePower::attach`], which moves them into the
//! owning [`LibertyCell`].

use crate::cell::LibertyCell;
use crate::func_expr::FuncExpr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attributes of a `leakage_power` group while it is being read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeakagePowerAttrs {
    when: Option<FuncExpr>,
    power: f32,
}

impl LeakagePowerAttrs {
    /// No condition and zero power.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears the `when` condition.
    pub fn set_when(&mut self, when: Option<FuncExpr>) {
        self.when = when;
    }

    /// Sets the `value` attribute.
    pub fn set_power(&mut self, power: f32) {
        self.power = power;
    }

    /// The `when` condition, if any.
    pub fn when(&self) -> Option<&FuncExpr> {
        self.when.as_ref()
    }

    /// The leakage power value.
    pub fn power(&self) -> f32 {
        self.power
    }
}

/// A leakage power entry owned by a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakagePower {
    when: Option<FuncExpr>,
    power: f32,
}

impl LeakagePower {
    /// Creates an entry from `attrs` and registers it with `cell`.
    pub fn attach(cell: &mut LibertyCell, attrs: LeakagePowerAttrs) -> &LeakagePower {
        cell.add_leakage_power(LeakagePower {
            when: attrs.when,
            power: attrs.power,
        })
    }

    /// The condition under which this power applies. `None` means always.
    pub fn when(&self) -> Option<&FuncExpr> {
        self.when.as_ref()
    }

    /// Leakage power value.
    pub fn power(&self) -> f32 {
        self.power
    }

    /// Whether the entry applies in `state`. Unconditional entries always
    /// apply; a condition that reads an unknown pin does not.
    pub fn applies(&self, state: &HashMap<String, bool>) -> bool {
        match &self.when {
            None => true,
            Some(when) => when.eval(state).unwrap_or(false),
        }
    }
}
