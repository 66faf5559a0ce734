//! Liberty cells, as far as leakage power is concerned.

use crate::leakage::LeakagePower;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A library cell and its leakage power data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibertyCell {
    name: String,
    /// The `cell_leakage_power` attribute, used when no entry applies.
    #[serde(default)]
    pub cell_leakage_power: Option<f32>,
    #[serde(default)]
    leakage_powers: Vec<LeakagePower>,
}

impl LibertyCell {
    /// Creates a cell with no leakage data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell_leakage_power: None,
            leakage_powers: Vec::new(),
        }
    }

    /// Cell name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Takes ownership of a leakage power entry.
    pub fn add_leakage_power(&mut self, power: LeakagePower) -> &LeakagePower {
        let index = self.leakage_powers.len();
        self.leakage_powers.push(power);
        &self.leakage_powers[index]
    }

    /// Leakage power entries in the order they were read.
    pub fn leakage_powers(&self) -> &[LeakagePower] {
        &self.leakage_powers
    }

    /// Leakage power for a pin state.
    ///
    /// The first conditional entry whose `when` holds wins. Otherwise the
    /// first unconditional entry, and failing that `cell_leakage_power`.
    pub fn leakage_power_for(&self, state: &HashMap<String, bool>) -> Option<f32> {
        self.leakage_powers
            .iter()
            .filter(|p| p.when().is_some())
            .find(|p| p.applies(state))
            .or_else(|| self.leakage_powers.iter().find(|p| p.when().is_none()))
            .map(LeakagePower::power)
            .or(self.cell_leakage_power)
    }
}
