//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The subsystem a diagnostic comes from, shown as a one-letter prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Netlist / timing-graph input problems, prefixed with `N`.
    Netlist,
    /// Constraint file problems, prefixed with `S`.
    Sdc,
    /// Constraint gaps found by `check_timing`, prefixed with `T`.
    Timing,
    /// Internal errors, prefixed with `E`.
    Internal,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Netlist => 'N',
            Category::Sdc => 'S',
            Category::Timing => 'T',
            Category::Internal => 'E',
        }
    }
}

/// A category prefix plus a number, displayed as e.g. `T104` or `S003`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Netlist.prefix(), 'N');
        assert_eq!(Category::Sdc.prefix(), 'S');
        assert_eq!(Category::Timing.prefix(), 'T');
        assert_eq!(Category::Internal.prefix(), 'E');
    }

    #[test]
    fn display_pads_number() {
        assert_eq!(DiagnosticCode::new(Category::Timing, 106).to_string(), "T106");
        assert_eq!(DiagnosticCode::new(Category::Sdc, 3).to_string(), "S003");
    }
}
