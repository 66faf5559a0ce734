//! File/line locations attached to diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A line in an input file (an SDC script or a netlist).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Location {
    /// Path of the file as given by the user.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

impl Location {
    /// Creates a location.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_file_line() {
        assert_eq!(Location::new("top.sdc", 12).to_string(), "top.sdc:12");
    }
}
