//! Structured diagnostic messages.

use crate::code::DiagnosticCode;
use crate::location::Location;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic.
///
/// `items` lists the design objects the diagnostic is about (pins, clocks,
/// loops) one per entry; renderers print them indented under the message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level.
    pub severity: Severity,
    /// The code identifying the kind of problem.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Where in an input file the problem was found, if anywhere.
    pub location: Option<Location>,
    /// Offending objects, in report order.
    pub items: Vec<String>,
    /// Explanatory notes.
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            items: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates a note diagnostic.
    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Note, code, message)
    }

    /// Attaches a file location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Appends offending objects.
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_warning() {
        let code = DiagnosticCode::new(Category::Sdc, 1);
        let diag = Diagnostic::warning(code, "unrecognized SDC command");
        assert_eq!(diag.severity, Severity::Warning);
        assert!(diag.location.is_none());
        assert_eq!(diag.code.to_string(), "S001");
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Timing, 101);
        let diag = Diagnostic::warning(code, "There are 2 input ports missing set_input_delay.")
            .at(Location::new("top.sdc", 4))
            .with_items(["in_a", "in_b"])
            .with_note("ports without input delay are not timed")
            .with_help("add set_input_delay for each port");
        assert_eq!(diag.items, vec!["in_a", "in_b"]);
        assert_eq!(diag.location, Some(Location::new("top.sdc", 4)));
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn serializes_to_json() {
        let code = DiagnosticCode::new(Category::Netlist, 2);
        let diag = Diagnostic::error(code, "arc references unknown pin");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["message"], "arc references unknown pin");
        assert_eq!(json["severity"], "Error");
    }
}
