//! The constraint verifier.
//!
//! [`CheckTiming`] looks for constraint gaps that would make a timing
//! report untrustworthy: unconstrained ports, registers with no clock or
//! several, endpoints with nothing to check against, combinational loops,
//! and generated clocks cut off from their master. Each check that finds
//! something contributes one [`CheckError`] group; groups always come back
//! in [`CheckCategory`] order.

use crate::graph::{PinRole, TimingArcKind, TimingGraph};
use crate::ids::PinId;
use crate::loops::{find_combinational_loops, format_loop, LoopOptions, LoopSearch};
use crate::message::error_msg_subst;
use crate::search::ClockTags;
use crate::store::ConstraintStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tempus_diagnostics::{Category, Diagnostic, DiagnosticCode};

/// The kind of problem a [`CheckError`] group reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckCategory {
    /// Input ports with no `set_input_delay`.
    NoInputDelay,
    /// Output ports with no `set_output_delay`.
    NoOutputDelay,
    /// Register clock pins reached by more than one clock.
    RegMultipleClocks,
    /// Register clock pins reached by no clock.
    RegNoClocks,
    /// Endpoints with no timing requirement.
    UnconstrainedEndpoints,
    /// Combinational loops.
    Loops,
    /// The loop search ran out of budget. Produced by [`CheckCategory::Loops`].
    LoopCheckIncomplete,
    /// Generated clocks not driven by their master.
    GeneratedClocks,
}

impl CheckCategory {
    /// Categories a caller can select, in report order.
    pub const SELECTABLE: [CheckCategory; 7] = [
        CheckCategory::NoInputDelay,
        CheckCategory::NoOutputDelay,
        CheckCategory::RegMultipleClocks,
        CheckCategory::RegNoClocks,
        CheckCategory::UnconstrainedEndpoints,
        CheckCategory::Loops,
        CheckCategory::GeneratedClocks,
    ];

    /// Short kebab-case name, as used in configuration and JSON reports.
    pub fn name(self) -> &'static str {
        match self {
            CheckCategory::NoInputDelay => "no-input-delay",
            CheckCategory::NoOutputDelay => "no-output-delay",
            CheckCategory::RegMultipleClocks => "reg-multiple-clocks",
            CheckCategory::RegNoClocks => "reg-no-clocks",
            CheckCategory::UnconstrainedEndpoints => "unconstrained-endpoints",
            CheckCategory::Loops => "loops",
            CheckCategory::LoopCheckIncomplete => "loop-check-incomplete",
            CheckCategory::GeneratedClocks => "generated-clocks",
        }
    }

    /// Parses a selectable category name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SELECTABLE.into_iter().find(|c| c.name() == name)
    }

    /// Diagnostic code, `T101` through `T108`.
    pub fn code(self) -> DiagnosticCode {
        let number = match self {
            CheckCategory::NoInputDelay => 101,
            CheckCategory::NoOutputDelay => 102,
            CheckCategory::RegMultipleClocks => 103,
            CheckCategory::RegNoClocks => 104,
            CheckCategory::UnconstrainedEndpoints => 105,
            CheckCategory::Loops => 106,
            CheckCategory::LoopCheckIncomplete => 107,
            CheckCategory::GeneratedClocks => 108,
        };
        DiagnosticCode::new(Category::Timing, number)
    }

    /// Header template, filled in by [`error_msg_subst`].
    pub fn template(self) -> &'static str {
        match self {
            CheckCategory::NoInputDelay => "There %is %d input port%s missing set_input_delay.",
            CheckCategory::NoOutputDelay => "There %is %d output port%s missing set_output_delay.",
            CheckCategory::RegMultipleClocks => {
                "There %is %d register/latch pin%s with multiple clocks."
            }
            CheckCategory::RegNoClocks => "There %is %d unclocked register/latch pin%s.",
            CheckCategory::UnconstrainedEndpoints => "There %is %d unconstrained endpoint%s.",
            CheckCategory::Loops => "There %is %d combinational loop%s in the design.",
            CheckCategory::LoopCheckIncomplete => {
                "Combinational loop check stopped after %d vertices; loop results are incomplete."
            }
            CheckCategory::GeneratedClocks => {
                "There %is %d generated clock%s that %is not connected to a clock source."
            }
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A selection of checks to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CheckSet(u8);

impl CheckSet {
    /// Selects nothing.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Selects every check.
    pub fn all() -> Self {
        CheckCategory::SELECTABLE.into_iter().collect()
    }

    /// Builds a selection from one flag per check, in report order: input
    /// delay, output delay, multiple clocks, no clocks, unconstrained
    /// endpoints, loops, generated clocks.
    pub fn from_flags(
        no_input_delay: bool,
        no_output_delay: bool,
        reg_multiple_clks: bool,
        reg_no_clks: bool,
        unconstrained_endpoints: bool,
        loops: bool,
        generated_clks: bool,
    ) -> Self {
        let flags = [
            no_input_delay,
            no_output_delay,
            reg_multiple_clks,
            reg_no_clks,
            unconstrained_endpoints,
            loops,
            generated_clks,
        ];
        CheckCategory::SELECTABLE
            .into_iter()
            .zip(flags)
            .filter(|&(_, on)| on)
            .map(|(category, _)| category)
            .collect()
    }

    /// Adds a check.
    pub fn insert(&mut self, category: CheckCategory) {
        self.0 |= category.bit();
    }

    /// Removes a check.
    pub fn remove(&mut self, category: CheckCategory) {
        self.0 &= !category.bit();
    }

    /// Whether `category` is selected.
    pub fn contains(self, category: CheckCategory) -> bool {
        self.0 & category.bit() != 0
    }

    /// Whether nothing is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Selected categories in report order.
    pub fn iter(self) -> impl Iterator<Item = CheckCategory> {
        CheckCategory::SELECTABLE
            .into_iter()
            .filter(move |&c| self.contains(c))
    }
}

impl FromIterator<CheckCategory> for CheckSet {
    fn from_iter<I: IntoIterator<Item = CheckCategory>>(iter: I) -> Self {
        let mut set = CheckSet::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

/// One group of problems: a header line plus one line per object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckError {
    /// What kind of problem this is.
    pub category: CheckCategory,
    /// Header with the object count filled in.
    pub message: String,
    /// Offending pins, loops or clocks.
    pub objects: Vec<String>,
}

impl CheckError {
    fn new(category: CheckCategory, count: usize, objects: Vec<String>) -> Self {
        Self {
            category,
            message: error_msg_subst(category.template(), count),
            objects,
        }
    }

    /// The header followed by the object lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.message.as_str()).chain(self.objects.iter().map(String::as_str))
    }
}

impl From<&CheckError> for Diagnostic {
    fn from(error: &CheckError) -> Self {
        let diag = Diagnostic::warning(error.category.code(), error.message.clone())
            .with_items(error.objects.iter().cloned());
        match error.category {
            CheckCategory::LoopCheckIncomplete => {
                diag.with_help("raise `loop_vertex_budget` in [check_timing] to search further")
            }
            _ => diag,
        }
    }
}

/// The groups found by one [`CheckTiming::check`] call, in category order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckErrors(Vec<CheckError>);

impl CheckErrors {
    /// Number of groups.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no check found anything.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the groups in category order.
    pub fn iter(&self) -> std::slice::Iter<'_, CheckError> {
        self.0.iter()
    }

    /// The group for `category`, if that check found anything.
    pub fn get(&self, category: CheckCategory) -> Option<&CheckError> {
        self.0.iter().find(|e| e.category == category)
    }

    /// Categories present, in order.
    pub fn categories(&self) -> Vec<CheckCategory> {
        self.0.iter().map(|e| e.category).collect()
    }

    fn push(&mut self, error: CheckError) {
        tracing::debug!(
            check = error.category.name(),
            count = error.objects.len(),
            "check_timing group"
        );
        self.0.push(error);
    }
}

impl IntoIterator for CheckErrors {
    type Item = CheckError;
    type IntoIter = std::vec::IntoIter<CheckError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'e> IntoIterator for &'e CheckErrors {
    type Item = &'e CheckError;
    type IntoIter = std::slice::Iter<'e, CheckError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Tuning for the checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Loop search traversal options.
    pub loops: LoopOptions,
}

/// Runs constraint checks over a bound design.
pub struct CheckTiming<'a> {
    graph: &'a TimingGraph,
    store: &'a ConstraintStore,
    tags: &'a dyn ClockTags,
    options: CheckOptions,
}

impl<'a> CheckTiming<'a> {
    /// Creates a verifier over a graph, its bound constraints and the clock
    /// tags propagated through it.
    pub fn new(
        graph: &'a TimingGraph,
        store: &'a ConstraintStore,
        tags: &'a dyn ClockTags,
        options: CheckOptions,
    ) -> Self {
        Self {
            graph,
            store,
            tags,
            options,
        }
    }

    /// Runs the selected checks and returns what they found.
    ///
    /// Every call starts from scratch; unselected checks do no work.
    pub fn check(&self, checks: CheckSet) -> CheckErrors {
        let mut errors = CheckErrors::default();
        let mut missing_output_delay: Option<Vec<PinId>> = None;
        let mut loop_search: Option<LoopSearch> = None;

        if checks.contains(CheckCategory::NoInputDelay) {
            let pins = self.missing_input_delays();
            self.push_pin_errors(&mut errors, CheckCategory::NoInputDelay, &pins);
        }
        if checks.contains(CheckCategory::NoOutputDelay) {
            let pins = self.missing_output_delays();
            self.push_pin_errors(&mut errors, CheckCategory::NoOutputDelay, &pins);
            missing_output_delay = Some(pins);
        }
        if checks.contains(CheckCategory::RegMultipleClocks)
            || checks.contains(CheckCategory::RegNoClocks)
        {
            let (multiple, none) = self.register_clock_pins();
            if checks.contains(CheckCategory::RegMultipleClocks) {
                self.push_pin_errors(&mut errors, CheckCategory::RegMultipleClocks, &multiple);
            }
            if checks.contains(CheckCategory::RegNoClocks) {
                self.push_pin_errors(&mut errors, CheckCategory::RegNoClocks, &none);
            }
        }
        if checks.contains(CheckCategory::UnconstrainedEndpoints) {
            let outputs = missing_output_delay.unwrap_or_else(|| self.missing_output_delays());
            let mut ends: BTreeSet<PinId> = self.unconstrained_setups().into_iter().collect();
            ends.extend(outputs);
            let ends: Vec<PinId> = ends.into_iter().collect();
            self.push_pin_errors(&mut errors, CheckCategory::UnconstrainedEndpoints, &ends);
        }
        if checks.contains(CheckCategory::Loops) {
            let search = find_combinational_loops(self.graph, &self.options.loops);
            if !search.loops.is_empty() {
                let objects = search
                    .loops
                    .iter()
                    .map(|cycle| format_loop(self.graph, cycle))
                    .collect();
                errors.push(CheckError::new(
                    CheckCategory::Loops,
                    search.loops.len(),
                    objects,
                ));
            }
            if !search.complete {
                errors.push(CheckError::new(
                    CheckCategory::LoopCheckIncomplete,
                    search.visited,
                    Vec::new(),
                ));
            }
            loop_search = Some(search);
        }
        if checks.contains(CheckCategory::GeneratedClocks) {
            let clocks = self.disconnected_generated_clocks(loop_search.as_ref());
            if !clocks.is_empty() {
                errors.push(CheckError::new(
                    CheckCategory::GeneratedClocks,
                    clocks.len(),
                    clocks,
                ));
            }
        }

        errors
    }

    fn push_pin_errors(&self, errors: &mut CheckErrors, category: CheckCategory, pins: &[PinId]) {
        if pins.is_empty() {
            return;
        }
        let objects = pins
            .iter()
            .map(|&p| self.graph.pin_name(p).to_string())
            .collect();
        errors.push(CheckError::new(category, pins.len(), objects));
    }

    /// Inputs with no input delay that drive something, excluding clock
    /// sources and inputs already reached by a clock.
    fn missing_input_delays(&self) -> Vec<PinId> {
        self.graph
            .pins_with_role(PinRole::PrimaryInput)
            .filter(|&pin| {
                !self.store.has_input_delay(pin)
                    && !self.graph.fanout(pin).is_empty()
                    && !self.store.is_clock_source(pin)
                    && !self.tags.has_clocked_arrival(pin)
            })
            .collect()
    }

    /// Driven outputs with no output delay.
    fn missing_output_delays(&self) -> Vec<PinId> {
        self.graph
            .pins_with_role(PinRole::PrimaryOutput)
            .filter(|&pin| !self.store.has_output_delay(pin) && !self.graph.fanin(pin).is_empty())
            .collect()
    }

    /// Register clock pins split into (several clocks, no clock).
    fn register_clock_pins(&self) -> (Vec<PinId>, Vec<PinId>) {
        let mut multiple = Vec::new();
        let mut none = Vec::new();
        for (pin, info) in self.graph.pins() {
            if !info.role.is_register_clock() {
                continue;
            }
            match self.tags.clock_arrivals(pin).len() {
                0 => none.push(pin),
                1 => {}
                _ => multiple.push(pin),
            }
        }
        (multiple, none)
    }

    /// Driven endpoints with no setup requirement and no max-delay
    /// exception.
    fn unconstrained_setups(&self) -> Vec<PinId> {
        self.graph
            .pins()
            .filter(|&(pin, info)| info.role.is_endpoint() && !self.graph.fanin(pin).is_empty())
            .filter(|&(pin, info)| match info.role {
                PinRole::RegisterData => !self.has_clocked_check(pin),
                _ => !self.tags.has_clocked_departure(pin),
            })
            .map(|(pin, _)| pin)
            .filter(|&pin| !self.store.has_max_delay(pin))
            .collect()
    }

    /// Whether a setup check reaches `pin` from a clocked pin.
    fn has_clocked_check(&self, pin: PinId) -> bool {
        self.graph.fanin(pin).iter().any(|&arc_id| {
            let arc = self.graph.arc(arc_id);
            arc.kind == TimingArcKind::SetupCheck && !self.tags.clock_arrivals(arc.from).is_empty()
        })
    }

    /// Names of generated clocks whose master does not reach their source.
    fn disconnected_generated_clocks(&self, loops: Option<&LoopSearch>) -> Vec<String> {
        self.store
            .generated_clocks()
            .filter(|(_, clock, generated)| {
                let master_missing = generated.master_name.is_some() && generated.master.is_none();
                let unreached = match (generated.source, generated.master) {
                    (None, _) => true,
                    (Some(source), Some(master)) => !self.tags.has_clock_arrival(source, master),
                    (Some(source), None) => self.tags.clock_arrivals(source).is_empty(),
                };
                let on_loop = loops.is_some_and(|search| {
                    generated.source.is_some_and(|s| search.contains(s))
                        || clock.sources.iter().any(|&p| search.contains(p))
                });
                master_missing || unreached || on_loop
            })
            .map(|(_, clock, _)| clock.name.clone())
            .collect()
    }
}
