//! Constraints bound to graph pins.
//!
//! [`ConstraintStore`] is the verifier's view of the constraints: every name
//! in the SDC has been resolved against the [`TimingGraph`], and per-pin
//! questions ("does this port have an input delay?") are answered by index.
//! Names that do not resolve are reported once while binding and then
//! dropped.

use crate::constraints::TimingConstraints;
use crate::graph::{PinRole, TimingGraph};
use crate::ids::{ClockId, PinId};
use std::collections::HashMap;
use tempus_common::{Ident, Interner};
use tempus_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Location};

/// Diagnostic number for an object name with no matching pin.
const UNKNOWN_OBJECT: u16 = 10;
/// Diagnostic number for a reference to an undeclared clock.
const UNKNOWN_CLOCK: u16 = 11;

/// A declared clock with its sources resolved to pins.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundClock {
    /// Clock name.
    pub name: String,
    /// Period in nanoseconds (zero for generated clocks).
    pub period_ns: f64,
    /// Pins the clock is defined on.
    pub sources: Vec<PinId>,
    /// Generated-clock derivation, if any.
    pub generated: Option<BoundGeneratedClock>,
}

/// The master relationship of a generated clock.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundGeneratedClock {
    /// The `-master_clock` name as written, if one was given.
    pub master_name: Option<String>,
    /// The named master, when it is a declared clock.
    pub master: Option<ClockId>,
    /// The `-source` pin name as written.
    pub source_name: String,
    /// The `-source` pin, when it exists in the graph.
    pub source: Option<PinId>,
}

/// Constraints indexed by pin and by clock.
#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    clocks: Vec<BoundClock>,
    clock_by_name: HashMap<String, ClockId>,
    clocks_at: Vec<Vec<ClockId>>,
    input_delays: Vec<Option<Vec<ClockId>>>,
    output_delays: Vec<Option<Vec<ClockId>>>,
    max_delay_to: Vec<bool>,
}

impl ConstraintStore {
    /// Creates an empty store sized for `graph`.
    pub fn for_graph(graph: &TimingGraph) -> Self {
        let pins = graph.pin_count();
        Self {
            clocks: Vec::new(),
            clock_by_name: HashMap::new(),
            clocks_at: vec![Vec::new(); pins],
            input_delays: vec![None; pins],
            output_delays: vec![None; pins],
            max_delay_to: vec![false; pins],
        }
    }

    /// Resolves `constraints` against `graph`.
    ///
    /// Unknown pins and undeclared clocks are reported to `sink` as warnings
    /// at the location of the command that named them. An I/O delay whose
    /// clock is undeclared is kept as an unclocked delay.
    pub fn bind(
        constraints: &TimingConstraints,
        graph: &TimingGraph,
        interner: &Interner,
        sink: &DiagnosticSink,
    ) -> Self {
        let mut store = Self::for_graph(graph);
        let binder = Binder {
            graph,
            interner,
            sink,
        };

        for clock in &constraints.clocks {
            let name = interner.resolve(clock.name);
            let mut sources = Vec::new();
            for &source in &clock.sources {
                sources.extend(binder.pins(source, None, clock.origin.as_ref()));
            }
            match &clock.generated {
                None => {
                    store.add_clock(name, clock.period_ns, sources);
                }
                Some(generated) => {
                    let source_name = interner.resolve(generated.source);
                    let source = graph.find_pin(source_name);
                    if source.is_none() {
                        binder.unknown_object(source_name, clock.origin.as_ref());
                    }
                    store.add_generated_clock(
                        name,
                        generated.master.map(|m| interner.resolve(m)),
                        source_name,
                        source,
                        sources,
                    );
                }
            }
        }
        store.resolve_masters();

        for delay in &constraints.input_delays {
            let clock = store.bind_clock_ref(&binder, delay.clock, delay.origin.as_ref());
            for pin in binder.pins(delay.port, Some(PinRole::PrimaryInput), delay.origin.as_ref()) {
                store.set_input_delay(pin, clock);
            }
        }
        for delay in &constraints.output_delays {
            let clock = store.bind_clock_ref(&binder, delay.clock, delay.origin.as_ref());
            for pin in binder.pins(delay.port, Some(PinRole::PrimaryOutput), delay.origin.as_ref()) {
                store.set_output_delay(pin, clock);
            }
        }
        for path in &constraints.max_delay_paths {
            for &to in &path.to {
                for pin in binder.pins(to, None, path.origin.as_ref()) {
                    store.set_max_delay_to(pin);
                }
            }
        }

        tracing::debug!(
            clocks = store.clock_count(),
            input_delays = store.input_delays.iter().flatten().count(),
            output_delays = store.output_delays.iter().flatten().count(),
            "bound constraints"
        );
        store
    }

    /// Declares a clock on `sources`. Redefining a name replaces the earlier
    /// clock and keeps its id.
    pub fn add_clock(&mut self, name: &str, period_ns: f64, sources: Vec<PinId>) -> ClockId {
        self.insert_clock(BoundClock {
            name: name.to_string(),
            period_ns,
            sources,
            generated: None,
        })
    }

    /// Declares a generated clock on `targets`, derived through the pin
    /// `source`. `master` is the `-master_clock` name; it is resolved against
    /// the clocks declared so far, and again by [`bind`](Self::bind) once all
    /// clocks are known.
    pub fn add_generated_clock(
        &mut self,
        name: &str,
        master: Option<&str>,
        source_name: &str,
        source: Option<PinId>,
        targets: Vec<PinId>,
    ) -> ClockId {
        let master_id = master.and_then(|m| self.find_clock(m));
        self.insert_clock(BoundClock {
            name: name.to_string(),
            period_ns: 0.0,
            sources: targets,
            generated: Some(BoundGeneratedClock {
                master_name: master.map(str::to_string),
                master: master_id,
                source_name: source_name.to_string(),
                source,
            }),
        })
    }

    fn insert_clock(&mut self, clock: BoundClock) -> ClockId {
        let id = match self.clock_by_name.get(&clock.name) {
            Some(&existing) => {
                for pins in &mut self.clocks_at {
                    pins.retain(|&c| c != existing);
                }
                self.clocks[existing.index()] = clock;
                existing
            }
            None => {
                let id = ClockId::from_raw(self.clocks.len() as u32);
                self.clock_by_name.insert(clock.name.clone(), id);
                self.clocks.push(clock);
                id
            }
        };
        for &pin in &self.clocks[id.index()].sources {
            if let Some(at) = self.clocks_at.get_mut(pin.index()) {
                if !at.contains(&id) {
                    at.push(id);
                }
            }
        }
        id
    }

    fn resolve_masters(&mut self) {
        let by_name = &self.clock_by_name;
        for clock in &mut self.clocks {
            if let Some(generated) = &mut clock.generated {
                if generated.master.is_none() {
                    generated.master = generated
                        .master_name
                        .as_deref()
                        .and_then(|m| by_name.get(m).copied());
                }
            }
        }
    }

    fn bind_clock_ref(
        &self,
        binder: &Binder<'_>,
        clock: Option<Ident>,
        origin: Option<&Location>,
    ) -> Option<ClockId> {
        let name = binder.interner.resolve(clock?);
        let id = self.find_clock(name);
        if id.is_none() {
            binder.warn(
                UNKNOWN_CLOCK,
                format!("clock '{name}' is not declared; delay treated as unclocked"),
                origin,
            );
        }
        id
    }

    /// Records an input delay on `pin`, relative to `clock` if given.
    pub fn set_input_delay(&mut self, pin: PinId, clock: Option<ClockId>) {
        record_delay(&mut self.input_delays, pin, clock);
    }

    /// Records an output delay on `pin`, relative to `clock` if given.
    pub fn set_output_delay(&mut self, pin: PinId, clock: Option<ClockId>) {
        record_delay(&mut self.output_delays, pin, clock);
    }

    /// Records a `set_max_delay -to` exception ending at `pin`.
    pub fn set_max_delay_to(&mut self, pin: PinId) {
        if let Some(flag) = self.max_delay_to.get_mut(pin.index()) {
            *flag = true;
        }
    }

    /// All declared clocks, in id order.
    pub fn clocks(&self) -> impl Iterator<Item = (ClockId, &BoundClock)> + '_ {
        self.clocks
            .iter()
            .enumerate()
            .map(|(i, c)| (ClockId::from_raw(i as u32), c))
    }

    /// Generated clocks only, in id order.
    pub fn generated_clocks(
        &self,
    ) -> impl Iterator<Item = (ClockId, &BoundClock, &BoundGeneratedClock)> + '_ {
        self.clocks()
            .filter_map(|(id, c)| c.generated.as_ref().map(|g| (id, c, g)))
    }

    /// Returns a clock by id.
    pub fn clock(&self, id: ClockId) -> &BoundClock {
        &self.clocks[id.index()]
    }

    /// Looks a clock up by name.
    pub fn find_clock(&self, name: &str) -> Option<ClockId> {
        self.clock_by_name.get(name).copied()
    }

    /// Number of declared clocks.
    pub fn clock_count(&self) -> usize {
        self.clocks.len()
    }

    /// Clocks defined directly on `pin`.
    pub fn clocks_defined_at(&self, pin: PinId) -> &[ClockId] {
        self.clocks_at.get(pin.index()).map_or(&[], Vec::as_slice)
    }

    /// Whether some clock is defined on `pin`.
    pub fn is_clock_source(&self, pin: PinId) -> bool {
        !self.clocks_defined_at(pin).is_empty()
    }

    /// Whether `pin` has any input delay.
    pub fn has_input_delay(&self, pin: PinId) -> bool {
        matches!(self.input_delays.get(pin.index()), Some(Some(_)))
    }

    /// Whether `pin` has any output delay.
    pub fn has_output_delay(&self, pin: PinId) -> bool {
        matches!(self.output_delays.get(pin.index()), Some(Some(_)))
    }

    /// Reference clocks of the input delays on `pin`.
    pub fn input_delay_clocks(&self, pin: PinId) -> &[ClockId] {
        delay_clocks(&self.input_delays, pin)
    }

    /// Reference clocks of the output delays on `pin`.
    pub fn output_delay_clocks(&self, pin: PinId) -> &[ClockId] {
        delay_clocks(&self.output_delays, pin)
    }

    /// Whether a `set_max_delay -to` exception ends at `pin`.
    pub fn has_max_delay(&self, pin: PinId) -> bool {
        self.max_delay_to.get(pin.index()).copied().unwrap_or(false)
    }
}

fn record_delay(delays: &mut [Option<Vec<ClockId>>], pin: PinId, clock: Option<ClockId>) {
    if let Some(slot) = delays.get_mut(pin.index()) {
        let clocks = slot.get_or_insert_with(Vec::new);
        if let Some(clock) = clock {
            if !clocks.contains(&clock) {
                clocks.push(clock);
            }
        }
    }
}

fn delay_clocks(delays: &[Option<Vec<ClockId>>], pin: PinId) -> &[ClockId] {
    match delays.get(pin.index()) {
        Some(Some(clocks)) => clocks,
        _ => &[],
    }
}

/// Resolves SDC object names to pins.
struct Binder<'a> {
    graph: &'a TimingGraph,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
}

impl Binder<'_> {
    /// Resolves one object name. Wildcard patterns match against pins of
    /// `role` (all pins when `None`); an exact name matches any pin.
    fn pins(&self, name: Ident, role: Option<PinRole>, origin: Option<&Location>) -> Vec<PinId> {
        let name = self.interner.resolve(name);
        if name.contains(['*', '?']) {
            let matched: Vec<PinId> = self
                .graph
                .pins()
                .filter(|(_, pin)| role.map_or(true, |r| pin.role == r))
                .filter(|(_, pin)| glob_match(name, &pin.name))
                .map(|(id, _)| id)
                .collect();
            if matched.is_empty() {
                self.unknown_object(name, origin);
            }
            return matched;
        }
        match self.graph.find_pin(name) {
            Some(pin) => vec![pin],
            None => {
                self.unknown_object(name, origin);
                Vec::new()
            }
        }
    }

    fn unknown_object(&self, name: &str, origin: Option<&Location>) {
        self.warn(
            UNKNOWN_OBJECT,
            format!("'{name}' matches no pin or port in the design"),
            origin,
        );
    }

    fn warn(&self, number: u16, message: String, origin: Option<&Location>) {
        let mut diag = Diagnostic::warning(DiagnosticCode::new(Category::Sdc, number), message);
        if let Some(origin) = origin {
            diag = diag.at(origin.clone());
        }
        self.sink.emit(diag);
    }
}

/// Matches `name` against a pattern where `*` is any run and `?` any one
/// character.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((sp, sn)) = star {
            p = sp + 1;
            n = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}
