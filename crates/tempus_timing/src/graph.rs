//! The circuit timing graph.
//!
//! Vertices are pins and ports, edges are timing arcs. The graph is read-only
//! for everything downstream of loading: the clock-tag search and the
//! constraint verifier only query it. Fan-in/fan-out adjacency and the name
//! index are derived data and are rebuilt when a graph is deserialized.
//!
//! The on-disk form is JSON with pins and arcs listed in id order:
//!
//! ```json
//! {
//!   "pins": [
//!     { "name": "in", "role": "PrimaryInput" },
//!     { "name": "u1/A", "role": "CellPin", "instance": "u1" }
//!   ],
//!   "arcs": [ { "from": 0, "to": 1, "kind": "Net" } ]
//! }
//! ```

use crate::ids::{ArcId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Errors raised while loading a timing graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The JSON text could not be parsed.
    #[error("malformed timing graph: {0}")]
    Json(#[from] serde_json::Error),

    /// An arc names a pin index past the end of the pin table.
    #[error("arc {arc} references pin {pin}, but the graph has {pin_count} pins")]
    UnknownPin {
        /// Position of the arc in the arc list.
        arc: usize,
        /// The out-of-range pin index.
        pin: u32,
        /// Number of pins in the graph.
        pin_count: usize,
    },

    /// Two pins share a name.
    #[error("duplicate pin name '{0}'")]
    DuplicatePin(String),
}

/// The timing dependency graph of a design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphParts")]
pub struct TimingGraph {
    pins: Vec<Pin>,
    arcs: Vec<TimingArc>,
    #[serde(skip)]
    fanout: Vec<Vec<ArcId>>,
    #[serde(skip)]
    fanin: Vec<Vec<ArcId>>,
    #[serde(skip)]
    by_name: HashMap<String, PinId>,
}

/// Serialized form of [`TimingGraph`], without derived indices.
#[derive(Deserialize)]
struct GraphParts {
    #[serde(default)]
    pins: Vec<Pin>,
    #[serde(default)]
    arcs: Vec<TimingArc>,
}

impl TryFrom<GraphParts> for TimingGraph {
    type Error = GraphError;

    fn try_from(parts: GraphParts) -> Result<Self, Self::Error> {
        let mut graph = TimingGraph::new();
        for pin in parts.pins {
            if graph.by_name.contains_key(&pin.name) {
                return Err(GraphError::DuplicatePin(pin.name));
            }
            graph.push_pin(pin);
        }
        let pin_count = graph.pins.len();
        for (position, arc) in parts.arcs.into_iter().enumerate() {
            for end in [arc.from, arc.to] {
                if end.index() >= pin_count {
                    return Err(GraphError::UnknownPin {
                        arc: position,
                        pin: end.as_raw(),
                        pin_count,
                    });
                }
            }
            graph.add_arc(arc.from, arc.to, arc.kind);
        }
        Ok(graph)
    }
}

impl TimingGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a graph from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, GraphError> {
        let parts: GraphParts = serde_json::from_str(text)?;
        Self::try_from(parts)
    }

    /// Serializes the graph to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds a top-level pin or port.
    ///
    /// Pin names are expected to be unique; if a name repeats, lookups by
    /// name keep resolving to the first pin.
    pub fn add_pin(&mut self, name: impl Into<String>, role: PinRole) -> PinId {
        self.push_pin(Pin {
            name: name.into(),
            role,
            instance: None,
        })
    }

    /// Adds pin `port` of cell instance `instance`, named `instance/port`.
    pub fn add_instance_pin(
        &mut self,
        instance: impl Into<String>,
        port: &str,
        role: PinRole,
    ) -> PinId {
        let instance = instance.into();
        self.push_pin(Pin {
            name: format!("{instance}/{port}"),
            role,
            instance: Some(instance),
        })
    }

    fn push_pin(&mut self, pin: Pin) -> PinId {
        let id = PinId::from_raw(self.pins.len() as u32);
        self.by_name.entry(pin.name.clone()).or_insert(id);
        self.pins.push(pin);
        self.fanout.push(Vec::new());
        self.fanin.push(Vec::new());
        id
    }

    /// Adds a timing arc between two existing pins.
    pub fn add_arc(&mut self, from: PinId, to: PinId, kind: TimingArcKind) -> ArcId {
        let id = ArcId::from_raw(self.arcs.len() as u32);
        self.arcs.push(TimingArc { from, to, kind });
        self.fanout[from.index()].push(id);
        self.fanin[to.index()].push(id);
        id
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.index()]
    }

    /// Returns the name of the pin with the given ID.
    pub fn pin_name(&self, id: PinId) -> &str {
        &self.pins[id.index()].name
    }

    /// Returns the arc with the given ID.
    pub fn arc(&self, id: ArcId) -> &TimingArc {
        &self.arcs[id.index()]
    }

    /// Iterates over pin IDs in index order.
    pub fn pin_ids(&self) -> impl Iterator<Item = PinId> + '_ {
        (0..self.pins.len() as u32).map(PinId::from_raw)
    }

    /// Iterates over pins in index order.
    pub fn pins(&self) -> impl Iterator<Item = (PinId, &Pin)> + '_ {
        self.pins
            .iter()
            .enumerate()
            .map(|(i, pin)| (PinId::from_raw(i as u32), pin))
    }

    /// Iterates over the pins with the given role, in index order.
    pub fn pins_with_role(&self, role: PinRole) -> impl Iterator<Item = PinId> + '_ {
        self.pins()
            .filter(move |(_, pin)| pin.role == role)
            .map(|(id, _)| id)
    }

    /// Iterates over arcs in index order.
    pub fn arcs(&self) -> impl Iterator<Item = (ArcId, &TimingArc)> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .map(|(i, arc)| (ArcId::from_raw(i as u32), arc))
    }

    /// Arcs leaving `pin`, in insertion order.
    pub fn fanout(&self, pin: PinId) -> &[ArcId] {
        &self.fanout[pin.index()]
    }

    /// Arcs arriving at `pin`, in insertion order.
    pub fn fanin(&self, pin: PinId) -> &[ArcId] {
        &self.fanin[pin.index()]
    }

    /// Looks up a pin by its full name.
    pub fn find_pin(&self, name: &str) -> Option<PinId> {
        self.by_name.get(name).copied()
    }

    /// Number of pins.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Number of arcs.
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }
}

/// A pin or port of the design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    /// Full hierarchical name (e.g. `u_core/ff0/CK`), or the port name.
    pub name: String,
    /// What the pin does in the design.
    pub role: PinRole,
    /// Owning cell instance, if the pin is not a top-level port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// The role a pin plays for timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinRole {
    /// A primary input port.
    PrimaryInput,
    /// A primary output port.
    PrimaryOutput,
    /// The clock pin of an edge-triggered register.
    RegisterClock,
    /// The enable pin of a transparent latch.
    LatchEnable,
    /// The data input of a register or latch.
    RegisterData,
    /// The output of a register or latch.
    RegisterOutput,
    /// Any other cell pin.
    CellPin,
}

impl PinRole {
    /// Clock or enable pin of a sequential element.
    pub fn is_register_clock(self) -> bool {
        matches!(self, PinRole::RegisterClock | PinRole::LatchEnable)
    }

    /// A pin where timing paths terminate.
    pub fn is_endpoint(self) -> bool {
        matches!(self, PinRole::RegisterData | PinRole::PrimaryOutput)
    }
}

/// A directed timing arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingArc {
    /// Driving pin.
    pub from: PinId,
    /// Driven pin.
    pub to: PinId,
    /// What relationship the arc models.
    pub kind: TimingArcKind,
}

/// The relationship a timing arc models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingArcKind {
    /// Wire from a driver to a load.
    Net,
    /// Combinational cell arc (input pin to output pin).
    Combinational,
    /// Register clock pin to register output.
    ClockToOutput,
    /// Transparent latch data pin to latch output.
    LatchDataToOutput,
    /// Setup check from a register clock pin to its data pin.
    SetupCheck,
    /// Hold check from a register clock pin to its data pin.
    HoldCheck,
}

impl TimingArcKind {
    /// Whether this arc crosses a state boundary and so cannot close a
    /// combinational loop. Latch data arcs count as state-breaking only when
    /// `latch_breaks_loops` is set.
    pub fn breaks_loops(self, latch_breaks_loops: bool) -> bool {
        match self {
            TimingArcKind::Net | TimingArcKind::Combinational => false,
            TimingArcKind::LatchDataToOutput => latch_breaks_loops,
            TimingArcKind::ClockToOutput | TimingArcKind::SetupCheck | TimingArcKind::HoldCheck => {
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph() {
        let g = TimingGraph::new();
        assert_eq!(g.pin_count(), 0);
        assert_eq!(g.arc_count(), 0);
        assert!(g.find_pin("anything").is_none());
    }

    #[test]
    fn add_pins_and_lookup() {
        let mut g = TimingGraph::new();
        let a = g.add_pin("in_a", PinRole::PrimaryInput);
        let ck = g.add_instance_pin("ff0", "CK", PinRole::RegisterClock);
        assert_eq!(a.as_raw(), 0);
        assert_eq!(ck.as_raw(), 1);
        assert_eq!(g.find_pin("ff0/CK"), Some(ck));
        assert_eq!(g.pin(ck).instance.as_deref(), Some("ff0"));
        assert_eq!(g.pin_name(a), "in_a");
    }

    #[test]
    fn adjacency_follows_insertion_order() {
        let mut g = TimingGraph::new();
        let a = g.add_pin("a", PinRole::PrimaryInput);
        let b = g.add_pin("b", PinRole::CellPin);
        let c = g.add_pin("c", PinRole::CellPin);
        let ab = g.add_arc(a, b, TimingArcKind::Net);
        let ac = g.add_arc(a, c, TimingArcKind::Net);
        let bc = g.add_arc(b, c, TimingArcKind::Combinational);
        assert_eq!(g.fanout(a), &[ab, ac]);
        assert_eq!(g.fanin(c), &[ac, bc]);
        assert!(g.fanin(a).is_empty());
        assert_eq!(g.arc(bc).kind, TimingArcKind::Combinational);
    }

    #[test]
    fn pins_with_role_filters() {
        let mut g = TimingGraph::new();
        g.add_pin("i0", PinRole::PrimaryInput);
        g.add_pin("o0", PinRole::PrimaryOutput);
        g.add_pin("i1", PinRole::PrimaryInput);
        let inputs: Vec<_> = g.pins_with_role(PinRole::PrimaryInput).collect();
        assert_eq!(inputs.len(), 2);
        assert_eq!(g.pin_name(inputs[1]), "i1");
    }

    #[test]
    fn role_predicates() {
        assert!(PinRole::RegisterClock.is_register_clock());
        assert!(PinRole::LatchEnable.is_register_clock());
        assert!(!PinRole::RegisterData.is_register_clock());
        assert!(PinRole::RegisterData.is_endpoint());
        assert!(PinRole::PrimaryOutput.is_endpoint());
        assert!(!PinRole::RegisterOutput.is_endpoint());
    }

    #[test]
    fn loop_breaking_arcs() {
        assert!(!TimingArcKind::Net.breaks_loops(true));
        assert!(!TimingArcKind::Combinational.breaks_loops(true));
        assert!(TimingArcKind::ClockToOutput.breaks_loops(false));
        assert!(TimingArcKind::SetupCheck.breaks_loops(false));
        assert!(TimingArcKind::LatchDataToOutput.breaks_loops(true));
        assert!(!TimingArcKind::LatchDataToOutput.breaks_loops(false));
    }

    #[test]
    fn json_roundtrip_rebuilds_indices() {
        let mut g = TimingGraph::new();
        let a = g.add_pin("a", PinRole::PrimaryInput);
        let y = g.add_instance_pin("u1", "Y", PinRole::CellPin);
        g.add_arc(a, y, TimingArcKind::Net);

        let json = g.to_json().unwrap();
        let restored = TimingGraph::from_json(&json).unwrap();
        assert_eq!(restored.pin_count(), 2);
        assert_eq!(restored.arc_count(), 1);
        assert_eq!(restored.find_pin("u1/Y"), Some(y));
        assert_eq!(restored.fanout(a).len(), 1);
        assert_eq!(restored.fanin(y).len(), 1);
    }

    #[test]
    fn json_rejects_dangling_arc() {
        let json = r#"{
            "pins": [ { "name": "a", "role": "PrimaryInput" } ],
            "arcs": [ { "from": 0, "to": 3, "kind": "Net" } ]
        }"#;
        let err = TimingGraph::from_json(json).unwrap_err();
        assert!(err.to_string().contains("arc 0 references pin 3"));
    }

    #[test]
    fn json_rejects_duplicate_names() {
        let json = r#"{
            "pins": [
                { "name": "a", "role": "PrimaryInput" },
                { "name": "a", "role": "CellPin" }
            ]
        }"#;
        let err = TimingGraph::from_json(json).unwrap_err();
        assert!(matches!(err, GraphError::DuplicatePin(name) if name == "a"));
    }

    #[test]
    fn json_rejects_garbage() {
        let err = TimingGraph::from_json("{ not json").unwrap_err();
        assert!(matches!(err, GraphError::Json(_)));
    }
}
