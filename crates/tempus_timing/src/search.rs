//! Clock-tag search.
//!
//! Labels every pin with the clocks that reach it, without computing any
//! delays. Two kinds of tag flow through the graph:
//!
//! - **clock tags** start at clock definition pins and follow net and
//!   combinational arcs through the clock network;
//! - **data tags** are created where a clock tag crosses a clock-to-output
//!   arc (the register launches data on that clock), or at an input port
//!   whose input delay names a clock. They follow net, combinational and
//!   latch data arcs.
//!
//! A pin that has a clock defined on it blocks incoming clock tags, so a
//! generated clock replaces its master downstream of its definition point.
//! Timing check arcs carry nothing.

use crate::graph::{TimingArcKind, TimingGraph};
use crate::ids::{ClockId, PinId};
use crate::store::ConstraintStore;
use std::collections::{BTreeSet, VecDeque};

/// Per-pin clock reachability, as consumed by the constraint verifier.
pub trait ClockTags {
    /// Distinct clocks arriving at `pin` through the clock network, in id
    /// order.
    fn clock_arrivals(&self, pin: PinId) -> Vec<ClockId>;

    /// Whether any clock, as a clock or as launched data, reaches `pin`.
    fn has_clocked_arrival(&self, pin: PinId) -> bool;

    /// Whether `clock` arrives at `pin` through the clock network.
    fn has_clock_arrival(&self, pin: PinId, clock: ClockId) -> bool {
        self.clock_arrivals(pin).contains(&clock)
    }

    /// Whether the output port `pin` is required relative to a declared
    /// clock.
    fn has_clocked_departure(&self, pin: PinId) -> bool;
}

/// Tag sets for every pin of a graph, built by [`propagate_clock_tags`].
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    clock_tags: Vec<BTreeSet<ClockId>>,
    data_tags: Vec<BTreeSet<ClockId>>,
    departures: Vec<bool>,
}

impl TagTable {
    /// Number of pins carrying at least one tag.
    pub fn tagged_pin_count(&self) -> usize {
        self.clock_tags
            .iter()
            .zip(&self.data_tags)
            .filter(|(c, d)| !c.is_empty() || !d.is_empty())
            .count()
    }
}

impl ClockTags for TagTable {
    fn clock_arrivals(&self, pin: PinId) -> Vec<ClockId> {
        self.clock_tags
            .get(pin.index())
            .map(|tags| tags.iter().copied().collect())
            .unwrap_or_default()
    }

    fn has_clocked_arrival(&self, pin: PinId) -> bool {
        let i = pin.index();
        self.clock_tags.get(i).is_some_and(|t| !t.is_empty())
            || self.data_tags.get(i).is_some_and(|t| !t.is_empty())
    }

    fn has_clock_arrival(&self, pin: PinId, clock: ClockId) -> bool {
        self.clock_tags
            .get(pin.index())
            .is_some_and(|t| t.contains(&clock))
    }

    fn has_clocked_departure(&self, pin: PinId) -> bool {
        self.departures.get(pin.index()).copied().unwrap_or(false)
    }
}

/// Propagates clock and data tags from the clock definitions and I/O delays
/// in `store` through `graph`.
///
/// Runs to a fixed point with a worklist, so cycles in the graph terminate:
/// tag sets only grow and are bounded by the number of clocks.
pub fn propagate_clock_tags(graph: &TimingGraph, store: &ConstraintStore) -> TagTable {
    let pins = graph.pin_count();
    let mut table = TagTable {
        clock_tags: vec![BTreeSet::new(); pins],
        data_tags: vec![BTreeSet::new(); pins],
        departures: vec![false; pins],
    };
    let mut queue = VecDeque::new();
    let mut queued = vec![false; pins];

    for pin in graph.pin_ids() {
        let i = pin.index();
        table.clock_tags[i].extend(store.clocks_defined_at(pin).iter().copied());
        table.data_tags[i].extend(store.input_delay_clocks(pin).iter().copied());
        table.departures[i] = !store.output_delay_clocks(pin).is_empty();
        if !table.clock_tags[i].is_empty() || !table.data_tags[i].is_empty() {
            queue.push_back(pin);
            queued[i] = true;
        }
    }

    let mut visits = 0usize;
    while let Some(pin) = queue.pop_front() {
        queued[pin.index()] = false;
        visits += 1;
        let clocks: Vec<ClockId> = table.clock_tags[pin.index()].iter().copied().collect();
        let data: Vec<ClockId> = table.data_tags[pin.index()].iter().copied().collect();

        for &arc_id in graph.fanout(pin) {
            let arc = graph.arc(arc_id);
            let to = arc.to.index();
            let changed = match arc.kind {
                TimingArcKind::Net | TimingArcKind::Combinational => {
                    let mut changed = insert_all(&mut table.data_tags[to], &data);
                    if !store.is_clock_source(arc.to) {
                        changed |= insert_all(&mut table.clock_tags[to], &clocks);
                    }
                    changed
                }
                TimingArcKind::ClockToOutput => insert_all(&mut table.data_tags[to], &clocks),
                TimingArcKind::LatchDataToOutput => insert_all(&mut table.data_tags[to], &data),
                TimingArcKind::SetupCheck | TimingArcKind::HoldCheck => false,
            };
            if changed && !queued[to] {
                queued[to] = true;
                queue.push_back(arc.to);
            }
        }
    }

    tracing::trace!(
        visits,
        tagged = table.tagged_pin_count(),
        "clock tag propagation finished"
    );
    table
}

fn insert_all(set: &mut BTreeSet<ClockId>, tags: &[ClockId]) -> bool {
    let before = set.len();
    set.extend(tags.iter().copied());
    set.len() != before
}
