//! Combinational loop detection.
//!
//! Tarjan's strongly connected components over the arcs that do not cross a
//! state boundary, run with an explicit stack so deep netlists do not
//! overflow the call stack. Each component that can cycle yields one loop:
//! the shortest cycle through its lowest-id pin. The set of loops therefore
//! depends only on the graph's connectivity, not on the order pins were
//! added.

use crate::graph::TimingGraph;
use crate::ids::PinId;
use std::collections::{HashMap, VecDeque};

/// Traversal options for [`find_combinational_loops`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    /// Treat latch data-to-output arcs as state boundaries.
    pub latch_breaks_loops: bool,
    /// Stop after visiting this many vertices.
    pub vertex_budget: Option<usize>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            latch_breaks_loops: true,
            vertex_budget: None,
        }
    }
}

/// Result of a loop search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSearch {
    /// One representative cycle per looping component, starting at the
    /// component's lowest-id pin. Ordered by that pin.
    pub loops: Vec<Vec<PinId>>,
    /// Every pin of each looping component, sorted. Parallel to `loops`.
    pub components: Vec<Vec<PinId>>,
    /// False when the vertex budget ran out before the whole graph was seen.
    pub complete: bool,
    /// Number of vertices visited.
    pub visited: usize,
}

impl LoopSearch {
    /// Whether `pin` belongs to a looping component.
    pub fn contains(&self, pin: PinId) -> bool {
        self.components
            .iter()
            .any(|c| c.binary_search(&pin).is_ok())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Per-pin traversal state for the component search.
struct Traversal {
    colour: Vec<Colour>,
    order: Vec<usize>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    component_stack: Vec<PinId>,
    // (pin, index of the next fanout arc to follow)
    stack: Vec<(PinId, usize)>,
    visited: usize,
}

impl Traversal {
    fn new(pins: usize) -> Self {
        Self {
            colour: vec![Colour::White; pins],
            order: vec![0; pins],
            low: vec![0; pins],
            on_stack: vec![false; pins],
            component_stack: Vec::new(),
            stack: Vec::new(),
            visited: 0,
        }
    }

    fn discover(&mut self, pin: PinId) {
        let i = pin.index();
        self.colour[i] = Colour::Grey;
        self.order[i] = self.visited;
        self.low[i] = self.visited;
        self.on_stack[i] = true;
        self.component_stack.push(pin);
        self.stack.push((pin, 0));
        self.visited += 1;
    }

    /// Pops the component rooted at `root` off the component stack.
    fn pop_component(&mut self, root: PinId) -> Vec<PinId> {
        let mut members = Vec::new();
        while let Some(member) = self.component_stack.pop() {
            self.on_stack[member.index()] = false;
            members.push(member);
            if member == root {
                break;
            }
        }
        members
    }
}

/// Finds the combinational loops of `graph`.
///
/// A strongly connected component with two or more pins, or a single pin
/// with an arc to itself, is a loop. Components still open when the budget
/// runs out are not reported.
pub fn find_combinational_loops(graph: &TimingGraph, options: &LoopOptions) -> LoopSearch {
    let mut t = Traversal::new(graph.pin_count());
    let mut components: Vec<Vec<PinId>> = Vec::new();
    let mut complete = true;

    let within_budget = |visited: usize| options.vertex_budget.map_or(true, |b| visited < b);

    'roots: for root in graph.pin_ids() {
        if t.colour[root.index()] != Colour::White {
            continue;
        }
        if !within_budget(t.visited) {
            complete = false;
            break;
        }
        t.discover(root);

        while let Some(top) = t.stack.last_mut() {
            let (pin, next) = *top;
            let fanout = graph.fanout(pin);
            if next >= fanout.len() {
                t.stack.pop();
                t.colour[pin.index()] = Colour::Black;
                if let Some(&(parent, _)) = t.stack.last() {
                    t.low[parent.index()] = t.low[parent.index()].min(t.low[pin.index()]);
                }
                if t.low[pin.index()] == t.order[pin.index()] {
                    let mut members = t.pop_component(pin);
                    if members.len() > 1 || has_self_arc(graph, options, pin) {
                        members.sort_unstable();
                        components.push(members);
                    }
                }
                continue;
            }
            top.1 += 1;

            let arc = graph.arc(fanout[next]);
            if arc.kind.breaks_loops(options.latch_breaks_loops) {
                continue;
            }
            let to = arc.to;
            if t.colour[to.index()] == Colour::White {
                if !within_budget(t.visited) {
                    complete = false;
                    break 'roots;
                }
                t.discover(to);
            } else if t.on_stack[to.index()] {
                t.low[pin.index()] = t.low[pin.index()].min(t.order[to.index()]);
            }
        }
    }

    components.sort_unstable_by_key(|c| c[0]);
    let loops: Vec<Vec<PinId>> = components
        .iter()
        .filter_map(|members| shortest_cycle(graph, options, members))
        .collect();
    tracing::trace!(loops = loops.len(), visited = t.visited, complete, "loop search");

    LoopSearch {
        loops,
        components,
        complete,
        visited: t.visited,
    }
}

fn has_self_arc(graph: &TimingGraph, options: &LoopOptions, pin: PinId) -> bool {
    graph.fanout(pin).iter().any(|&arc_id| {
        let arc = graph.arc(arc_id);
        arc.to == pin && !arc.kind.breaks_loops(options.latch_breaks_loops)
    })
}

/// Breadth-first search from the component's lowest-id pin back to itself,
/// staying inside the component. `members` is sorted and non-empty.
fn shortest_cycle(
    graph: &TimingGraph,
    options: &LoopOptions,
    members: &[PinId],
) -> Option<Vec<PinId>> {
    let start = *members.first()?;
    let mut parent: HashMap<PinId, PinId> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(pin) = queue.pop_front() {
        for &arc_id in graph.fanout(pin) {
            let arc = graph.arc(arc_id);
            if arc.kind.breaks_loops(options.latch_breaks_loops)
                || members.binary_search(&arc.to).is_err()
            {
                continue;
            }
            if arc.to == start {
                let mut cycle = vec![pin];
                let mut cursor = pin;
                while let Some(&prev) = parent.get(&cursor) {
                    cycle.push(prev);
                    cursor = prev;
                }
                cycle.reverse();
                return Some(cycle);
            }
            if !parent.contains_key(&arc.to) {
                parent.insert(arc.to, pin);
                queue.push_back(arc.to);
            }
        }
    }
    None
}

/// Renders a loop as `a -> b -> c -> a`.
pub fn format_loop(graph: &TimingGraph, cycle: &[PinId]) -> String {
    let mut names: Vec<&str> = cycle.iter().map(|&p| graph.pin_name(p)).collect();
    if let Some(&first) = names.first() {
        names.push(first);
    }
    names.join(" -> ")
}
