//! Constraint verification for the Tempus static timing analyzer.
//!
//! Before any delays are computed, a design has to be constrained well
//! enough for the numbers to mean something. This crate answers that
//! question for a circuit timing graph plus its SDC constraints:
//!
//! 1. [`TimingGraph`] holds the pins and timing arcs of the design.
//! 2. [`parse_sdc`] reads constraints into [`TimingConstraints`].
//! 3. [`ConstraintStore::bind`] resolves constraint names to graph pins.
//! 4. [`propagate_clock_tags`] labels every pin with the clocks reaching it.
//! 5. [`CheckTiming::check`] runs the selected checks and returns one
//!    [`CheckError`] group per problem category found.
//!
//! ```
//! use tempus_timing::*;
//!
//! let mut graph = TimingGraph::new();
//! let din = graph.add_pin("din", PinRole::PrimaryInput);
//! let dout = graph.add_pin("dout", PinRole::PrimaryOutput);
//! graph.add_arc(din, dout, TimingArcKind::Net);
//!
//! let store = ConstraintStore::for_graph(&graph);
//! let tags = propagate_clock_tags(&graph, &store);
//! let errors = CheckTiming::new(&graph, &store, &tags, CheckOptions::default())
//!     .check(CheckSet::all());
//! assert_eq!(
//!     errors.categories(),
//!     vec![
//!         CheckCategory::NoInputDelay,
//!         CheckCategory::NoOutputDelay,
//!         CheckCategory::UnconstrainedEndpoints,
//!     ]
//! );
//! ```

#![warn(missing_docs)]

pub mod check;
pub mod constraints;
pub mod graph;
pub mod ids;
pub mod loops;
pub mod message;
pub mod sdc;
pub mod search;
pub mod store;

pub use check::{CheckCategory, CheckError, CheckErrors, CheckOptions, CheckSet, CheckTiming};
pub use constraints::{ClockConstraint, GeneratedClock, IoDelay, MaxDelayPath, TimingConstraints};
pub use graph::{GraphError, Pin, PinRole, TimingArc, TimingArcKind, TimingGraph};
pub use ids::{ArcId, ClockId, PinId};
pub use loops::{find_combinational_loops, LoopOptions, LoopSearch};
pub use message::error_msg_subst;
pub use sdc::parse_sdc;
pub use search::{propagate_clock_tags, ClockTags, TagTable};
pub use store::{BoundClock, BoundGeneratedClock, ConstraintStore};
