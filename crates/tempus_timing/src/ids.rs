//! Opaque index newtypes for pins, arcs and clocks.
//!
//! All graph traversals address vertices and arcs by these indices rather
//! than by reference, so per-pin state (colours, tag sets) lives in plain
//! vectors sized to the graph.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index for addressing per-entity vectors.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// A pin or port vertex of the timing graph.
    PinId
);

define_id!(
    /// A timing arc of the timing graph.
    ArcId
);

define_id!(
    /// A declared clock, indexed in declaration order.
    ClockId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn index_matches_raw() {
        let id = PinId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn ids_order_by_index() {
        let set: BTreeSet<ClockId> = [2, 0, 1, 0].into_iter().map(ClockId::from_raw).collect();
        let raw: Vec<u32> = set.into_iter().map(ClockId::as_raw).collect();
        assert_eq!(raw, vec![0, 1, 2]);
    }

    #[test]
    fn serialized_as_bare_integer() {
        let json = serde_json::to_string(&ArcId::from_raw(5)).unwrap();
        assert_eq!(json, "5");
        let back: ArcId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ArcId::from_raw(5));
    }
}
