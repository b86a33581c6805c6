//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into dense `Vec`s via `id.0 as usize`, but callers should
//! prefer the `.index()` helpers for clarity.
//!
//! External string identifiers (node names from the map file, `"v{n}"`
//! vehicle ids on the wire) are interned to these integers at the boundary;
//! everything inside the engine works on dense indices.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to `u32::MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

typed_id! {
    /// Index of a road-network node.  Nodes are interned in lexicographic
    /// name order, so `NodeId` order equals name order.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed road-network edge in CSR order.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Sequential vehicle number.  The wire id is `"v{n}"`.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Sequential incident number, shared by accidents and blockages.
    pub struct IncidentId(u32);
}

impl VehicleId {
    /// The wire-format id string (`"v{n}"`).
    pub fn wire(self) -> String {
        format!("v{}", self.0)
    }

    /// Parse a wire-format id back to a `VehicleId`.
    pub fn from_wire(s: &str) -> Option<VehicleId> {
        s.strip_prefix('v').and_then(|n| n.parse().ok()).map(VehicleId)
    }
}
