//! Stable vertex and edge handles.
//!
//! Handles are assigned by the [`GraphStore`](super::GraphStore) and stay
//! valid across removals of other vertices or edges. The layout engine never
//! hands out references into its own arena; callers always speak in handles.

use std::fmt;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

handle!(
    /// Vertex handle; a u32 so it crosses the wasm boundary unchanged.
    VertexId,
    "Vertex"
);

handle!(
    /// Edge handle, kept so the collaborator can remove an edge it added.
    EdgeId,
    "Edge"
);
