//! Graph data structures.
//!
//! The collaborator builds a [`GraphStore`] (petgraph's StableGraph underneath,
//! so handles stay stable across removals). When a layout run starts, the
//! store is frozen into a [`GraphSnapshot`]: a dense arena whose adjacency is
//! stored as index lists.

mod ids;
mod snapshot;
mod store;

pub use ids::{EdgeId, VertexId};
pub use snapshot::{GraphSnapshot, GraphSource};
pub use store::GraphStore;
