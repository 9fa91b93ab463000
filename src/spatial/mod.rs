//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based spatial index over published vertex
//! positions for nearest-neighbor and range queries.

mod rtree;

pub use rtree::SpatialIndex;
