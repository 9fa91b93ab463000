//! Hit testing over published vertex positions.
//!
//! Points are stored as rstar `GeomWithData` pairs of `[x, y]` and the vertex
//! handle. The index is bulk-loaded on every publish and patched in place when
//! a single vertex is dragged.

use rstar::primitives::GeomWithData;
use rstar::{AABB, PointDistance, RTree};

use crate::graph::VertexId;
use crate::layout::{Bounds, Vec2};

type Entry = GeomWithData<[f64; 2], VertexId>;

fn entry(id: VertexId, at: Vec2) -> Entry {
    GeomWithData::new([at.x, at.y], id)
}

/// R*-tree of published vertex positions.
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<Entry>,
}

impl SpatialIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole index.
    pub fn rebuild(&mut self, points: impl IntoIterator<Item = (VertexId, Vec2)>) {
        let entries = points.into_iter().map(|(id, at)| entry(id, at)).collect();
        self.tree = RTree::bulk_load(entries);
    }

    /// Move one vertex from `from` to `to`. Returns false, leaving the index
    /// untouched, if the vertex was not indexed at `from`.
    pub fn relocate(&mut self, id: VertexId, from: Vec2, to: Vec2) -> bool {
        if self.tree.remove(&entry(id, from)).is_none() {
            return false;
        }
        self.tree.insert(entry(id, to));
        true
    }

    /// Nearest vertex to `at`; `None` only when the index is empty.
    pub fn nearest(&self, at: Vec2) -> Option<VertexId> {
        self.tree.nearest_neighbor(&[at.x, at.y]).map(|e| e.data)
    }

    /// Nearest vertex no further than `max_distance` from `at`.
    pub fn nearest_within(&self, at: Vec2, max_distance: f64) -> Option<VertexId> {
        let query = [at.x, at.y];
        self.tree
            .nearest_neighbor(&query)
            .filter(|e| e.distance_2(&query) <= max_distance * max_distance)
            .map(|e| e.data)
    }

    /// Vertices inside `rect`, edges included.
    pub fn in_rect(&self, rect: Bounds) -> Vec<VertexId> {
        let envelope = AABB::from_corners([rect.min_x, rect.min_y], [rect.max_x, rect.max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|e| e.data)
            .collect()
    }

    /// Vertices within `radius` of `at`.
    pub fn within(&self, at: Vec2, radius: f64) -> Vec<VertexId> {
        self.tree
            .locate_within_distance([at.x, at.y], radius * radius)
            .map(|e| e.data)
            .collect()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}
