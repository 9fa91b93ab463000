//! GraphStore - the mutable graph the collaborator builds before layout.
//!
//! The store keeps topology in petgraph's StableGraph so vertex and edge
//! handles survive removals, plus an optional seed position per vertex slot.
//! The layout engine never reads the store directly: it takes a
//! [`GraphSnapshot`](super::GraphSnapshot) through the [`GraphSource`] trait.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::ids::{EdgeId, VertexId};
use super::snapshot::GraphSource;

/// Mutable undirected graph with stable handles.
pub struct GraphStore {
    /// The underlying graph structure. Vertices store their stable VertexId.
    graph: StableUnGraph<VertexId, ()>,

    /// Map from stable VertexId to petgraph NodeIndex
    vertex_id_to_index: HashMap<VertexId, NodeIndex>,

    /// Map from stable EdgeId to petgraph EdgeIndex
    edge_id_to_index: HashMap<EdgeId, EdgeIndex>,

    /// Reverse map from petgraph EdgeIndex to stable EdgeId (for O(1) lookup during removal)
    edge_index_to_id: HashMap<EdgeIndex, EdgeId>,

    /// Next vertex ID to assign
    next_vertex_id: u32,

    /// Next edge ID to assign
    next_edge_id: u32,

    /// Seed positions indexed by petgraph slot; `None` means "place randomly".
    seeds: Vec<Option<(f64, f64)>>,
}

impl GraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            graph: StableUnGraph::default(),
            vertex_id_to_index: HashMap::new(),
            edge_id_to_index: HashMap::new(),
            edge_index_to_id: HashMap::new(),
            next_vertex_id: 0,
            next_edge_id: 0,
            seeds: Vec::new(),
        }
    }

    /// Create a store with pre-allocated capacity.
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableUnGraph::with_capacity(vertex_capacity, edge_capacity),
            vertex_id_to_index: HashMap::with_capacity(vertex_capacity),
            edge_id_to_index: HashMap::with_capacity(edge_capacity),
            edge_index_to_id: HashMap::with_capacity(edge_capacity),
            next_vertex_id: 0,
            next_edge_id: 0,
            seeds: Vec::with_capacity(vertex_capacity),
        }
    }

    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Add a vertex that the layout will place at a random initial position.
    pub fn add_vertex(&mut self) -> VertexId {
        self.insert_vertex(None)
    }

    /// Add a vertex with a fixed initial position.
    pub fn add_vertex_at(&mut self, x: f64, y: f64) -> VertexId {
        self.insert_vertex(Some((x, y)))
    }

    /// Add multiple seeded vertices from a positions array [x0, y0, x1, y1, ...].
    pub fn add_vertices_from_positions(&mut self, positions: &[f64]) -> Vec<VertexId> {
        let count = positions.len() / 2;
        self.vertex_id_to_index.reserve(count);
        self.seeds.reserve(count);

        positions
            .chunks_exact(2)
            .map(|xy| self.add_vertex_at(xy[0], xy[1]))
            .collect()
    }

    fn insert_vertex(&mut self, seed: Option<(f64, f64)>) -> VertexId {
        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id += 1;

        let index = self.graph.add_node(id);
        self.vertex_id_to_index.insert(id, index);

        let slot = index.index();
        if slot >= self.seeds.len() {
            self.seeds.resize(slot + 1, None);
        }
        self.seeds[slot] = seed;
        id
    }

    /// Remove a vertex and all its incident edges.
    pub fn remove_vertex(&mut self, id: VertexId) -> bool {
        let Some(index) = self.vertex_id_to_index.remove(&id) else {
            return false;
        };

        let edges: Vec<_> = self.graph.edges(index).map(|e| e.id()).collect();
        for edge_index in edges {
            if let Some(edge_id) = self.edge_index_to_id.remove(&edge_index) {
                self.edge_id_to_index.remove(&edge_id);
            }
        }

        if let Some(seed) = self.seeds.get_mut(index.index()) {
            *seed = None;
        }

        self.graph.remove_node(index);
        true
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.graph.node_count() as u32
    }

    /// Check whether a handle names a live vertex.
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertex_id_to_index.contains_key(&id)
    }

    /// Get a vertex's seed position, if it was added with one.
    pub fn seed_position(&self, id: VertexId) -> Option<(f64, f64)> {
        let index = self.vertex_id_to_index.get(&id)?;
        self.seeds.get(index.index()).copied().flatten()
    }

    /// Live vertex handles in ascending order.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<_> = self.vertex_id_to_index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add an undirected edge between two vertices.
    ///
    /// Returns None if either endpoint does not exist.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let a_index = *self.vertex_id_to_index.get(&a)?;
        let b_index = *self.vertex_id_to_index.get(&b)?;

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;

        let index = self.graph.add_edge(a_index, b_index, ());
        self.edge_id_to_index.insert(id, index);
        self.edge_index_to_id.insert(index, id);

        Some(id)
    }

    /// Add edges from pairs [a0, b0, a1, b1, ...].
    ///
    /// Returns the number of edges added; pairs naming a missing vertex are skipped.
    pub fn add_edges_from_pairs(&mut self, pairs: &[u32]) -> u32 {
        let mut added = 0;
        for pair in pairs.chunks_exact(2) {
            if self.add_edge(VertexId(pair[0]), VertexId(pair[1])).is_some() {
                added += 1;
            }
        }
        added
    }

    /// Remove an edge.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        if let Some(index) = self.edge_id_to_index.remove(&id) {
            self.edge_index_to_id.remove(&index);
            self.graph.remove_edge(index);
            true
        } else {
            false
        }
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> u32 {
        self.graph.edge_count() as u32
    }

    /// Get the distinct neighbours of a vertex, excluding itself.
    pub fn get_neighbors(&self, id: VertexId) -> Vec<VertexId> {
        let Some(&index) = self.vertex_id_to_index.get(&id) else {
            return Vec::new();
        };

        let mut neighbors: Vec<VertexId> = Vec::new();
        for n in self.graph.neighbors(index) {
            if let Some(&other) = self.graph.node_weight(n) {
                if other != id && !neighbors.contains(&other) {
                    neighbors.push(other);
                }
            }
        }
        neighbors
    }

    /// Clear all vertices and edges, resetting the store to its initial state.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.vertex_id_to_index.clear();
        self.edge_id_to_index.clear();
        self.edge_index_to_id.clear();
        self.next_vertex_id = 0;
        self.next_edge_id = 0;
        self.seeds.clear();
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSource for GraphStore {
    fn vertices(&self) -> Vec<VertexId> {
        self.vertex_ids()
    }

    fn neighbors(&self, id: VertexId) -> Vec<VertexId> {
        self.get_neighbors(id)
    }

    fn seed_position(&self, id: VertexId) -> Option<(f64, f64)> {
        GraphStore::seed_position(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_vertex() {
        let mut store = GraphStore::new();
        let id = store.add_vertex_at(10.0, 20.0);

        assert_eq!(store.vertex_count(), 1);
        assert_eq!(store.seed_position(id), Some((10.0, 20.0)));
    }

    #[test]
    fn test_unseeded_vertex_has_no_position() {
        let mut store = GraphStore::new();
        let id = store.add_vertex();
        assert_eq!(store.seed_position(id), None);
        assert!(store.contains_vertex(id));
    }

    #[test]
    fn test_add_multiple_vertices() {
        let mut store = GraphStore::new();
        let positions = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let ids = store.add_vertices_from_positions(&positions);
        assert_eq!(ids.len(), 3);
        assert_eq!(store.vertex_count(), 3);
        assert_eq!(store.seed_position(ids[2]), Some((2.0, 2.0)));
    }

    #[test]
    fn test_add_edge_is_undirected() {
        let mut store = GraphStore::new();
        let a = store.add_vertex();
        let b = store.add_vertex();

        assert!(store.add_edge(a, b).is_some());
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.get_neighbors(a), vec![b]);
        assert_eq!(store.get_neighbors(b), vec![a]);
    }

    #[test]
    fn test_add_edge_missing_endpoint() {
        let mut store = GraphStore::new();
        let a = store.add_vertex();
        assert!(store.add_edge(a, VertexId(99)).is_none());
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_neighbors_skip_self_loops_and_duplicates() {
        let mut store = GraphStore::new();
        let a = store.add_vertex();
        let b = store.add_vertex();

        store.add_edge(a, a);
        store.add_edge(a, b);
        store.add_edge(b, a);

        assert_eq!(store.edge_count(), 3);
        assert_eq!(store.get_neighbors(a), vec![b]);
        assert_eq!(store.degree(a), 1);
    }

    #[test]
    fn test_add_edges_from_pairs() {
        let mut store = GraphStore::new();
        for _ in 0..4 {
            store.add_vertex();
        }
        let added = store.add_edges_from_pairs(&[0, 1, 1, 2, 2, 3, 3, 42]);
        assert_eq!(added, 3);
        assert_eq!(store.edge_count(), 3);
    }

    #[test]
    fn test_remove_vertex_drops_incident_edges() {
        let mut store = GraphStore::new();
        let a = store.add_vertex();
        let b = store.add_vertex();
        let c = store.add_vertex();
        let ab = store.add_edge(a, b).unwrap();
        store.add_edge(b, c);

        assert!(store.remove_vertex(b));
        assert!(!store.remove_vertex(b));
        assert_eq!(store.vertex_count(), 2);
        assert_eq!(store.edge_count(), 0);
        assert!(!store.remove_edge(ab));
        assert_eq!(store.vertex_ids(), vec![a, c]);
    }

    #[test]
    fn test_remove_edge() {
        let mut store = GraphStore::new();
        let a = store.add_vertex();
        let b = store.add_vertex();
        let edge = store.add_edge(a, b).unwrap();

        assert!(store.remove_edge(edge));
        assert_eq!(store.edge_count(), 0);
        assert!(store.get_neighbors(a).is_empty());
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut store = GraphStore::new();
        store.add_vertex();
        store.add_vertex();

        store.clear();
        assert_eq!(store.vertex_count(), 0);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.add_vertex(), VertexId(0));
    }
}
