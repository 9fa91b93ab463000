//! Immutable graph snapshot consumed by the layout engine.
//!
//! A snapshot is taken once when a layout run initialises. It maps every
//! vertex handle to a dense index and stores the undirected adjacency as index
//! lists, so the simulation arena never holds references between vertices.

use std::collections::HashMap;

use super::ids::VertexId;

/// Read-only view of a graph, as the layout engine needs it.
pub trait GraphSource {
    /// All vertex handles.
    fn vertices(&self) -> Vec<VertexId>;

    /// Vertices sharing an edge with `id`.
    fn neighbors(&self, id: VertexId) -> Vec<VertexId>;

    /// Number of neighbours of `id`.
    fn degree(&self, id: VertexId) -> usize {
        self.neighbors(id).len()
    }

    /// Initial position requested for `id`; `None` lets the layout choose.
    fn seed_position(&self, _id: VertexId) -> Option<(f64, f64)> {
        None
    }
}

/// Dense, immutable adjacency of one graph.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    ids: Vec<VertexId>,
    index_of: HashMap<VertexId, usize>,
    adjacency: Vec<Vec<usize>>,
    seeds: Vec<Option<(f64, f64)>>,
}

impl GraphSnapshot {
    /// Capture the current state of a graph source.
    ///
    /// Neighbour lists are symmetrised, self-loops are dropped and parallel
    /// edges collapse into a single entry. Neighbours that are not part of
    /// `vertices()` are ignored.
    pub fn from_source<G: GraphSource + ?Sized>(source: &G) -> Self {
        let ids = source.vertices();
        let index_of: HashMap<VertexId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
        for (i, &id) in ids.iter().enumerate() {
            for neighbor in source.neighbors(id) {
                let Some(&j) = index_of.get(&neighbor) else {
                    continue;
                };
                if i == j {
                    continue;
                }
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        let seeds = ids.iter().map(|&id| source.seed_position(id)).collect();

        Self {
            ids,
            index_of,
            adjacency,
            seeds,
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if the snapshot has no vertices.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Vertex handles in dense-index order.
    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    /// Handle of the vertex at a dense index.
    pub fn id(&self, index: usize) -> Option<VertexId> {
        self.ids.get(index).copied()
    }

    /// Dense index of a handle.
    pub fn index_of(&self, id: VertexId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    /// Neighbour indices of the vertex at `index`.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Seed position of the vertex at `index`.
    pub fn seed(&self, index: usize) -> Option<(f64, f64)> {
        self.seeds.get(index).copied().flatten()
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }
}
