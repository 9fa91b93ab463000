//! GEM Layout - WASM Module
//!
//! This crate computes 2-D layouts of undirected graphs with the GEM
//! force-directed algorithm. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Graph store using petgraph's StableGraph, plus the frozen
//!   snapshot a layout run works on
//! - `layout`: The GEM engine (forces, temperature schedule, publishing)
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing
//! - `error`: Error type shared by the engine and the JS facade

use js_sys::Float64Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod layout;
pub mod spatial;

use error::LayoutError;
use graph::{EdgeId, GraphSource, GraphStore, VertexId};
use layout::{GemConfig, GemLayout, RunBudget, Vec2};

/// Initialize the WASM module.
///
/// Installs the panic hook and routes `log` output to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Milliseconds on a monotonic-enough wall clock.
#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

/// Main entry point for the layout engine.
///
/// Holds the editable graph and the configuration. A layout run is created
/// lazily from a snapshot of the graph and discarded whenever the graph or
/// the configuration changes.
#[wasm_bindgen]
pub struct GemLayoutWasm {
    store: GraphStore,
    config: GemConfig,
    layout: Option<GemLayout>,
}

#[wasm_bindgen]
impl GemLayoutWasm {
    /// Create an empty graph with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            store: GraphStore::new(),
            config: GemConfig::default(),
            layout: None,
        }
    }

    /// Create an empty graph with pre-allocated capacity.
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            store: GraphStore::with_capacity(vertex_capacity, edge_capacity),
            config: GemConfig::default(),
            layout: None,
        }
    }

    // =========================================================================
    // Graph Operations
    // =========================================================================

    /// Add a vertex placed randomly when the layout starts.
    #[wasm_bindgen(js_name = addVertex)]
    pub fn add_vertex(&mut self) -> u32 {
        self.invalidate();
        self.store.add_vertex().0
    }

    /// Add a vertex that starts the layout at (x, y).
    #[wasm_bindgen(js_name = addVertexAt)]
    pub fn add_vertex_at(&mut self, x: f64, y: f64) -> u32 {
        self.invalidate();
        self.store.add_vertex_at(x, y).0
    }

    /// Add vertices from a Float64Array of start positions [x0, y0, x1, y1, ...].
    ///
    /// Returns the new vertex IDs.
    #[wasm_bindgen(js_name = addVerticesFromPositions)]
    pub fn add_vertices_from_positions(&mut self, positions: &[f64]) -> Vec<u32> {
        self.invalidate();
        self.store
            .add_vertices_from_positions(positions)
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Remove a vertex and its edges.
    #[wasm_bindgen(js_name = removeVertex)]
    pub fn remove_vertex(&mut self, vertex_id: u32) -> bool {
        self.invalidate();
        self.store.remove_vertex(VertexId(vertex_id))
    }

    /// Add an undirected edge.
    ///
    /// Returns the edge ID, or None if an endpoint doesn't exist.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, a: u32, b: u32) -> Option<u32> {
        self.invalidate();
        self.store
            .add_edge(VertexId(a), VertexId(b))
            .map(u32::from)
    }

    /// Add edges from a Uint32Array of pairs [a0, b0, a1, b1, ...].
    ///
    /// Returns the number of edges added.
    #[wasm_bindgen(js_name = addEdgesFromPairs)]
    pub fn add_edges_from_pairs(&mut self, pairs: &[u32]) -> u32 {
        self.invalidate();
        self.store.add_edges_from_pairs(pairs)
    }

    /// Remove an edge by ID.
    #[wasm_bindgen(js_name = removeEdge)]
    pub fn remove_edge(&mut self, edge_id: u32) -> bool {
        self.invalidate();
        self.store.remove_edge(EdgeId(edge_id))
    }

    /// Number of vertices in the graph.
    #[wasm_bindgen(js_name = vertexCount)]
    pub fn vertex_count(&self) -> u32 {
        self.store.vertex_count()
    }

    /// Number of edges, parallel edges included.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.store.edge_count()
    }

    /// Distinct neighbours of a vertex as a Uint32Array.
    #[wasm_bindgen(js_name = getNeighbors)]
    pub fn get_neighbors(&self, vertex_id: u32) -> Vec<u32> {
        self.store
            .get_neighbors(VertexId(vertex_id))
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Number of distinct neighbours of a vertex.
    pub fn degree(&self, vertex_id: u32) -> u32 {
        self.store.degree(VertexId(vertex_id)) as u32
    }

    /// Remove all vertices and edges.
    pub fn clear(&mut self) {
        self.invalidate();
        self.store.clear();
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the configuration. Missing fields take their defaults.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsError> {
        let config: GemConfig = serde_wasm_bindgen::from_value(config)?;
        config.validate()?;
        self.invalidate();
        self.config = config;
        Ok(())
    }

    /// The current configuration as a plain object.
    #[wasm_bindgen(js_name = getConfig)]
    pub fn get_config(&self) -> Result<JsValue, JsError> {
        // `null` rather than `undefined` so the object round-trips through setConfig.
        let serializer = serde_wasm_bindgen::Serializer::new().serialize_missing_as_null(true);
        Ok(self.config.serialize(&serializer)?)
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Advance the layout.
    ///
    /// Without a budget exactly one round runs; with one, rounds run until
    /// the budget in milliseconds is spent (at least one round). Returns true
    /// if new positions were published.
    pub fn run(&mut self, time_budget_ms: Option<f64>) -> Result<bool, JsError> {
        let layout = self.layout_mut()?;
        let report = match time_budget_ms {
            None => layout.run(RunBudget::Rounds(1))?,
            Some(budget) => {
                let deadline = now_ms() + budget;
                layout.run_while(|done| done == 0 || now_ms() < deadline)?
            }
        };
        Ok(report.published)
    }

    /// Run until the layout converges. Returns the number of rounds executed.
    #[wasm_bindgen(js_name = runToConvergence)]
    pub fn run_to_convergence(&mut self) -> Result<u32, JsError> {
        let report = self.layout_mut()?.run(RunBudget::UntilConverged)?;
        Ok(report.rounds)
    }

    /// True once the run has stopped, by convergence or round limit.
    #[wasm_bindgen(js_name = isConverged)]
    pub fn is_converged(&self) -> bool {
        self.layout.as_ref().is_some_and(GemLayout::is_converged)
    }

    /// Rounds completed in the current run.
    pub fn round(&self) -> u32 {
        self.layout.as_ref().map_or(0, GemLayout::round)
    }

    /// Round limit for the current graph and configuration.
    #[wasm_bindgen(js_name = maxRounds)]
    pub fn max_rounds(&self) -> u32 {
        self.config
            .max_rounds_for(self.store.vertex_count() as usize)
    }

    /// Mean vertex temperature after the last round.
    #[wasm_bindgen(js_name = globalTemperature)]
    pub fn global_temperature(&self) -> f64 {
        self.layout
            .as_ref()
            .map_or(self.config.initial_temperature, GemLayout::global_temperature)
    }

    /// Publish the current simulation positions now.
    pub fn publish(&mut self) -> bool {
        self.layout.as_mut().is_some_and(GemLayout::publish)
    }

    /// Throw away the current run; the next `run` starts from new positions.
    pub fn restart(&mut self) {
        if let Some(layout) = self.layout.as_mut() {
            layout.restart();
        }
    }

    // =========================================================================
    // Published Positions
    // =========================================================================

    /// Published x coordinate, if the vertex has been published.
    #[wasm_bindgen(js_name = getVertexX)]
    pub fn get_vertex_x(&self, vertex_id: u32) -> Option<f64> {
        self.position(vertex_id).map(|p| p.x)
    }

    /// Published y coordinate, if the vertex has been published.
    #[wasm_bindgen(js_name = getVertexY)]
    pub fn get_vertex_y(&self, vertex_id: u32) -> Option<f64> {
        self.position(vertex_id).map(|p| p.y)
    }

    /// All published positions as a Float64Array [id0, x0, y0, id1, x1, y1, ...].
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Float64Array {
        Float64Array::from(&self.positions_flat()[..])
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Drag a vertex of a converged layout to (x, y). Both must be finite.
    #[wasm_bindgen(js_name = moveVertex)]
    pub fn move_vertex(&mut self, vertex_id: u32, x: f64, y: f64) -> Result<(), JsError> {
        let layout = self.layout.as_mut().ok_or(LayoutError::NotConverged)?;
        layout.move_vertex(VertexId(vertex_id), Vec2::new(x, y))?;
        Ok(())
    }

    /// Shift several vertices of a converged layout by (dx, dy).
    #[wasm_bindgen(js_name = translateVertices)]
    pub fn translate_vertices(&mut self, vertex_ids: &[u32], dx: f64, dy: f64) -> Result<(), JsError> {
        let layout = self.layout.as_mut().ok_or(LayoutError::NotConverged)?;
        let ids: Vec<VertexId> = vertex_ids.iter().map(|&id| VertexId(id)).collect();
        layout.translate_vertices(&ids, Vec2::new(dx, dy))?;
        Ok(())
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Find the nearest published vertex to a point.
    #[wasm_bindgen(js_name = findNearestVertex)]
    pub fn find_nearest_vertex(&self, x: f64, y: f64) -> Option<u32> {
        self.layout
            .as_ref()?
            .nearest_vertex(Vec2::new(x, y), None)
            .map(u32::from)
    }

    /// Find the nearest published vertex within a maximum distance.
    #[wasm_bindgen(js_name = findNearestVertexWithin)]
    pub fn find_nearest_vertex_within(&self, x: f64, y: f64, max_distance: f64) -> Option<u32> {
        self.layout
            .as_ref()?
            .nearest_vertex(Vec2::new(x, y), Some(max_distance))
            .map(u32::from)
    }

    /// Find all published vertices within a rectangular region.
    #[wasm_bindgen(js_name = findVerticesInRect)]
    pub fn find_vertices_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<u32> {
        let rect = layout::Bounds::new(min_x, min_y, max_x, max_y);
        self.layout
            .as_ref()
            .map(|layout| layout.vertices_in_rect(rect))
            .unwrap_or_default()
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Find all published vertices within a radius of a point.
    #[wasm_bindgen(js_name = findVerticesInRadius)]
    pub fn find_vertices_in_radius(&self, x: f64, y: f64, radius: f64) -> Vec<u32> {
        self.layout
            .as_ref()
            .map(|layout| layout.vertices_within(Vec2::new(x, y), radius))
            .unwrap_or_default()
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Bounding box of the published layout as [min_x, min_y, max_x, max_y].
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f64>> {
        self.layout
            .as_ref()?
            .bounds()
            .map(|b| vec![b.min_x, b.min_y, b.max_x, b.max_y])
    }

    /// Counters for numeric recoveries and publishes of the current run.
    #[wasm_bindgen(js_name = getDiagnostics)]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsError> {
        let diagnostics = self
            .layout
            .as_ref()
            .map(|layout| *layout.diagnostics())
            .unwrap_or_default();
        Ok(serde_wasm_bindgen::to_value(&diagnostics)?)
    }
}

impl GemLayoutWasm {
    fn invalidate(&mut self) {
        if self.layout.take().is_some() {
            log::debug!("gem: graph or configuration changed, layout discarded");
        }
    }

    fn layout_mut(&mut self) -> Result<&mut GemLayout, LayoutError> {
        let layout = match self.layout.take() {
            Some(layout) => layout,
            None => GemLayout::from_source(&self.store, self.config.clone())?,
        };
        Ok(self.layout.insert(layout))
    }

    fn position(&self, vertex_id: u32) -> Option<Vec2> {
        self.layout.as_ref()?.position(VertexId(vertex_id))
    }

    fn positions_flat(&self) -> Vec<f64> {
        let Some(layout) = &self.layout else {
            return Vec::new();
        };
        let positions = layout.positions();
        let mut flat = Vec::with_capacity(positions.len() * 3);
        for (id, p) in positions {
            flat.push(f64::from(id.0));
            flat.push(p.x);
            flat.push(p.y);
        }
        flat
    }
}

impl Default for GemLayoutWasm {
    fn default() -> Self {
        Self::new()
    }
}
