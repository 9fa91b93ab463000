//! Simulation state of one layout run.
//!
//! The state is an arena: vertices live in a `Vec` in snapshot order and refer
//! to their neighbours by index. Only position, impulse, skew and temperature
//! change once [`LayoutState::initialize`] returns.

use rand::Rng;

use super::config::GemConfig;
use super::diagnostics::Diagnostics;
use super::force::{self, AngleThresholds};
use super::vector::{Vec2, barycenter};
use crate::error::{LayoutError, Result};
use crate::graph::GraphSnapshot;

/// Per-vertex simulation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Current position.
    pub position: Vec2,
    /// Dense indices of adjacent vertices. Static for the run.
    pub neighbors: Vec<usize>,
    /// Raw impulse of the previous visit; zero before the first.
    pub last_impulse: Vec2,
    /// Accumulated rotation bias.
    pub skew: f64,
    /// Step size, always within `[0, max_temperature]`.
    pub temperature: f64,
}

/// Global state of one layout run.
#[derive(Debug, Clone)]
pub struct LayoutState {
    vertices: Vec<Vertex>,
    position_sum: Vec2,
    global_temperature: f64,
    round: u32,
    max_rounds: u32,
    rotation_sensitivity: f64,
}

impl LayoutState {
    /// Place every vertex and derive the run constants.
    ///
    /// Seeded vertices start at their seed; the rest are drawn uniformly from
    /// `config.initial_bounds`. A seed with a NaN or infinite coordinate is
    /// ignored and counted in `diagnostics.non_finite_seeds`.
    pub fn initialize<R: Rng + ?Sized>(
        snapshot: &GraphSnapshot,
        config: &GemConfig,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        if snapshot.is_empty() {
            return Err(LayoutError::EmptyGraph);
        }

        let bounds = config.initial_bounds;
        let vertices: Vec<Vertex> = (0..snapshot.len())
            .map(|i| {
                let seed = snapshot.seed(i).map(Vec2::from);
                let position = match seed {
                    Some(seed) if seed.is_finite() => seed,
                    _ => {
                        if seed.is_some() {
                            diagnostics.non_finite_seeds += 1;
                        }
                        Vec2::new(
                            rng.gen_range(bounds.min_x..=bounds.max_x),
                            rng.gen_range(bounds.min_y..=bounds.max_y),
                        )
                    }
                };
                Vertex {
                    position,
                    neighbors: snapshot.neighbors(i).to_vec(),
                    last_impulse: Vec2::ZERO,
                    skew: 0.0,
                    temperature: config.initial_temperature,
                }
            })
            .collect();

        let count = vertices.len();
        let mut state = Self {
            vertices,
            position_sum: Vec2::ZERO,
            global_temperature: config.initial_temperature,
            round: 0,
            max_rounds: config.max_rounds_for(count),
            rotation_sensitivity: 1.0 / (2.0 * count as f64),
        };
        state.refresh_position_sum();
        Ok(state)
    }

    /// Number of vertices in the run.
    pub(crate) fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Vertices in snapshot order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    /// Mean position of all vertices.
    pub fn barycenter(&self) -> Vec2 {
        barycenter(self.position_sum, self.vertices.len())
    }

    /// Mean vertex temperature after the last round.
    pub fn global_temperature(&self) -> f64 {
        self.global_temperature
    }

    /// Rounds completed.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Round limit, `4 * n` unless configured.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Skew added per detected rotation, `1 / (2n)`.
    pub fn rotation_sensitivity(&self) -> f64 {
        self.rotation_sensitivity
    }

    /// True while another round is due: the layout is still hot and the
    /// round limit has not been reached.
    pub fn wants_round(&self, desired_temperature: f64) -> bool {
        self.global_temperature > desired_temperature && self.round < self.max_rounds
    }

    /// Recompute the position sum from scratch, dropping accumulated
    /// floating-point drift.
    pub fn refresh_position_sum(&mut self) {
        self.position_sum = self
            .vertices
            .iter()
            .fold(Vec2::ZERO, |sum, v| sum + v.position);
    }

    /// Apply one impulse to the vertex at `index` and keep the barycenter
    /// current. Returns the vertex's temperature after the update.
    pub(crate) fn apply_impulse(
        &mut self,
        index: usize,
        impulse: Vec2,
        config: &GemConfig,
        thresholds: &AngleThresholds,
        diagnostics: &mut Diagnostics,
    ) -> f64 {
        let rotation_sensitivity = self.rotation_sensitivity;
        let Some(vertex) = self.vertices.get_mut(index) else {
            return 0.0;
        };
        let step = force::adapt(
            vertex,
            impulse,
            config,
            thresholds,
            rotation_sensitivity,
            diagnostics,
        );
        self.position_sum += step;
        vertex.temperature
    }

    /// Close a round whose vertex temperatures summed to `accumulator`.
    pub(crate) fn finish_round(&mut self, accumulator: f64) {
        self.global_temperature = accumulator / self.vertices.len() as f64;
        self.round += 1;
    }

    /// Move a vertex outside the simulation (interactive drag).
    pub(crate) fn set_position(&mut self, index: usize, position: Vec2) -> bool {
        let Some(vertex) = self.vertices.get_mut(index) else {
            return false;
        };
        self.position_sum += position - vertex.position;
        vertex.position = position;
        true
    }
}
