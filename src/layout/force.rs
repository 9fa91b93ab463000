//! GEM forces and the local temperature schedule.
//!
//! [`impulse`] is a pure read of the current state: gravity towards the
//! barycenter, a random disturbance, pairwise repulsion and attraction along
//! edges. [`adapt`] then moves one vertex by its temperature in the impulse's
//! direction and retunes that temperature from the angle to the previous
//! impulse.

use rand::Rng;
use std::f64::consts::FRAC_PI_2;

use super::config::GemConfig;
use super::diagnostics::Diagnostics;
use super::state::{LayoutState, Vertex};
use super::vector::{Vec2, scaling_factor};

/// Precomputed comparison values for the two angle detectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleThresholds {
    /// `|sin| >= rotation` counts as a rotation.
    pub rotation: f64,
    /// `|cos| >= oscillation` counts as progress (cos > 0) or oscillation (cos < 0).
    pub oscillation: f64,
}

impl AngleThresholds {
    /// Derive both thresholds from the configured opening angles.
    pub fn from_config(config: &GemConfig) -> Self {
        Self {
            rotation: (FRAC_PI_2 + config.rotation_opening_angle / 2.0).sin(),
            oscillation: (config.oscillation_opening_angle / 2.0).cos(),
        }
    }
}

/// Raw impulse acting on the vertex at `index`.
///
/// Coincident pairs contribute no repulsion; they are counted in
/// `diagnostics` and the jitter term separates them over the next rounds.
pub fn impulse<R: Rng + ?Sized>(
    state: &LayoutState,
    index: usize,
    config: &GemConfig,
    rng: &mut R,
    diagnostics: &mut Diagnostics,
) -> Vec2 {
    let vertices = state.vertices();
    let vertex = &vertices[index];
    let scaling = scaling_factor(vertex.neighbors.len());
    let edge_length_sq = config.desired_edge_length * config.desired_edge_length;

    let mut impulse =
        (state.barycenter() - vertex.position) * (config.gravitational_constant * scaling);

    let jitter = config.jitter;
    impulse += Vec2::new(
        rng.gen_range(-jitter..=jitter),
        rng.gen_range(-jitter..=jitter),
    );

    for (other_index, other) in vertices.iter().enumerate() {
        if other_index == index {
            continue;
        }
        let delta = vertex.position - other.position;
        let distance_sq = delta.length_squared();
        if distance_sq == 0.0 {
            diagnostics.coincident_pairs += 1;
            continue;
        }
        impulse += delta * (edge_length_sq / distance_sq);
    }

    for &neighbor in &vertex.neighbors {
        let delta = vertex.position - vertices[neighbor].position;
        impulse -= delta * (delta.length_squared() / (edge_length_sq * scaling));
    }

    impulse
}

/// Move `vertex` one temperature-sized step along `impulse` and adapt its
/// temperature and skew. Returns the displacement applied.
pub fn adapt(
    vertex: &mut Vertex,
    impulse: Vec2,
    config: &GemConfig,
    thresholds: &AngleThresholds,
    rotation_sensitivity: f64,
    diagnostics: &mut Diagnostics,
) -> Vec2 {
    let impulse = if impulse.is_finite() {
        impulse
    } else {
        diagnostics.non_finite_impulses += 1;
        Vec2::ZERO
    };

    let magnitude = impulse.length();
    if magnitude == 0.0 || !magnitude.is_finite() {
        diagnostics.zero_impulses += 1;
        vertex.last_impulse = Vec2::ZERO;
        return Vec2::ZERO;
    }

    let step = impulse * (vertex.temperature / magnitude);
    vertex.position += step;

    let previous = vertex.last_impulse;
    if !previous.is_zero() {
        let norm = magnitude * previous.length();
        let cos = previous.dot(impulse) / norm;
        let sin = previous.cross(impulse) / norm;

        if norm == 0.0 || !cos.is_finite() || !sin.is_finite() {
            diagnostics.undefined_angles += 1;
        } else {
            if sin.abs() >= thresholds.rotation {
                vertex.skew += rotation_sensitivity * sin.signum();
                diagnostics.rotations_detected += 1;
            }
            if cos.abs() >= thresholds.oscillation {
                if cos > 0.0 {
                    vertex.temperature *= config.oscillation_sensitivity;
                } else {
                    vertex.temperature /= config.oscillation_sensitivity;
                }
            }
            vertex.temperature *= 1.0 - vertex.skew.abs();
            vertex.temperature = vertex.temperature.clamp(0.0, config.max_temperature);
        }
    }

    vertex.last_impulse = impulse;
    step
}
