//! Tunable parameters of the GEM layout.
//!
//! Every field has a default, so a JS caller can pass a partial object such
//! as `{ desiredEdgeLength: 96, seed: 7 }`.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_3, FRAC_PI_4, PI};

use super::vector::Bounds;
use crate::error::{LayoutError, Result};

/// Configuration for the GEM layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GemConfig {
    /// Global temperature at or below which the layout counts as converged (default: 3).
    pub desired_temperature: f64,
    /// Upper clamp for every vertex temperature (default: 256).
    pub max_temperature: f64,
    /// Temperature every vertex starts with (default: 10).
    pub initial_temperature: f64,
    /// Edge length the forces balance around (default: 128).
    pub desired_edge_length: f64,
    /// Strength of the pull towards the barycenter (default: 1/16).
    pub gravitational_constant: f64,
    /// Opening angle of the oscillation/progress detector, radians (default: pi/4).
    pub oscillation_opening_angle: f64,
    /// Opening angle of the rotation detector, radians (default: pi/3).
    pub rotation_opening_angle: f64,
    /// Factor applied to a temperature on progress, divided out on oscillation (default: 1.1).
    pub oscillation_sensitivity: f64,
    /// Half-width of the random disturbance added to each impulse, per axis (default: 20).
    pub jitter: f64,
    /// Publish positions every N rounds; `None` publishes only on termination (default: 10).
    pub publish_interval_rounds: Option<u32>,
    /// Region random initial positions are drawn from (default: 1280 x 720 at the origin).
    pub initial_bounds: Bounds,
    /// Round limit per vertex when `max_rounds` is unset (default: 4).
    pub rounds_per_vertex: u32,
    /// Explicit round limit overriding `rounds_per_vertex` (default: unset).
    pub max_rounds: Option<u32>,
    /// Seed for initial placement, visiting order and jitter (default: 0).
    pub seed: u64,
}

impl Default for GemConfig {
    fn default() -> Self {
        Self {
            desired_temperature: 3.0,
            max_temperature: 256.0,
            initial_temperature: 10.0,
            desired_edge_length: 128.0,
            gravitational_constant: 0.0625,
            oscillation_opening_angle: FRAC_PI_4,
            rotation_opening_angle: FRAC_PI_3,
            oscillation_sensitivity: 1.1,
            jitter: 20.0,
            publish_interval_rounds: Some(10),
            initial_bounds: Bounds::new(0.0, 0.0, 1280.0, 720.0),
            rounds_per_vertex: 4,
            max_rounds: None,
            seed: 0,
        }
    }
}

impl GemConfig {
    /// Check every parameter, reporting the first one out of range.
    pub fn validate(&self) -> Result<()> {
        non_negative("desiredTemperature", self.desired_temperature)?;
        positive("maxTemperature", self.max_temperature)?;
        non_negative("initialTemperature", self.initial_temperature)?;
        if self.initial_temperature > self.max_temperature {
            return Err(invalid(
                "initialTemperature",
                format!(
                    "{} exceeds maxTemperature {}",
                    self.initial_temperature, self.max_temperature
                ),
            ));
        }
        positive("desiredEdgeLength", self.desired_edge_length)?;
        non_negative("gravitationalConstant", self.gravitational_constant)?;
        opening_angle("oscillationOpeningAngle", self.oscillation_opening_angle)?;
        opening_angle("rotationOpeningAngle", self.rotation_opening_angle)?;
        if !(self.oscillation_sensitivity.is_finite() && self.oscillation_sensitivity >= 1.0) {
            return Err(invalid(
                "oscillationSensitivity",
                format!("{} must be at least 1", self.oscillation_sensitivity),
            ));
        }
        non_negative("jitter", self.jitter)?;
        if self.publish_interval_rounds == Some(0) {
            return Err(invalid(
                "publishIntervalRounds",
                "must be at least 1 round".to_string(),
            ));
        }

        let b = &self.initial_bounds;
        // Uniform sampling needs a finite span, not just finite corners.
        let spans_finite = [
            b.min_x,
            b.min_y,
            b.max_x,
            b.max_y,
            b.width(),
            b.height(),
        ]
        .iter()
        .all(|c| c.is_finite());
        if !spans_finite || b.min_x > b.max_x || b.min_y > b.max_y {
            return Err(invalid(
                "initialBounds",
                format!("{b:?} is not a finite, ordered rectangle"),
            ));
        }
        Ok(())
    }

    /// Round limit for a graph with `vertex_count` vertices.
    pub fn max_rounds_for(&self, vertex_count: usize) -> u32 {
        self.max_rounds.unwrap_or_else(|| {
            let count = u32::try_from(vertex_count).unwrap_or(u32::MAX);
            self.rounds_per_vertex.saturating_mul(count)
        })
    }
}

fn invalid(field: &'static str, reason: String) -> LayoutError {
    LayoutError::InvalidConfig { field, reason }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be positive")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must not be negative")))
    }
}

fn opening_angle(field: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value <= PI {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must lie in (0, pi]")))
    }
}
