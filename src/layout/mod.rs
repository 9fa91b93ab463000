//! GEM force-directed layout.
//!
//! The layout runs in rounds. Each round visits every vertex once in random
//! order, computes the forces acting on it and moves it by its own
//! temperature, which adapts to whether the vertex is progressing, oscillating
//! or rotating. The run converges once the mean temperature falls to the
//! desired temperature, or after a fixed number of rounds per vertex.

pub mod config;
pub mod diagnostics;
pub mod force;
pub mod gem;
pub mod state;
pub mod vector;

pub use config::GemConfig;
pub use diagnostics::Diagnostics;
pub use gem::{GemLayout, LayoutPhase, RunBudget, RunReport};
pub use state::{LayoutState, Vertex};
pub use vector::{Bounds, Vec2};
