//! Error type for layout operations.

use crate::graph::VertexId;

/// Errors raised by the layout engine.
///
/// Numeric degeneracies (coincident vertices, zero-length impulses) are never
/// errors; they are recovered from locally and counted in
/// [`Diagnostics`](crate::layout::Diagnostics).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// The graph has no vertices, so the barycenter is undefined.
    #[error("cannot lay out an empty graph")]
    EmptyGraph,

    /// The handle does not name a vertex of the current graph.
    #[error("unknown vertex: {0}")]
    UnknownVertex(VertexId),

    /// Vertices are only movable once the layout has converged.
    #[error("layout is still running; vertices are fixed only after convergence")]
    NotConverged,

    /// A drag target or translation has a NaN or infinite component.
    #[error("position must be finite, got ({x}, {y})")]
    NonFinitePosition { x: f64, y: f64 },

    /// A configuration parameter is out of range.
    #[error("invalid configuration `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, LayoutError>;
