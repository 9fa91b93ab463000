//! Counters for numeric recoveries and engine events.

use serde::Serialize;

/// Running totals for one layout run.
///
/// None of these are failures: each counts a place where an ill-defined
/// contribution was skipped instead of leaking NaN or Inf into the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Repulsion terms skipped because two vertices shared a position
    /// (counted once per visiting vertex).
    pub coincident_pairs: u64,
    /// Seed positions with a NaN or infinite coordinate, replaced by random
    /// placement.
    pub non_finite_seeds: u64,
    /// Vertex visits whose impulse was exactly zero, so the vertex did not move.
    pub zero_impulses: u64,
    /// Impulses with a NaN or infinite component, discarded as zero.
    pub non_finite_impulses: u64,
    /// Temperature adaptations skipped because the angle between impulses
    /// was undefined.
    pub undefined_angles: u64,
    /// Rotation detections that changed a vertex's skew.
    pub rotations_detected: u64,
    /// Times positions were published.
    pub publishes: u64,
}

impl Diagnostics {
    /// Per-visit recovery counts accumulated since `earlier`.
    pub fn recoveries_since(&self, earlier: &Self) -> u64 {
        (self.coincident_pairs - earlier.coincident_pairs)
            + (self.zero_impulses - earlier.zero_impulses)
            + (self.non_finite_impulses - earlier.non_finite_impulses)
            + (self.undefined_angles - earlier.undefined_angles)
    }
}
