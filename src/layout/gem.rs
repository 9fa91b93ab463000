//! The GEM layout engine.
//!
//! [`GemLayout`] owns a frozen [`GraphSnapshot`], the simulation state and the
//! last published positions. Rounds advance the simulation; publishing copies
//! the simulation positions into the externally visible set and refreshes the
//! spatial index used for hit testing.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::config::GemConfig;
use super::diagnostics::Diagnostics;
use super::force::{self, AngleThresholds};
use super::state::LayoutState;
use super::vector::{Bounds, Vec2};
use crate::error::{LayoutError, Result};
use crate::graph::{GraphSnapshot, GraphSource, VertexId};
use crate::spatial::SpatialIndex;

/// How much work a call to [`GemLayout::run`] may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunBudget {
    /// At most this many rounds.
    Rounds(u32),
    /// Until the layout converges or hits its round limit.
    UntilConverged,
}

/// Lifecycle of a layout run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPhase {
    Running,
    Converged,
}

/// What a call to [`GemLayout::run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Rounds executed by this call.
    pub rounds: u32,
    /// Whether positions were published during this call.
    pub published: bool,
    /// Phase after the call.
    pub phase: LayoutPhase,
}

/// GEM force-directed layout over a fixed graph.
pub struct GemLayout<R = ChaCha8Rng> {
    snapshot: GraphSnapshot,
    config: GemConfig,
    thresholds: AngleThresholds,
    rng: R,
    state: Option<LayoutState>,
    order: Vec<usize>,
    phase: LayoutPhase,
    published: Vec<Vec2>,
    spatial: SpatialIndex,
    diagnostics: Diagnostics,
}

impl GemLayout<ChaCha8Rng> {
    /// Create a layout whose randomness is seeded from `config.seed`.
    pub fn new(snapshot: GraphSnapshot, config: GemConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(snapshot, config, rng)
    }

    /// Snapshot `source` and create a layout for it.
    pub fn from_source<G: GraphSource + ?Sized>(source: &G, config: GemConfig) -> Result<Self> {
        Self::new(GraphSnapshot::from_source(source), config)
    }
}

impl<R: Rng> GemLayout<R> {
    /// Create a layout drawing all randomness from `rng`.
    pub fn with_rng(snapshot: GraphSnapshot, config: GemConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            thresholds: AngleThresholds::from_config(&config),
            snapshot,
            config,
            rng,
            state: None,
            order: Vec::new(),
            phase: LayoutPhase::Running,
            published: Vec::new(),
            spatial: SpatialIndex::new(),
            diagnostics: Diagnostics::default(),
        })
    }

    /// Place the vertices if that has not happened yet.
    ///
    /// Called implicitly by the first [`run`](Self::run).
    pub fn initialize(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Ok(());
        }
        let state = LayoutState::initialize(
            &self.snapshot,
            &self.config,
            &mut self.rng,
            &mut self.diagnostics,
        )?;
        if self.diagnostics.non_finite_seeds > 0 {
            log::warn!(
                "gem: ignored {} non-finite seed positions",
                self.diagnostics.non_finite_seeds
            );
        }
        log::debug!(
            "gem: initialized {} vertices, {} edges, max {} rounds",
            state.len(),
            self.snapshot.edge_count(),
            state.max_rounds()
        );
        self.order = (0..state.len()).collect();
        self.state = Some(state);
        Ok(())
    }

    /// Advance the layout within `budget`.
    pub fn run(&mut self, budget: RunBudget) -> Result<RunReport> {
        match budget {
            RunBudget::Rounds(limit) => self.run_while(|done| done < limit),
            RunBudget::UntilConverged => self.run_while(|_| true),
        }
    }

    /// Advance the layout while `keep_going` returns true.
    ///
    /// `keep_going` is asked before every round with the number of rounds this
    /// call has executed so far. Convergence is checked first, so a finished
    /// layout always transitions to [`LayoutPhase::Converged`] even when the
    /// predicate has run out.
    pub fn run_while<F>(&mut self, mut keep_going: F) -> Result<RunReport>
    where
        F: FnMut(u32) -> bool,
    {
        self.initialize()?;

        let mut rounds = 0;
        let mut published = false;
        while self.phase == LayoutPhase::Running {
            if !self.wants_round() {
                self.finish();
                published = true;
                break;
            }
            if !keep_going(rounds) {
                break;
            }
            published |= self.step_round();
            rounds += 1;
        }

        Ok(RunReport {
            rounds,
            published,
            phase: self.phase,
        })
    }

    fn wants_round(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.wants_round(self.config.desired_temperature))
    }

    /// One round: every vertex visited once in a fresh random order.
    /// Returns whether the round published.
    fn step_round(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };

        let before = self.diagnostics;
        self.order.shuffle(&mut self.rng);
        state.refresh_position_sum();

        let mut accumulator = 0.0;
        for &index in &self.order {
            let impulse = force::impulse(
                state,
                index,
                &self.config,
                &mut self.rng,
                &mut self.diagnostics,
            );
            accumulator += state.apply_impulse(
                index,
                impulse,
                &self.config,
                &self.thresholds,
                &mut self.diagnostics,
            );
        }
        state.finish_round(accumulator);

        let round = state.round();
        let global = state.global_temperature();
        log::trace!("gem: round {round} global temperature {global:.3}");

        let recoveries = self.diagnostics.recoveries_since(&before);
        if recoveries > 0 {
            log::debug!("gem: round {round} recovered from {recoveries} degenerate terms");
        }

        let due = self
            .config
            .publish_interval_rounds
            .is_some_and(|interval| round % interval == 0);
        if due || global < self.config.desired_temperature {
            self.publish();
            true
        } else {
            false
        }
    }

    fn finish(&mut self) {
        self.phase = LayoutPhase::Converged;
        self.publish();
        if let Some(state) = &self.state {
            if state.global_temperature() > self.config.desired_temperature {
                log::info!(
                    "gem: stopped at round limit {} with global temperature {:.3}",
                    state.round(),
                    state.global_temperature()
                );
            } else {
                log::info!(
                    "gem: converged after {} rounds, global temperature {:.3}",
                    state.round(),
                    state.global_temperature()
                );
            }
        }
    }

    /// Copy the simulation positions into the published set.
    ///
    /// Publishing twice without a round in between leaves the published
    /// positions unchanged. Returns false before initialization.
    pub fn publish(&mut self) -> bool {
        let Some(state) = &self.state else {
            return false;
        };
        self.published.clear();
        self.published
            .extend(state.vertices().iter().map(|v| v.position));
        self.rebuild_spatial_index();
        self.diagnostics.publishes += 1;
        true
    }

    fn rebuild_spatial_index(&mut self) {
        let points = self
            .snapshot
            .ids()
            .iter()
            .copied()
            .zip(self.published.iter().copied());
        self.spatial.rebuild(points);
    }

    /// Last published position of a vertex.
    pub fn position(&self, id: VertexId) -> Option<Vec2> {
        let index = self.snapshot.index_of(id)?;
        self.published.get(index).copied()
    }

    /// All published positions in snapshot order; empty before the first
    /// publish.
    pub fn positions(&self) -> Vec<(VertexId, Vec2)> {
        self.snapshot
            .ids()
            .iter()
            .copied()
            .zip(self.published.iter().copied())
            .collect()
    }

    /// True once the layout has stopped, by convergence or round limit.
    pub fn is_converged(&self) -> bool {
        self.phase == LayoutPhase::Converged
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// Rounds completed so far.
    pub fn round(&self) -> u32 {
        self.state.as_ref().map_or(0, LayoutState::round)
    }

    /// Round limit for this graph.
    pub fn max_rounds(&self) -> u32 {
        self.config.max_rounds_for(self.snapshot.len())
    }

    /// Mean vertex temperature; the initial temperature before any round.
    pub fn global_temperature(&self) -> f64 {
        self.state
            .as_ref()
            .map_or(self.config.initial_temperature, LayoutState::global_temperature)
    }

    /// Current temperature of one vertex.
    pub fn temperature(&self, id: VertexId) -> Option<f64> {
        let index = self.snapshot.index_of(id)?;
        self.state.as_ref()?.vertex(index).map(|v| v.temperature)
    }

    /// Simulation state, once initialized.
    pub fn state(&self) -> Option<&LayoutState> {
        self.state.as_ref()
    }

    /// Graph captured when the layout was created.
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &GemConfig {
        &self.config
    }

    /// Recovery and publish counters since creation or the last restart.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Move a vertex of a converged layout, e.g. while the user drags it.
    ///
    /// Both the simulation and the published position change. A non-finite
    /// target is rejected with [`LayoutError::NonFinitePosition`].
    pub fn move_vertex(&mut self, id: VertexId, to: Vec2) -> Result<()> {
        let index = self.interactive_index(id)?;
        finite(to)?;
        self.place(index, to);
        Ok(())
    }

    /// Shift a group of vertices by `delta`. Repeated ids move once.
    ///
    /// Nothing moves unless every id is known and every target is finite.
    pub fn translate_vertices(&mut self, ids: &[VertexId], delta: Vec2) -> Result<()> {
        let mut indices = ids
            .iter()
            .map(|&id| self.interactive_index(id))
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable();
        indices.dedup();

        finite(delta)?;
        let targets = indices
            .into_iter()
            .map(|index| {
                let to = self.published[index] + delta;
                finite(to).map(|to| (index, to))
            })
            .collect::<Result<Vec<_>>>()?;
        for (index, to) in targets {
            self.place(index, to);
        }
        Ok(())
    }

    fn interactive_index(&self, id: VertexId) -> Result<usize> {
        if !self.is_converged() {
            return Err(LayoutError::NotConverged);
        }
        self.snapshot
            .index_of(id)
            .filter(|&index| index < self.published.len())
            .ok_or(LayoutError::UnknownVertex(id))
    }

    fn place(&mut self, index: usize, to: Vec2) {
        if let Some(state) = self.state.as_mut() {
            state.set_position(index, to);
        }
        let from = std::mem::replace(&mut self.published[index], to);
        if let Some(id) = self.snapshot.id(index) {
            self.spatial.relocate(id, from, to);
        }
    }

    /// Closest published vertex to `at`, optionally no further than
    /// `max_distance`.
    pub fn nearest_vertex(&self, at: Vec2, max_distance: Option<f64>) -> Option<VertexId> {
        match max_distance {
            Some(max) => self.spatial.nearest_within(at, max),
            None => self.spatial.nearest(at),
        }
    }

    /// Published vertices inside `rect`.
    pub fn vertices_in_rect(&self, rect: Bounds) -> Vec<VertexId> {
        self.spatial.in_rect(rect)
    }

    /// Published vertices within `radius` of `at`.
    pub fn vertices_within(&self, at: Vec2, radius: f64) -> Vec<VertexId> {
        self.spatial.within(at, radius)
    }

    /// Bounding box of the published positions.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.published.iter().copied())
    }

    /// Throw away the run and start over on the next [`run`](Self::run).
    ///
    /// The random stream continues, so a restarted layout explores a new
    /// initial placement.
    pub fn restart(&mut self) {
        self.state = None;
        self.order.clear();
        self.phase = LayoutPhase::Running;
        self.published.clear();
        self.spatial.clear();
        self.diagnostics = Diagnostics::default();
        log::debug!("gem: restarted");
    }
}

fn finite(at: Vec2) -> Result<Vec2> {
    if at.is_finite() {
        Ok(at)
    } else {
        Err(LayoutError::NonFinitePosition { x: at.x, y: at.y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;

    fn cycle(count: usize) -> GraphStore {
        let mut store = GraphStore::new();
        let ids: Vec<_> = (0..count).map(|_| store.add_vertex()).collect();
        for i in 0..count {
            store.add_edge(ids[i], ids[(i + 1) % count]);
        }
        store
    }

    fn layout(store: &GraphStore, config: GemConfig) -> GemLayout {
        GemLayout::from_source(store, config).unwrap()
    }

    fn fixed_rounds(rounds: u32, seed: u64) -> GemConfig {
        GemConfig {
            desired_temperature: 0.0,
            max_rounds: Some(rounds),
            seed,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GemConfig {
            desired_edge_length: -1.0,
            ..Default::default()
        };
        assert!(GemLayout::from_source(&cycle(3), config).is_err());
    }

    #[test]
    fn test_empty_graph_fails_to_run() {
        let mut gem = layout(&GraphStore::new(), GemConfig::default());
        assert_eq!(gem.run(RunBudget::Rounds(1)), Err(LayoutError::EmptyGraph));
    }

    #[test]
    fn test_nothing_published_before_first_publish() {
        let store = cycle(4);
        let gem = layout(&store, GemConfig::default());
        assert!(gem.positions().is_empty());
        assert_eq!(gem.position(VertexId(0)), None);
        assert_eq!(gem.round(), 0);
        assert_eq!(gem.bounds(), None);
        assert_eq!(gem.nearest_vertex(Vec2::ZERO, None), None);
    }

    #[test]
    fn test_round_budget_is_respected() {
        let store = cycle(6);
        let mut gem = layout(&store, fixed_rounds(100, 1));

        let report = gem.run(RunBudget::Rounds(3)).unwrap();
        assert_eq!(report.rounds, 3);
        assert_eq!(report.phase, LayoutPhase::Running);
        assert_eq!(gem.round(), 3);

        gem.run(RunBudget::Rounds(4)).unwrap();
        assert_eq!(gem.round(), 7);
    }

    #[test]
    fn test_stops_at_max_rounds() {
        let store = cycle(6);
        let mut gem = layout(
            &store,
            GemConfig {
                desired_temperature: 0.0,
                ..Default::default()
            },
        );

        let report = gem.run(RunBudget::UntilConverged).unwrap();
        assert_eq!(report.rounds, 24);
        assert_eq!(gem.round(), 24);
        assert!(gem.is_converged());
        assert!(report.published);
        assert_eq!(gem.positions().len(), 6);

        // A converged layout does no further work.
        let report = gem.run(RunBudget::Rounds(5)).unwrap();
        assert_eq!(report.rounds, 0);
        assert_eq!(gem.round(), 24);
    }

    #[test]
    fn test_single_vertex_converges() {
        let mut store = GraphStore::new();
        let a = store.add_vertex();
        let mut gem = layout(&store, GemConfig::default());

        gem.run(RunBudget::UntilConverged).unwrap();
        assert!(gem.is_converged());
        assert!(gem.round() <= 4);
        assert!(gem.position(a).unwrap().is_finite());
    }

    #[test]
    fn test_cold_start_converges_without_rounds() {
        let store = cycle(3);
        let mut gem = layout(
            &store,
            GemConfig {
                initial_temperature: 2.0,
                ..Default::default()
            },
        );

        let report = gem.run(RunBudget::Rounds(10)).unwrap();
        assert_eq!(report.rounds, 0);
        assert!(report.published);
        assert!(gem.is_converged());
        assert_eq!(gem.positions().len(), 3);
    }

    #[test]
    fn test_publish_interval() {
        let store = cycle(5);
        let mut gem = layout(
            &store,
            GemConfig {
                publish_interval_rounds: Some(4),
                ..fixed_rounds(100, 2)
            },
        );

        gem.run(RunBudget::Rounds(3)).unwrap();
        assert_eq!(gem.diagnostics().publishes, 0);
        assert!(gem.positions().is_empty());

        let report = gem.run(RunBudget::Rounds(1)).unwrap();
        assert!(report.published);
        assert_eq!(gem.diagnostics().publishes, 1);

        let snapshot = gem.positions();
        gem.run(RunBudget::Rounds(3)).unwrap();
        assert_eq!(gem.positions(), snapshot);
    }

    #[test]
    fn test_publish_only_on_termination() {
        let store = cycle(5);
        let mut gem = layout(
            &store,
            GemConfig {
                publish_interval_rounds: None,
                ..fixed_rounds(12, 2)
            },
        );

        gem.run(RunBudget::Rounds(11)).unwrap();
        assert!(gem.positions().is_empty());

        gem.run(RunBudget::UntilConverged).unwrap();
        assert!(gem.is_converged());
        assert_eq!(gem.diagnostics().publishes, 1);
        assert_eq!(gem.positions().len(), 5);
    }

    #[test]
    fn test_publish_is_idempotent() {
        let store = cycle(5);
        let mut gem = layout(&store, fixed_rounds(50, 4));
        gem.run(RunBudget::Rounds(5)).unwrap();

        assert!(gem.publish());
        let first = gem.positions();
        assert!(gem.publish());
        assert_eq!(gem.positions(), first);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let store = cycle(8);
        let mut a = layout(&store, fixed_rounds(40, 11));
        let mut b = layout(&store, fixed_rounds(40, 11));
        a.run(RunBudget::UntilConverged).unwrap();
        b.run(RunBudget::UntilConverged).unwrap();
        assert_eq!(a.positions(), b.positions());

        let mut c = layout(&store, fixed_rounds(40, 12));
        c.run(RunBudget::UntilConverged).unwrap();
        assert_ne!(a.positions(), c.positions());
    }

    #[test]
    fn test_temperatures_stay_in_range() {
        let store = cycle(10);
        let config = fixed_rounds(60, 5);
        let max = config.max_temperature;
        let mut gem = layout(&store, config);

        for _ in 0..60 {
            gem.run(RunBudget::Rounds(1)).unwrap();
            let state = gem.state().unwrap();
            assert!(
                state
                    .vertices()
                    .iter()
                    .all(|v| (0.0..=max).contains(&v.temperature))
            );
            assert!(state.vertices().iter().all(|v| v.position.is_finite()));
        }
    }

    #[test]
    fn test_global_temperature_is_mean() {
        let store = cycle(7);
        let mut gem = layout(&store, fixed_rounds(30, 8));
        assert_eq!(gem.global_temperature(), 10.0);

        gem.run(RunBudget::Rounds(3)).unwrap();
        let state = gem.state().unwrap();
        let mean = state.vertices().iter().map(|v| v.temperature).sum::<f64>()
            / state.len() as f64;
        assert!((gem.global_temperature() - mean).abs() < 1e-9);
    }

    #[test]
    fn test_path_edges_near_desired_length() {
        let mut store = GraphStore::new();
        let ids = store.add_vertices_from_positions(&[
            0.0, 0.0, 300.0, 50.0, 600.0, 0.0, 900.0, 50.0,
        ]);
        for pair in ids.windows(2) {
            store.add_edge(pair[0], pair[1]);
        }
        let mut gem = layout(&store, fixed_rounds(200, 21));
        gem.run(RunBudget::UntilConverged).unwrap();

        let p: Vec<Vec2> = ids.iter().map(|&id| gem.position(id).unwrap()).collect();
        let edges: Vec<f64> = p.windows(2).map(|w| w[0].distance(w[1])).collect();
        let mean = edges.iter().sum::<f64>() / edges.len() as f64;

        assert!((mean - 128.0).abs() <= 0.4 * 128.0, "mean edge {mean}");
        for &edge in &edges {
            assert!((0.5 * 128.0..=1.75 * 128.0).contains(&edge), "edge {edge}");
        }
        let ends = p[0].distance(p[3]);
        assert!(edges.iter().all(|&e| ends > e), "ends {ends} edges {edges:?}");
    }

    #[test]
    fn test_outlier_is_pulled_towards_barycenter() {
        let mut store = GraphStore::new();
        let ids = store.add_vertices_from_positions(&[
            0.0, 0.0, 100.0, 0.0, 50.0, 80.0, 5000.0, 5000.0,
        ]);
        store.add_edge(ids[0], ids[1]);
        store.add_edge(ids[1], ids[2]);
        store.add_edge(ids[2], ids[0]);
        let outlier = snapshot_index(&store, ids[3]);
        let mut gem = layout(&store, fixed_rounds(40, 3));

        gem.initialize().unwrap();
        let start = distance_to_barycenter(&gem, outlier);
        for _ in 0..20 {
            gem.run(RunBudget::Rounds(1)).unwrap();
        }
        let end = distance_to_barycenter(&gem, outlier);
        assert!(end < 0.95 * start, "start {start} end {end}");
    }

    fn snapshot_index(store: &GraphStore, id: VertexId) -> usize {
        GraphSnapshot::from_source(store).index_of(id).unwrap()
    }

    fn distance_to_barycenter(gem: &GemLayout, index: usize) -> f64 {
        let state = gem.state().unwrap();
        state.vertices()[index].position.distance(state.barycenter())
    }

    #[test]
    fn test_coincident_start_stays_finite() {
        let mut store = GraphStore::new();
        let ids = store.add_vertices_from_positions(&[
            10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 300.0, 40.0, -200.0, 90.0,
        ]);
        store.add_edge(ids[0], ids[3]);
        store.add_edge(ids[1], ids[4]);
        let mut gem = layout(&store, fixed_rounds(100, 6));

        gem.run(RunBudget::UntilConverged).unwrap();
        assert!(gem.diagnostics().coincident_pairs > 0);
        assert!(gem.positions().iter().all(|(_, p)| p.is_finite()));
        assert!(gem.global_temperature().is_finite());
    }

    #[test]
    fn test_interaction_requires_convergence() {
        let store = cycle(4);
        let mut gem = layout(&store, fixed_rounds(10, 1));
        gem.run(RunBudget::Rounds(2)).unwrap();

        assert_eq!(
            gem.move_vertex(VertexId(0), Vec2::ZERO),
            Err(LayoutError::NotConverged)
        );
        assert_eq!(
            gem.translate_vertices(&[VertexId(0)], Vec2::new(1.0, 1.0)),
            Err(LayoutError::NotConverged)
        );
    }

    #[test]
    fn test_move_and_translate_after_convergence() {
        let store = cycle(4);
        let mut gem = layout(&store, fixed_rounds(10, 1));
        gem.run(RunBudget::UntilConverged).unwrap();

        gem.move_vertex(VertexId(2), Vec2::new(9000.0, 9000.0)).unwrap();
        assert_eq!(gem.position(VertexId(2)), Some(Vec2::new(9000.0, 9000.0)));
        assert_eq!(
            gem.nearest_vertex(Vec2::new(8990.0, 9000.0), Some(50.0)),
            Some(VertexId(2))
        );

        let before = gem.position(VertexId(0)).unwrap();
        gem.translate_vertices(&[VertexId(0), VertexId(1)], Vec2::new(5.0, -5.0))
            .unwrap();
        assert_eq!(gem.position(VertexId(0)), Some(before + Vec2::new(5.0, -5.0)));

        // Unknown ids abort the whole group.
        let snapshot = gem.positions();
        assert_eq!(
            gem.translate_vertices(&[VertexId(1), VertexId(99)], Vec2::new(1.0, 1.0)),
            Err(LayoutError::UnknownVertex(VertexId(99)))
        );
        assert_eq!(gem.positions(), snapshot);
    }

    #[test]
    fn test_translate_moves_repeated_ids_once() {
        let store = cycle(4);
        let mut gem = layout(&store, fixed_rounds(10, 1));
        gem.run(RunBudget::UntilConverged).unwrap();

        let a = gem.position(VertexId(0)).unwrap();
        let b = gem.position(VertexId(1)).unwrap();
        let delta = Vec2::new(3.0, 4.0);
        gem.translate_vertices(&[VertexId(0), VertexId(1), VertexId(0)], delta)
            .unwrap();

        assert_eq!(gem.position(VertexId(0)), Some(a + delta));
        assert_eq!(gem.position(VertexId(1)), Some(b + delta));
        assert_eq!(
            gem.nearest_vertex(a + delta, Some(0.5)),
            Some(VertexId(0))
        );
    }

    #[test]
    fn test_non_finite_moves_are_rejected() {
        let store = cycle(4);
        let mut gem = layout(&store, fixed_rounds(10, 1));
        gem.run(RunBudget::UntilConverged).unwrap();
        let before = gem.positions();

        assert!(matches!(
            gem.move_vertex(VertexId(0), Vec2::new(f64::NAN, 0.0)),
            Err(LayoutError::NonFinitePosition { .. })
        ));
        assert!(matches!(
            gem.translate_vertices(&[VertexId(1)], Vec2::new(0.0, f64::INFINITY)),
            Err(LayoutError::NonFinitePosition { .. })
        ));
        assert_eq!(gem.positions(), before);
        assert!(gem.state().unwrap().barycenter().is_finite());

        // A finite delta that overflows one target moves nothing.
        gem.move_vertex(VertexId(0), Vec2::new(f64::MAX, 0.0)).unwrap();
        let before = gem.positions();
        assert!(matches!(
            gem.translate_vertices(&[VertexId(1), VertexId(0)], Vec2::new(f64::MAX, 0.0)),
            Err(LayoutError::NonFinitePosition { .. })
        ));
        assert_eq!(gem.positions(), before);
    }

    #[test]
    fn test_non_finite_seed_does_not_poison_layout() {
        let mut store = GraphStore::new();
        let broken = store.add_vertex_at(f64::NAN, 0.0);
        let a = store.add_vertex_at(100.0, 0.0);
        let b = store.add_vertex_at(0.0, 100.0);
        store.add_edge(a, b);
        let mut gem = layout(&store, fixed_rounds(12, 5));
        gem.run(RunBudget::UntilConverged).unwrap();

        assert_eq!(gem.diagnostics().non_finite_seeds, 1);
        assert!(gem.positions().iter().all(|(_, p)| p.is_finite()));
        assert!(gem.position(broken).is_some());
        assert_ne!(gem.position(a), Some(Vec2::new(100.0, 0.0)));
        assert_ne!(gem.position(b), Some(Vec2::new(0.0, 100.0)));
    }

    #[test]
    fn test_spatial_queries_follow_publish() {
        let mut store = GraphStore::new();
        let ids = store.add_vertices_from_positions(&[0.0, 0.0, 1000.0, 1000.0]);
        let mut gem = layout(&store, fixed_rounds(1, 1));
        gem.run(RunBudget::UntilConverged).unwrap();

        let near_first = gem.position(ids[0]).unwrap();
        assert_eq!(gem.nearest_vertex(near_first, None), Some(ids[0]));
        assert_eq!(
            gem.nearest_vertex(Vec2::new(1.0e7, 1.0e7), Some(10.0)),
            None
        );

        assert_eq!(gem.vertices_within(near_first, 1.0), vec![ids[0]]);

        let bounds = gem.bounds().unwrap();
        let mut all = gem.vertices_in_rect(bounds);
        all.sort();
        assert_eq!(all, ids);
    }

    #[test]
    fn test_restart_resets_run() {
        let store = cycle(4);
        let mut gem = layout(&store, fixed_rounds(10, 1));
        gem.run(RunBudget::UntilConverged).unwrap();
        let first = gem.positions();

        gem.restart();
        assert!(!gem.is_converged());
        assert_eq!(gem.round(), 0);
        assert!(gem.positions().is_empty());
        assert_eq!(gem.diagnostics().publishes, 0);

        gem.run(RunBudget::UntilConverged).unwrap();
        assert!(gem.is_converged());
        assert_ne!(gem.positions(), first);
    }

    #[test]
    fn test_run_while_predicate() {
        let store = cycle(5);
        let mut gem = layout(&store, fixed_rounds(100, 1));
        let report = gem.run_while(|done| done < 6).unwrap();
        assert_eq!(report.rounds, 6);
        assert_eq!(gem.round(), 6);
    }
}
