//! Per-edge congestion analysis.
//!
//! Recomputed once per tick from live occupancy:
//!
//! 1. `density = weighted_load / capacity`, capacity scaling with edge
//!    length (`base × max(1, L₀/100)`).
//! 2. A [`CongestionLevel`] from fixed density thresholds.
//! 3. A multiplier sampled uniformly from the level's band, then
//!    exponentially smoothed against the previous tick to prevent
//!    oscillation.
//! 4. A congestion probability fusing live density with the rolling mean of
//!    the last `history_window` multipliers.
//!
//! Sampling draws from the engine RNG in ascending edge order, which keeps
//! seeded runs reproducible.

use tm_core::{EdgeId, SimConfig, SimRng};
use tm_graph::RoadGraph;

use crate::occupancy::OccupancyIndex;

/// Reference edge length for capacity scaling, in map units.
const CAPACITY_REFERENCE_LENGTH: f64 = 100.0;

// ── CongestionLevel ───────────────────────────────────────────────────────────

/// Discrete congestion bands derived from density.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionLevel {
    #[default]
    FreeFlow,
    Light,
    Moderate,
    Heavy,
    Congested,
}

impl CongestionLevel {
    /// Classify a density value.
    pub fn from_density(density: f64) -> Self {
        if density < 0.3 {
            CongestionLevel::FreeFlow
        } else if density < 0.6 {
            CongestionLevel::Light
        } else if density < 0.85 {
            CongestionLevel::Moderate
        } else if density < 1.0 {
            CongestionLevel::Heavy
        } else {
            CongestionLevel::Congested
        }
    }

    /// The multiplier band sampled for this level.
    pub fn multiplier_range(self) -> (f64, f64) {
        match self {
            CongestionLevel::FreeFlow  => (0.5, 0.8),
            CongestionLevel::Light     => (0.8, 1.2),
            CongestionLevel::Moderate  => (1.2, 2.0),
            CongestionLevel::Heavy     => (2.0, 3.5),
            CongestionLevel::Congested => (3.5, 5.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CongestionLevel::FreeFlow  => "free_flow",
            CongestionLevel::Light     => "light",
            CongestionLevel::Moderate  => "moderate",
            CongestionLevel::Heavy     => "heavy",
            CongestionLevel::Congested => "congested",
        }
    }
}

impl std::fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── EdgeFlow ──────────────────────────────────────────────────────────────────

/// Snapshot of one edge's traffic state as of the last recompute.
#[derive(Copy, Clone, Debug)]
pub struct EdgeFlow {
    pub vehicle_count: usize,
    pub weighted_load: f64,
    pub capacity: f64,
    pub density: f64,
    pub level: CongestionLevel,
    pub multiplier: f64,
    pub probability: f64,
}

// ── History ring buffer ───────────────────────────────────────────────────────

/// Fixed-window ring of recent multipliers with an O(1) rolling mean.
#[derive(Clone, Debug)]
struct History {
    samples: Vec<f64>,
    head: usize,
    sum: f64,
    window: usize,
}

impl History {
    fn new(window: usize) -> Self {
        Self { samples: Vec::with_capacity(window), head: 0, sum: 0.0, window }
    }

    fn push(&mut self, value: f64) {
        if self.samples.len() < self.window {
            self.samples.push(value);
        } else {
            self.sum -= self.samples[self.head];
            self.samples[self.head] = value;
            self.head = (self.head + 1) % self.window;
        }
        self.sum += value;
    }

    fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            1.0
        } else {
            self.sum / self.samples.len() as f64
        }
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.head = 0;
        self.sum = 0.0;
    }
}

// ── TrafficAnalyzer ───────────────────────────────────────────────────────────

/// Derives per-edge congestion state from occupancy, once per tick.
pub struct TrafficAnalyzer {
    capacity: Vec<f64>,
    count: Vec<usize>,
    weighted: Vec<f64>,
    density: Vec<f64>,
    level: Vec<CongestionLevel>,
    multiplier: Vec<f64>,
    probability: Vec<f64>,
    history: Vec<History>,
    alpha: f64,
}

impl TrafficAnalyzer {
    /// Build an analyzer for `graph`, all edges at free-flow defaults.
    pub fn new(graph: &RoadGraph, config: &SimConfig) -> Self {
        let capacity = graph
            .edge_length
            .iter()
            .map(|&len| {
                config.base_edge_capacity * (len / CAPACITY_REFERENCE_LENGTH).max(1.0)
            })
            .collect();
        let edges = graph.edge_count();
        Self {
            capacity,
            count: vec![0; edges],
            weighted: vec![0.0; edges],
            density: vec![0.0; edges],
            level: vec![CongestionLevel::FreeFlow; edges],
            multiplier: vec![1.0; edges],
            probability: vec![0.0; edges],
            history: vec![History::new(config.history_window); edges],
            alpha: config.multiplier_smoothing_alpha,
        }
    }

    /// Recompute every edge's state from live occupancy.
    ///
    /// Draws one multiplier sample per edge from `rng`, in ascending edge
    /// order.
    pub fn recompute(&mut self, occupancy: &OccupancyIndex, rng: &mut SimRng) {
        for i in 0..self.capacity.len() {
            let edge = EdgeId(i as u32);
            let weighted = occupancy.weighted_load(edge);
            let density = weighted / self.capacity[i];
            let level = CongestionLevel::from_density(density);

            let (lo, hi) = level.multiplier_range();
            let sample = rng.gen_range(lo..hi);
            let smoothed = self.alpha * sample + (1.0 - self.alpha) * self.multiplier[i];

            self.count[i] = occupancy.count(edge);
            self.weighted[i] = weighted;
            self.density[i] = density;
            self.level[i] = level;
            self.multiplier[i] = smoothed;
            self.history[i].push(smoothed);
            self.probability[i] = Self::fuse_probability(density, self.history[i].mean());
        }
    }

    /// Congestion probability from live density and the historical mean
    /// multiplier.  The history term contributes at most 0.5.
    fn fuse_probability(density: f64, mean_multiplier: f64) -> f64 {
        let base = density.min(1.0);
        let hist = ((mean_multiplier - 1.0).clamp(0.0, 1.0) / 2.0).min(0.5);
        (base + hist).min(1.0)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn multiplier(&self, edge: EdgeId) -> f64 {
        self.multiplier[edge.index()]
    }

    #[inline]
    pub fn probability(&self, edge: EdgeId) -> f64 {
        self.probability[edge.index()]
    }

    #[inline]
    pub fn level(&self, edge: EdgeId) -> CongestionLevel {
        self.level[edge.index()]
    }

    #[inline]
    pub fn capacity(&self, edge: EdgeId) -> f64 {
        self.capacity[edge.index()]
    }

    /// Full snapshot of one edge.
    pub fn flow(&self, edge: EdgeId) -> EdgeFlow {
        let i = edge.index();
        EdgeFlow {
            vehicle_count: self.count[i],
            weighted_load: self.weighted[i],
            capacity: self.capacity[i],
            density: self.density[i],
            level: self.level[i],
            multiplier: self.multiplier[i],
            probability: self.probability[i],
        }
    }

    pub fn edge_count(&self) -> usize {
        self.capacity.len()
    }

    /// Top `k` edges by descending probability, ties broken by descending
    /// vehicle count, then ascending edge id.
    pub fn bottlenecks(&self, k: usize) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = (0..self.capacity.len() as u32).map(EdgeId).collect();
        edges.sort_by(|&a, &b| {
            self.probability[b.index()]
                .total_cmp(&self.probability[a.index()])
                .then_with(|| self.count[b.index()].cmp(&self.count[a.index()]))
                .then_with(|| a.cmp(&b))
        });
        edges.truncate(k);
        edges
    }

    /// Forget all history and return every edge to free-flow defaults.
    pub fn reset(&mut self) {
        self.count.fill(0);
        self.weighted.fill(0.0);
        self.density.fill(0.0);
        self.level.fill(CongestionLevel::FreeFlow);
        self.multiplier.fill(1.0);
        self.probability.fill(0.0);
        for h in &mut self.history {
            h.clear();
        }
    }
}
