//! Aggregate statistics over vehicles and edges.

use tm_traffic::CongestionLevel;

/// Population counters as of the last completed tick.
///
/// Conservation: `spawned == arrived + removed + active` (where `active`
/// counts the non-arrived vehicles still in the simulation).
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(serde::Serialize)]
pub struct VehicleStats {
    pub total_spawned: u64,
    pub active: usize,
    pub moving: usize,
    pub stuck: usize,
    pub rerouting: usize,
    pub waiting: usize,
    pub arrived: u64,
    pub removed: u64,
    pub total_reroutes: u64,
    /// Mean current speed of active vehicles, map units per second.
    pub average_speed: f64,
}

/// Network-wide congestion summary.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(serde::Serialize)]
pub struct TrafficStats {
    pub vehicles_on_edges: usize,
    pub average_density: f64,
    pub free_flow_edges: usize,
    pub light_edges: usize,
    pub moderate_edges: usize,
    pub heavy_edges: usize,
    pub congested_edges: usize,
    pub blocked_edges: usize,
    pub active_accidents: usize,
}

impl TrafficStats {
    /// Bump the per-level counter for one edge.
    pub(crate) fn count_level(&mut self, level: CongestionLevel) {
        match level {
            CongestionLevel::FreeFlow  => self.free_flow_edges += 1,
            CongestionLevel::Light     => self.light_edges += 1,
            CongestionLevel::Moderate  => self.moderate_edges += 1,
            CongestionLevel::Heavy     => self.heavy_edges += 1,
            CongestionLevel::Congested => self.congested_edges += 1,
        }
    }
}
