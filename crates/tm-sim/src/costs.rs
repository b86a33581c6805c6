//! The live edge-cost overlay fed to the router.

use tm_core::EdgeId;
use tm_graph::{EdgeCost, RoadGraph};
use tm_incident::IncidentManager;
use tm_traffic::TrafficAnalyzer;

/// Composes the analyzer's smoothed congestion multiplier with incident
/// penalties on top of base edge lengths:
///
/// ```text
/// cost(e) = ∞                                   if e is blocked
///         = L₀(e) × multiplier(e) × penalty(e)  otherwise
/// ```
pub struct LiveCost<'a> {
    pub graph: &'a RoadGraph,
    pub analyzer: &'a TrafficAnalyzer,
    pub incidents: &'a IncidentManager,
}

impl EdgeCost for LiveCost<'_> {
    #[inline]
    fn edge_cost(&self, edge: EdgeId) -> f64 {
        if self.incidents.is_blocked(edge) {
            return f64::INFINITY;
        }
        self.graph.edge_length[edge.index()]
            * self.analyzer.multiplier(edge)
            * self.incidents.severity_penalty(edge)
    }
}

impl LiveCost<'_> {
    /// Total live cost of a node path (adjacent pairs must be edges).
    pub fn path_cost(&self, nodes: &[tm_core::NodeId]) -> f64 {
        nodes
            .windows(2)
            .map(|w| {
                self.graph
                    .edge_between(w[0], w[1])
                    .map(|e| self.edge_cost(e))
                    .unwrap_or(f64::INFINITY)
            })
            .sum()
    }
}
