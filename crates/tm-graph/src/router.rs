//! Routing trait and the default A* implementation.
//!
//! # Pluggability
//!
//! The engine calls routing via the [`Router`] trait, so applications can
//! swap in custom implementations without touching the framework core.
//! The default [`AStarRouter`] expands nodes best-first on `f = g + h`.
//!
//! # Live costs
//!
//! Edge costs arrive through the [`EdgeCost`] trait: the traffic analyzer
//! supplies `L₀ × multiplier` with incident penalties composed in, and
//! `f64::INFINITY` for blocked edges (filtered before relaxation).
//! [`BaseCost`] uses raw edge lengths for cost-agnostic queries such as
//! spawn feasibility checks.
//!
//! # Admissibility
//!
//! Congestion multipliers can drop to 0.5, making an edge *cheaper* than
//! its length.  The straight-line heuristic is therefore scaled by that
//! floor (`HEURISTIC_SCALE = 0.5`) so it never overestimates and returned
//! routes stay optimal under live costs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tm_core::{EdgeId, NodeId, VehicleType};

use crate::error::RouteError;
use crate::graph::RoadGraph;

/// Heuristic scale factor — the minimum of the free-flow multiplier range.
const HEURISTIC_SCALE: f64 = 0.5;

// ── EdgeCost ──────────────────────────────────────────────────────────────────

/// Source of live per-edge traversal costs.
///
/// Return `f64::INFINITY` for impassable edges; the router never relaxes
/// a non-finite edge.
pub trait EdgeCost {
    fn edge_cost(&self, edge: EdgeId) -> f64;
}

/// Cost source using raw base lengths — the congestion-blind baseline.
pub struct BaseCost<'g>(pub &'g RoadGraph);

impl EdgeCost for BaseCost<'_> {
    #[inline]
    fn edge_cost(&self, edge: EdgeId) -> f64 {
        self.0.edge_length[edge.index()]
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the node sequence from start to goal
/// inclusive, and the total cost under the query's cost source.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub cost: f64,
}

impl Route {
    /// `true` if start equals goal (a single-node route).
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() < 2
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
pub trait Router {
    /// Compute a route from `from` to `to` for `mode` under `costs`.
    ///
    /// # Errors
    ///
    /// [`RouteError::NoPath`] when `to` is unreachable under the current
    /// costs and mode restrictions.
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        mode: VehicleType,
        costs: &dyn EdgeCost,
    ) -> Result<Route, RouteError>;
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// A* over the CSR graph with a scaled Euclidean straight-line heuristic.
///
/// `heuristic_weight = 0` degrades to plain Dijkstra — same code path,
/// useful when a cost source has no geometric relationship to distance.
pub struct AStarRouter {
    heuristic_weight: f64,
}

impl AStarRouter {
    /// The default admissible A* (heuristic scaled by the multiplier floor).
    pub fn new() -> Self {
        Self { heuristic_weight: HEURISTIC_SCALE }
    }

    /// Plain Dijkstra (zero heuristic).
    pub fn dijkstra() -> Self {
        Self { heuristic_weight: 0.0 }
    }
}

impl Default for AStarRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Open-set entry.  Ordered so the `BinaryHeap` (a max-heap) pops the entry
/// with the **lowest** f-score first, breaking ties on the lower `NodeId`
/// (= lexicographically lower node name).
struct Frontier {
    f: f64,
    g: f64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: smaller f (then smaller id) wins the max-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl Router for AStarRouter {
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        mode: VehicleType,
        costs: &dyn EdgeCost,
    ) -> Result<Route, RouteError> {
        if from == to {
            return Ok(Route { nodes: vec![from], cost: 0.0 });
        }

        let n = graph.node_count();
        let goal_pos = graph.node_position(to);
        let h = |node: NodeId| {
            self.heuristic_weight * graph.node_position(node).distance(goal_pos)
        };

        // g[v] = best known cost to reach v.
        let mut g = vec![f64::INFINITY; n];
        // prev_edge[v] = EdgeId that reached v; INVALID for unreached nodes.
        let mut prev_edge = vec![EdgeId::INVALID; n];

        g[from.index()] = 0.0;

        let mut open: BinaryHeap<Frontier> = BinaryHeap::new();
        open.push(Frontier { f: h(from), g: 0.0, node: from });

        while let Some(Frontier { g: entry_g, node, .. }) = open.pop() {
            if node == to {
                return Ok(reconstruct(graph, &prev_edge, from, to, entry_g));
            }

            // Skip stale entries; a cheaper path to `node` was already expanded.
            if entry_g > g[node.index()] {
                continue;
            }

            for edge in graph.out_edges(node) {
                if !graph.edge_modes[edge.index()].allows(mode) {
                    continue;
                }
                let cost = costs.edge_cost(edge);
                if !cost.is_finite() {
                    continue; // blocked
                }

                let neighbor = graph.edge_to[edge.index()];
                let tentative = entry_g + cost;
                if tentative < g[neighbor.index()] {
                    g[neighbor.index()] = tentative;
                    prev_edge[neighbor.index()] = edge;
                    open.push(Frontier {
                        f: tentative + h(neighbor),
                        g: tentative,
                        node: neighbor,
                    });
                }
            }
        }

        Err(RouteError::NoPath { from, to })
    }
}

fn reconstruct(
    graph: &RoadGraph,
    prev_edge: &[EdgeId],
    from: NodeId,
    to: NodeId,
    cost: f64,
) -> Route {
    let mut nodes = vec![to];
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        debug_assert_ne!(e, EdgeId::INVALID, "broken predecessor chain");
        cur = graph.edge_from[e.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    Route { nodes, cost }
}
