//! Per-vehicle state.

use tm_core::{EdgeId, NodeId, Tick, VehicleId, VehicleType};

// ── VehicleStatus ─────────────────────────────────────────────────────────────

/// Where a vehicle is in its lifecycle.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    /// Spawned this tick, not yet advanced.
    #[default]
    Waiting,
    /// Progressing along its path.
    Moving,
    /// Pinned at zero speed — blocker ahead or no feasible path onward.
    Stuck,
    /// Path tail replaced this tick; reverts to `Moving`/`Stuck` next tick.
    Rerouting,
    /// Reached its goal.  Terminal.
    Arrived,
}

impl VehicleStatus {
    /// `true` for statuses the engine still advances each tick.
    #[inline]
    pub fn is_active(self) -> bool {
        !matches!(self, VehicleStatus::Arrived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Waiting   => "waiting",
            VehicleStatus::Moving    => "moving",
            VehicleStatus::Stuck     => "stuck",
            VehicleStatus::Rerouting => "rerouting",
            VehicleStatus::Arrived   => "arrived",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

/// One simulated traveller.
///
/// `path` always runs from the original start to the goal; `path_index`
/// points at `current_node`.  Reroutes replace the tail beyond the committed
/// edge, never the traversed prefix, so `path[0..path_index]` is the actual
/// history of nodes visited.
#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleType,
    pub start: NodeId,
    pub goal: NodeId,

    /// Node sequence from start to goal.  Invariant: `path_index < path.len()`.
    pub path: Vec<NodeId>,
    pub path_index: usize,

    /// The directed edge currently being traversed.  `EdgeId::INVALID` once
    /// arrived.
    pub edge: EdgeId,

    /// Fractional progress along the current edge's curve, in `[0, 1]`.
    pub position_on_edge: f64,

    /// Map units per second.
    pub current_speed: f64,
    /// EMA-smoothed target the acceleration step chases.
    pub target_speed: f64,

    pub status: VehicleStatus,

    pub reroute_count: u32,
    /// Tick of the most recent reroute, for rate limiting.
    pub last_reroute_tick: Option<Tick>,
    /// Remaining-path cost at the time the current plan was adopted.
    pub path_cost: f64,

    pub spawn_tick: Tick,
    pub arrival_tick: Option<Tick>,
}

impl Vehicle {
    /// A freshly spawned vehicle at the start of its route, standing still
    /// at the mouth of `first_edge`.
    pub fn spawned(
        id: VehicleId,
        kind: VehicleType,
        path: Vec<NodeId>,
        path_cost: f64,
        first_edge: EdgeId,
        now: Tick,
    ) -> Self {
        debug_assert!(path.len() >= 2, "a spawnable route has at least one edge");
        let start = path[0];
        let goal = *path.last().expect("non-empty path");
        Self {
            id,
            kind,
            start,
            goal,
            path,
            path_index: 0,
            edge: first_edge,
            position_on_edge: 0.0,
            current_speed: 0.0,
            target_speed: 0.0,
            status: VehicleStatus::Waiting,
            reroute_count: 0,
            last_reroute_tick: None,
            path_cost,
            spawn_tick: now,
            arrival_tick: None,
        }
    }

    /// The node this vehicle most recently departed (or sits at).
    #[inline]
    pub fn current_node(&self) -> NodeId {
        self.path[self.path_index]
    }

    /// The node the current edge leads to; `None` once at the goal.
    #[inline]
    pub fn next_node(&self) -> Option<NodeId> {
        self.path.get(self.path_index + 1).copied()
    }

    /// `true` when `path_index` points at the final node.
    #[inline]
    pub fn at_goal(&self) -> bool {
        self.path_index + 1 == self.path.len()
    }

    /// The remaining path from the current node to the goal, inclusive.
    pub fn remaining_path(&self) -> &[NodeId] {
        &self.path[self.path_index..]
    }

    /// Adopt a new path tail, keeping the traversed prefix.
    ///
    /// `tail` must begin with `current_node`; the caller (the engine's
    /// reroute phase) guarantees this.
    pub fn splice_tail(&mut self, tail: Vec<NodeId>, cost: f64, now: Tick) {
        debug_assert_eq!(tail.first().copied(), Some(self.current_node()));
        self.path.truncate(self.path_index);
        self.path.extend(tail);
        self.goal = *self.path.last().expect("non-empty path");
        self.path_cost = cost;
        self.reroute_count += 1;
        self.last_reroute_tick = Some(now);
        self.status = VehicleStatus::Rerouting;
    }
}
