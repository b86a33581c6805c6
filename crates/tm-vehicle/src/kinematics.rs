//! The per-tick physics pass: car-following, acceleration, edge transitions.
//!
//! # Per-vehicle steps
//!
//! 1. Scan for the nearest vehicle ahead on the same directed edge.
//! 2. Gap rule: `< 30` units → full stop; `< 60` → proportional crawl;
//!    otherwise the edge's multiplier-limited cruise speed.
//! 3. EMA-smooth the target speed (α = 0.3) so it doesn't chatter.
//! 4. Accelerate or brake toward the target, bounded by the vehicle type's
//!    acceleration × Δt.
//! 5. Advance `position_on_edge` by `speed · Δt / L_curve`.
//! 6. On saturation, transition to the next path edge (refusing blocked
//!    edges) or arrive.
//! 7. Refresh the status.
//!
//! Vehicles are processed in ascending id order, and the gap scan reads a
//! position snapshot taken before any movement, so the outcome is
//! independent of update order — two seeded runs trace identically.

use rustc_hash::FxHashMap;

use tm_core::{EdgeId, Tick, VehicleId};
use tm_graph::RoadGraph;
use tm_incident::IncidentManager;
use tm_traffic::{OccupancyIndex, TrafficAnalyzer, TrafficError};

use crate::vehicle::{Vehicle, VehicleStatus};
use std::collections::BTreeMap;

/// Gap (length units) below which a follower stops dead.
const GAP_STOP: f64 = 30.0;
/// Gap below which a follower crawls proportionally.
const GAP_SLOW: f64 = 60.0;
/// EMA factor for target-speed smoothing.
const SPEED_ALPHA: f64 = 0.3;
/// Speeds below this count as standing still.
const SPEED_EPS: f64 = 1e-3;
/// Position deltas below this are skipped to avoid cumulative drift.
const MIN_POSITION_DELTA: f64 = 1e-4;

/// What the physics pass did this tick.
#[derive(Debug, Default)]
pub struct KinematicsOutcome {
    /// Vehicles that reached their goal this tick, in ascending id order.
    pub arrived: Vec<VehicleId>,
}

/// Advance every active vehicle by `dt_secs`.
///
/// Mutates vehicle state and the occupancy index; the caller recomputes
/// analyzer state before the next tick.
///
/// # Errors
///
/// Propagates [`TrafficError`] if an edge transition violates occupancy
/// bookkeeping — the engine treats that as fatal for the tick.
pub fn advance_vehicles(
    vehicles: &mut BTreeMap<VehicleId, Vehicle>,
    graph: &RoadGraph,
    analyzer: &TrafficAnalyzer,
    incidents: &IncidentManager,
    occupancy: &mut OccupancyIndex,
    dt_secs: f64,
    now: Tick,
) -> Result<KinematicsOutcome, TrafficError> {
    // Position snapshot for the gap scan: the rule sees everyone where they
    // stood at tick start, not mid-update.
    let snapshot: FxHashMap<VehicleId, f64> = vehicles
        .values()
        .filter(|v| v.status.is_active())
        .map(|v| (v.id, v.position_on_edge))
        .collect();

    let ids: Vec<VehicleId> = vehicles
        .values()
        .filter(|v| v.status.is_active())
        .map(|v| v.id)
        .collect();

    let mut outcome = KinematicsOutcome::default();

    for id in ids {
        // Gap scan against the snapshot (immutable borrow scoped here).
        let (edge, gap) = {
            let v = &vehicles[&id];
            let my_pos = snapshot[&id];
            let gap = nearest_gap_ahead(v.edge, id, my_pos, occupancy, &snapshot)
                .map(|ahead| (ahead - my_pos) * graph.curve_length(v.edge));
            (v.edge, gap)
        };

        let multiplier =
            (analyzer.multiplier(edge) * incidents.severity_penalty(edge)).max(f64::EPSILON);

        let v = vehicles.get_mut(&id).expect("id collected above");

        // ── Following rule ────────────────────────────────────────────────
        // A vehicle still at the node mouth must not roll onto an edge that
        // was blocked after it was routed there.
        let mouth_blocked = v.position_on_edge == 0.0 && incidents.is_blocked(edge);

        let max_speed = v.kind.max_speed();
        let mut pinned = false;
        let raw_target = if mouth_blocked {
            pinned = true;
            0.0
        } else {
            match gap {
                Some(g) if g < GAP_STOP => {
                    pinned = true;
                    0.0
                }
                Some(g) if g < GAP_SLOW => {
                    max_speed * (g - GAP_STOP) / GAP_STOP / multiplier
                }
                // No blocker in range: cruise at the congestion-limited
                // speed.  Multipliers below 1 never push past the type's
                // top speed.
                _ => max_speed / multiplier,
            }
        }
        .min(max_speed);

        // ── Target smoothing and acceleration ─────────────────────────────
        v.target_speed = SPEED_ALPHA * raw_target + (1.0 - SPEED_ALPHA) * v.target_speed;
        if pinned {
            // A stop order is not smoothed away; the follower brakes now.
            v.target_speed = 0.0;
        }

        let diff = v.target_speed - v.current_speed;
        let step = diff.abs().min(v.kind.acceleration() * dt_secs);
        v.current_speed = (v.current_speed + diff.signum() * step).clamp(0.0, v.target_speed);

        // ── Position update ───────────────────────────────────────────────
        let curve_len = graph.curve_length(v.edge);
        if curve_len > 0.0 {
            let delta = v.current_speed * dt_secs / curve_len;
            if delta >= MIN_POSITION_DELTA {
                v.position_on_edge += delta;
            }
        }

        // ── Edge transition ───────────────────────────────────────────────
        let mut blocked_ahead = false;
        if v.position_on_edge >= 1.0 {
            if v.path_index + 2 >= v.path.len() {
                // The current edge ends at the goal.
                occupancy.leave(v.id, v.edge)?;
                v.path_index += 1;
                v.position_on_edge = 0.0;
                v.edge = EdgeId::INVALID;
                v.current_speed = 0.0;
                v.target_speed = 0.0;
                v.status = VehicleStatus::Arrived;
                v.arrival_tick = Some(now);
                outcome.arrived.push(v.id);
                continue;
            }

            let next_edge = graph
                .edge_between(v.path[v.path_index + 1], v.path[v.path_index + 2])
                .expect("router produced adjacent path nodes");

            if incidents.is_blocked(next_edge) {
                // Refuse entry: wait at the end of the committed edge until
                // the engine reroutes us or the blockage lifts.
                v.position_on_edge = 1.0;
                v.current_speed = 0.0;
                v.target_speed = 0.0;
                blocked_ahead = true;
            } else {
                occupancy.leave(v.id, v.edge)?;
                v.path_index += 1;
                v.position_on_edge = 0.0;
                v.edge = next_edge;
                occupancy.enter(v.id, next_edge, v.kind.capacity_weight())?;
            }
        }

        // ── Status ────────────────────────────────────────────────────────
        // A reroute from this tick stays visible until the next one.
        let rerouting_window =
            v.status == VehicleStatus::Rerouting && v.last_reroute_tick == Some(now);
        if !rerouting_window {
            v.status = if blocked_ahead || (pinned && v.current_speed <= SPEED_EPS) {
                VehicleStatus::Stuck
            } else if v.current_speed > SPEED_EPS {
                VehicleStatus::Moving
            } else if v.status == VehicleStatus::Stuck {
                VehicleStatus::Stuck
            } else {
                // Standing but free to accelerate (fresh spawn, green road).
                VehicleStatus::Moving
            };
        }
    }

    Ok(outcome)
}

/// Snapshot position of the nearest vehicle ahead of `my_pos` on `edge`,
/// or `None` when the road ahead is clear.
fn nearest_gap_ahead(
    edge: EdgeId,
    me: VehicleId,
    my_pos: f64,
    occupancy: &OccupancyIndex,
    snapshot: &FxHashMap<VehicleId, f64>,
) -> Option<f64> {
    occupancy
        .on(edge)
        .iter()
        .filter(|&&other| other != me)
        .filter_map(|other| snapshot.get(other).copied())
        .filter(|&pos| pos > my_pos)
        .min_by(|a, b| a.total_cmp(b))
}
