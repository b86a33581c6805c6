//! The `SimEngine` and its tick loop.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use tm_core::{EdgeId, IncidentId, NodeId, SimConfig, SimRng, Tick, TickClock, VehicleId, VehicleType};
use tm_graph::{AStarRouter, EdgeCost, MapRegistry, RoadGraph, Router};
use tm_incident::{Accident, AccidentSeverity, Blockage, IncidentManager};
use tm_traffic::{EdgeFlow, OccupancyIndex, TrafficAnalyzer};
use tm_vehicle::{Vehicle, VehicleStatus, advance_vehicles};

use crate::costs::LiveCost;
use crate::error::{SimError, SimResult};
use crate::observer::SimObserver;
use crate::spawn::SpawnMix;
use crate::stats::{TrafficStats, VehicleStats};

/// Positions below this count as "still at the node mouth" for reroute
/// splicing.
const POSITION_EPS: f64 = 1e-9;

/// Running counters the engine maintains across ticks.
#[derive(Debug, Default)]
struct Counters {
    spawned: u64,
    arrived: u64,
    removed: u64,
    reroutes: u64,
}

/// The simulation engine: owns every piece of mutable state and drives the
/// seven-phase tick described in the crate docs.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct SimEngine {
    config: SimConfig,
    registry: MapRegistry,
    map_name: String,
    graph: RoadGraph,
    router: AStarRouter,

    clock: TickClock,
    tick: Tick,

    vehicles: BTreeMap<VehicleId, Vehicle>,
    occupancy: OccupancyIndex,
    analyzer: TrafficAnalyzer,
    incidents: IncidentManager,

    /// Vehicles flagged for a mandatory reroute (their path crosses a fresh
    /// blockage).  Drained — in id order — by the next reroute phase.
    forced_reroutes: BTreeSet<VehicleId>,

    /// Spawn distribution used by auto-spawn and type-less spawn requests.
    auto_mix: SpawnMix,

    rng: SimRng,
    next_vehicle: u32,
    counters: Counters,
}

impl SimEngine {
    pub(crate) fn from_parts(
        config: SimConfig,
        registry: MapRegistry,
        map_name: String,
        graph: RoadGraph,
        auto_mix: SpawnMix,
    ) -> Self {
        let occupancy = OccupancyIndex::new(graph.edge_count());
        let analyzer = TrafficAnalyzer::new(&graph, &config);
        let clock = TickClock::fixed(config.tick_interval_ms);
        let rng = SimRng::new(config.seed);
        Self {
            config,
            registry,
            map_name,
            graph,
            router: AStarRouter::new(),
            clock,
            tick: Tick::ZERO,
            vehicles: BTreeMap::new(),
            occupancy,
            analyzer,
            incidents: IncidentManager::new(),
            forced_reroutes: BTreeSet::new(),
            auto_mix,
            rng,
            next_vehicle: 0,
            counters: Counters::default(),
        }
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Advance one tick with the clock's Δt.  Returns the number of
    /// vehicles that arrived during the tick.
    ///
    /// # Errors
    ///
    /// An occupancy invariant violation aborts the tick: state from the
    /// completed phases remains but `tick` does not advance.
    pub fn step(&mut self) -> SimResult<usize> {
        let dt = self.clock.delta_secs();
        self.step_dt(dt)
    }

    /// Advance one tick with an explicit Δt (seconds).
    pub fn step_dt(&mut self, dt_secs: f64) -> SimResult<usize> {
        let now = self.tick;

        // ── Phase ②: accident expiry ──────────────────────────────────────
        for accident in self.incidents.expire_accidents(now) {
            debug!(id = %accident.id, edge = %accident.edge, "accident auto-cleared");
        }

        // ── Phase ③: congestion analysis ──────────────────────────────────
        self.analyzer.recompute(&self.occupancy, &mut self.rng);

        // ── Phase ④: reroute decisions ────────────────────────────────────
        self.decide_reroutes(now)?;

        // ── Phase ⑤: kinematics ───────────────────────────────────────────
        let outcome = advance_vehicles(
            &mut self.vehicles,
            &self.graph,
            &self.analyzer,
            &self.incidents,
            &mut self.occupancy,
            dt_secs,
            now,
        )?;
        self.counters.arrived += outcome.arrived.len() as u64;

        // ── Phase ⑥: auto-spawn ───────────────────────────────────────────
        if self.config.auto_spawn {
            self.auto_spawn();
        }

        // ── Phase ⑦ ───────────────────────────────────────────────────────
        self.tick = now + 1;
        Ok(outcome.arrived.len())
    }

    /// Run `n` ticks, invoking observer hooks at each boundary.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            let now = self.tick;
            observer.on_tick_start(now);
            let arrived = self.step()?;
            observer.on_tick_end(now, self.active_count(), arrived);
        }
        Ok(())
    }

    /// Swap the Δt source (the continuous runner installs a measured clock).
    pub fn set_clock(&mut self, clock: TickClock) {
        self.clock = clock;
    }

    // ── Reroute phase ─────────────────────────────────────────────────────

    /// Evaluate every eligible vehicle against the reroute triggers and
    /// replace path tails where a strictly better route exists.
    fn decide_reroutes(&mut self, now: Tick) -> SimResult<()> {
        // Moving, stuck, and rerouting vehicles are evaluated; a forced flag
        // (fresh blockage on the path) makes even a waiting spawn eligible.
        let ids: Vec<VehicleId> = self
            .vehicles
            .values()
            .filter(|v| {
                matches!(
                    v.status,
                    VehicleStatus::Moving | VehicleStatus::Stuck | VehicleStatus::Rerouting
                ) || (v.status.is_active() && self.forced_reroutes.contains(&v.id))
            })
            .map(|v| v.id)
            .collect();

        // Disjoint field borrows: read-only world state on one side,
        // mutable vehicles and occupancy on the other.
        let graph = &self.graph;
        let analyzer = &self.analyzer;
        let incidents = &self.incidents;
        let router = &self.router;
        let config = &self.config;
        let occupancy = &mut self.occupancy;
        let costs = LiveCost { graph, analyzer, incidents };

        for id in ids {
            let forced = self.forced_reroutes.remove(&id);
            let v = self.vehicles.get_mut(&id).expect("id collected above");
            if v.at_goal() {
                continue;
            }

            // Rate limit: at most one reroute per cooldown window, unless a
            // blockage forced the issue.
            if !forced
                && v.last_reroute_tick
                    .is_some_and(|last| now.since(last) < config.reroute_cooldown_ticks)
            {
                continue;
            }

            if !forced && !Self::reroute_triggered(v, &costs, config) {
                continue;
            }

            // Replan.  A vehicle that has left the node mouth is committed
            // to its current edge: the new plan starts at the far end.
            let committed = v.position_on_edge > POSITION_EPS;
            let origin = if committed {
                v.next_node().expect("not at goal")
            } else {
                v.current_node()
            };

            match router.route(graph, origin, v.goal, v.kind, &costs) {
                Ok(route) => {
                    let current_tail: &[NodeId] = if committed {
                        &v.path[v.path_index + 1..]
                    } else {
                        v.remaining_path()
                    };
                    let current_cost = costs.path_cost(current_tail);
                    if route.cost + POSITION_EPS < current_cost {
                        let plan_cost;
                        let new_tail = if committed {
                            let committed_edge = graph
                                .edge_between(v.current_node(), origin)
                                .expect("committed edge exists");
                            plan_cost = costs.edge_cost(committed_edge) + route.cost;
                            let mut tail = Vec::with_capacity(route.nodes.len() + 1);
                            tail.push(v.current_node());
                            tail.extend(route.nodes);
                            tail
                        } else {
                            plan_cost = route.cost;
                            route.nodes
                        };
                        v.splice_tail(new_tail, plan_cost, now);

                        // An uncommitted reroute can change the first edge;
                        // occupancy follows the vehicle.
                        if !committed {
                            let new_first = graph
                                .edge_between(v.path[v.path_index], v.path[v.path_index + 1])
                                .expect("route yields adjacent nodes");
                            if new_first != v.edge {
                                occupancy.leave(v.id, v.edge)?;
                                occupancy.enter(v.id, new_first, v.kind.capacity_weight())?;
                                v.edge = new_first;
                            }
                        }

                        self.counters.reroutes += 1;
                        debug!(vehicle = %id, cost = plan_cost, "rerouted");
                    }
                }
                Err(_) if forced => {
                    // Path crosses a blockage and no alternative exists.
                    warn!(vehicle = %id, "no alternative route, vehicle stuck");
                    v.status = VehicleStatus::Stuck;
                    v.target_speed = 0.0;
                }
                Err(_) => {
                    // Congestion-triggered replan found nothing better
                    // reachable; keep the existing plan.
                }
            }
        }
        Ok(())
    }

    /// Congestion triggers: a blocked, high-probability, or accident-laden
    /// edge within the lookahead window, or remaining-path cost growth past
    /// the configured threshold since the plan was adopted.
    fn reroute_triggered(v: &Vehicle, costs: &LiveCost<'_>, config: &SimConfig) -> bool {
        let last = (v.path.len() - 1).min(v.path_index + config.reroute_lookahead_edges);
        for i in v.path_index..last {
            let Some(edge) = costs.graph.edge_between(v.path[i], v.path[i + 1]) else {
                return true; // path no longer matches the graph
            };
            if costs.incidents.is_blocked(edge) {
                return true;
            }
            if costs.analyzer.probability(edge) >= config.reroute_probability_threshold {
                return true;
            }
            if costs
                .incidents
                .worst_severity(edge)
                .is_some_and(|s| s >= AccidentSeverity::Major)
            {
                return true;
            }
        }

        let remaining = costs.path_cost(v.remaining_path());
        remaining > v.path_cost * (1.0 + config.reroute_threshold)
    }

    // ── Spawning ──────────────────────────────────────────────────────────

    /// Spawn one vehicle.
    ///
    /// `kind` defaults to a draw from the engine's spawn mix; `start`/`goal`
    /// default to random distinct nodes, retried up to the configured limit
    /// until a feasible route is found.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownNode`] for an unresolvable explicit name.
    /// - [`SimError::Validation`] for `start == goal` or a too-small map.
    /// - [`SimError::NoPath`] when no feasible route exists.
    pub fn spawn_vehicle(
        &mut self,
        kind: Option<VehicleType>,
        start: Option<&str>,
        goal: Option<&str>,
    ) -> SimResult<VehicleId> {
        let kind = match kind {
            Some(k) => k,
            None => self.auto_mix.sample(&mut self.rng),
        };
        let explicit_start = start.map(|name| self.resolve_node(name)).transpose()?;
        let explicit_goal = goal.map(|name| self.resolve_node(name)).transpose()?;

        if let (Some(s), Some(g)) = (explicit_start, explicit_goal) {
            if s == g {
                return Err(SimError::Validation("start and goal must differ".into()));
            }
            return self.spawn_at(kind, s, g);
        }

        if self.graph.node_count() < 2 {
            return Err(SimError::Validation("map has fewer than two nodes".into()));
        }

        let attempts = self.config.spawn_retry_limit.max(1);
        let mut last = None;
        for _ in 0..attempts {
            let s = explicit_start.unwrap_or_else(|| self.random_node());
            let g = loop {
                let g = explicit_goal.unwrap_or_else(|| self.random_node());
                if g != s {
                    break g;
                }
                if explicit_goal.is_some() {
                    // Explicit goal equals the drawn start; redraw the start
                    // next attempt.
                    break g;
                }
            };
            if s == g {
                continue;
            }
            match self.spawn_at(kind, s, g) {
                Ok(id) => return Ok(id),
                Err(e @ SimError::NoPath { .. }) => last = Some(e),
                Err(other) => return Err(other),
            }
        }
        Err(last.unwrap_or_else(|| SimError::Validation("spawn retries exhausted".into())))
    }

    fn spawn_at(&mut self, kind: VehicleType, start: NodeId, goal: NodeId) -> SimResult<VehicleId> {
        let costs = LiveCost {
            graph: &self.graph,
            analyzer: &self.analyzer,
            incidents: &self.incidents,
        };
        let route = self
            .router
            .route(&self.graph, start, goal, kind, &costs)
            .map_err(|_| SimError::NoPath {
                from: self.graph.node_name(start).to_owned(),
                to: self.graph.node_name(goal).to_owned(),
            })?;

        let id = VehicleId(self.next_vehicle);
        let first_edge = self
            .graph
            .edge_between(route.nodes[0], route.nodes[1])
            .expect("route yields adjacent nodes");
        let vehicle = Vehicle::spawned(id, kind, route.nodes, route.cost, first_edge, self.tick);
        self.occupancy.enter(id, first_edge, kind.capacity_weight())?;
        self.vehicles.insert(id, vehicle);
        self.next_vehicle += 1;
        self.counters.spawned += 1;
        debug!(vehicle = %id, %kind, start = self.graph.node_name(start), goal = self.graph.node_name(goal), "spawned");
        Ok(id)
    }

    /// Spawn up to `count` vehicles with types drawn from `mix`.  Spawns
    /// that find no feasible route are skipped; the successful ids are
    /// returned in spawn order.
    pub fn spawn_many(&mut self, count: usize, mix: SpawnMix) -> SimResult<Vec<VehicleId>> {
        let mix = mix.validated()?;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = mix.sample(&mut self.rng);
            match self.spawn_vehicle(Some(kind), None, None) {
                Ok(id) => ids.push(id),
                Err(SimError::NoPath { .. }) => {} // infeasible draw, skip
                Err(other) => return Err(other),
            }
        }
        Ok(ids)
    }

    /// Population top-up, invoked each tick when `config.auto_spawn` is on.
    fn auto_spawn(&mut self) {
        let active = self.active_count();
        if active >= self.config.auto_spawn_target {
            return;
        }
        let batch = self
            .config
            .auto_spawn_batch
            .min(self.config.auto_spawn_target - active);
        for _ in 0..batch {
            let kind = self.auto_mix.sample(&mut self.rng);
            // Infeasible draws are skipped and retried next tick.
            let _ = self.spawn_vehicle(Some(kind), None, None);
        }
    }

    fn random_node(&mut self) -> NodeId {
        NodeId(self.rng.gen_range(0..self.graph.node_count() as u32))
    }

    // ── Vehicle commands ──────────────────────────────────────────────────

    /// Remove a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> SimResult<Vehicle> {
        let vehicle = self.vehicles.remove(&id).ok_or(SimError::VehicleNotFound(id))?;
        if vehicle.status != VehicleStatus::Arrived {
            self.occupancy.leave(id, vehicle.edge)?;
            self.counters.removed += 1;
        }
        self.forced_reroutes.remove(&id);
        Ok(vehicle)
    }

    // ── Incident commands ─────────────────────────────────────────────────

    /// Create an accident on the named edge, or on a random occupied edge
    /// when no edge is given.
    pub fn create_accident(
        &mut self,
        from: Option<&str>,
        to: Option<&str>,
        severity: AccidentSeverity,
    ) -> SimResult<Accident> {
        let edge = match (from, to) {
            (Some(f), Some(t)) => Some(self.resolve_edge(f, t)?),
            (None, None) => None,
            _ => {
                return Err(SimError::Validation(
                    "accident placement needs both endpoints or neither".into(),
                ));
            }
        };
        let candidates: Vec<EdgeId> = self.occupancy.occupied_edges().collect();
        let accident = self.incidents.create_accident(
            edge,
            &candidates,
            severity,
            self.tick,
            self.config.accident_clear_ticks,
            &mut self.rng,
        )?;
        info!(id = %accident.id, edge = %accident.edge, %severity, "accident created");
        Ok(accident.clone())
    }

    pub fn resolve_accident(&mut self, id: IncidentId) -> SimResult<Accident> {
        let accident = self.incidents.resolve_accident(id)?;
        info!(id = %accident.id, "accident resolved");
        Ok(accident)
    }

    /// Block a directed edge and force-flag every vehicle whose remaining
    /// path crosses it for rerouting on the next tick.
    pub fn block_road(
        &mut self,
        from: &str,
        to: &str,
        reason: impl Into<String>,
    ) -> SimResult<Blockage> {
        let edge = self.resolve_edge(from, to)?;
        let blockage = self.incidents.block(edge, reason, self.tick)?.clone();
        info!(%edge, from, to, "road blocked");

        for v in self.vehicles.values() {
            if !v.status.is_active() || v.at_goal() {
                continue;
            }
            // Downstream of the current position: a vehicle that has left
            // the node mouth is committed to its current edge, so the scan
            // starts one edge later.
            let first = if v.position_on_edge > POSITION_EPS {
                v.path_index + 1
            } else {
                v.path_index
            };
            let crosses = (first..v.path.len() - 1).any(|i| {
                self.graph.edge_between(v.path[i], v.path[i + 1]) == Some(edge)
            });
            if crosses {
                self.forced_reroutes.insert(v.id);
            }
        }
        Ok(blockage)
    }

    pub fn unblock_road(&mut self, from: &str, to: &str) -> SimResult<Blockage> {
        let edge = self.resolve_edge(from, to)?;
        let blockage = self.incidents.unblock(edge)?;
        info!(%edge, from, to, "road unblocked");
        Ok(blockage)
    }

    // ── Reset & map switching ─────────────────────────────────────────────

    /// Clear vehicles, incidents, analyzer history, and the tick counter.
    /// The RNG is reseeded, so a reset run replays identically.
    pub fn reset(&mut self) {
        info!(map = %self.map_name, "simulation reset");
        self.vehicles.clear();
        self.occupancy.clear();
        self.incidents.clear();
        self.analyzer.reset();
        self.forced_reroutes.clear();
        self.tick = Tick::ZERO;
        self.rng = SimRng::new(self.config.seed);
        self.next_vehicle = 0;
        self.counters = Counters::default();
        self.clock = TickClock::fixed(self.config.tick_interval_ms);
    }

    /// Load `name` from the registry and reset onto it.
    pub fn switch_map(&mut self, name: &str) -> SimResult<()> {
        if !self.registry.contains(name) {
            return Err(SimError::UnknownMap(name.to_owned()));
        }
        let graph = self.registry.load(name)?;
        self.occupancy = OccupancyIndex::new(graph.edge_count());
        self.analyzer = TrafficAnalyzer::new(&graph, &self.config);
        self.graph = graph;
        self.map_name = name.to_owned();
        self.reset();
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn now(&self) -> Tick {
        self.tick
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn registry(&self) -> &MapRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MapRegistry {
        &mut self.registry
    }

    pub fn vehicles(&self) -> &BTreeMap<VehicleId, Vehicle> {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> SimResult<&Vehicle> {
        self.vehicles.get(&id).ok_or(SimError::VehicleNotFound(id))
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn analyzer(&self) -> &TrafficAnalyzer {
        &self.analyzer
    }

    pub fn incidents(&self) -> &IncidentManager {
        &self.incidents
    }

    /// Non-arrived vehicles still in the simulation.
    pub fn active_count(&self) -> usize {
        self.vehicles.values().filter(|v| v.status.is_active()).count()
    }

    /// The live traversal cost of `edge` (∞ when blocked).
    pub fn edge_cost(&self, edge: EdgeId) -> f64 {
        LiveCost {
            graph: &self.graph,
            analyzer: &self.analyzer,
            incidents: &self.incidents,
        }
        .edge_cost(edge)
    }

    /// Population counters and mean speed.
    pub fn vehicle_stats(&self) -> VehicleStats {
        let mut stats = VehicleStats {
            total_spawned: self.counters.spawned,
            arrived: self.counters.arrived,
            removed: self.counters.removed,
            total_reroutes: self.counters.reroutes,
            ..VehicleStats::default()
        };
        let mut speed_sum = 0.0;
        for v in self.vehicles.values() {
            match v.status {
                VehicleStatus::Waiting   => stats.waiting += 1,
                VehicleStatus::Moving    => stats.moving += 1,
                VehicleStatus::Stuck     => stats.stuck += 1,
                VehicleStatus::Rerouting => stats.rerouting += 1,
                VehicleStatus::Arrived   => continue,
            }
            stats.active += 1;
            speed_sum += v.current_speed;
        }
        if stats.active > 0 {
            stats.average_speed = speed_sum / stats.active as f64;
        }
        stats
    }

    /// Network-wide congestion summary.
    pub fn traffic_stats(&self) -> TrafficStats {
        let mut stats = TrafficStats {
            vehicles_on_edges: self.occupancy.total(),
            blocked_edges: self.incidents.blockage_count(),
            active_accidents: self.incidents.accident_count(),
            ..TrafficStats::default()
        };
        let edges = self.analyzer.edge_count();
        let mut density_sum = 0.0;
        for i in 0..edges {
            let flow = self.analyzer.flow(EdgeId(i as u32));
            density_sum += flow.density;
            stats.count_level(flow.level);
        }
        if edges > 0 {
            stats.average_density = density_sum / edges as f64;
        }
        stats
    }

    /// The top-`k` bottleneck edges with their flow snapshots.
    pub fn congestion_report(&self, k: usize) -> Vec<(EdgeId, EdgeFlow)> {
        self.analyzer
            .bottlenecks(k)
            .into_iter()
            .map(|e| (e, self.analyzer.flow(e)))
            .collect()
    }

    // ── Name resolution ───────────────────────────────────────────────────

    fn resolve_node(&self, name: &str) -> SimResult<NodeId> {
        self.graph
            .node_id(name)
            .ok_or_else(|| SimError::UnknownNode(name.to_owned()))
    }

    fn resolve_edge(&self, from: &str, to: &str) -> SimResult<EdgeId> {
        let f = self.resolve_node(from)?;
        let t = self.resolve_node(to)?;
        self.graph.edge_between(f, t).ok_or_else(|| SimError::UnknownEdge {
            from: from.to_owned(),
            to: to.to_owned(),
        })
    }
}
