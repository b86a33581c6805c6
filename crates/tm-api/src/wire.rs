//! JSON wire records.
//!
//! Every record is explicit fields — no maps of loosely typed values.  Edge
//! keys are always `{from, to}` node-name objects.

use tm_core::EdgeId;
use tm_graph::RoadGraph;
use tm_incident::{Accident, AccidentSeverity, Blockage};
use tm_sim::{SimEngine, TrafficStats, VehicleStats};
use tm_traffic::{CongestionLevel, EdgeFlow};
use tm_vehicle::{Vehicle, VehicleStatus};

/// A directed edge addressed by its endpoint names.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
}

impl EdgeKey {
    pub fn new(graph: &RoadGraph, edge: EdgeId) -> Self {
        let (from, to) = graph.endpoints(edge);
        Self {
            from: graph.node_name(from).to_owned(),
            to: graph.node_name(to).to_owned(),
        }
    }
}

/// `health()` response.
#[derive(Clone, Debug, serde::Serialize)]
pub struct HealthRecord {
    pub status: &'static str,
}

/// `list_maps()` response.
#[derive(Clone, Debug, serde::Serialize)]
pub struct MapListRecord {
    pub maps: Vec<String>,
    pub current: String,
}

/// One vehicle on the wire.
#[derive(Clone, Debug, serde::Serialize)]
pub struct VehicleRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: tm_core::VehicleType,
    pub status: VehicleStatus,
    pub start_node: String,
    pub goal_node: String,
    pub current_node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_node: Option<String>,
    pub path: Vec<String>,
    pub path_index: usize,
    pub position_on_edge: f64,
    pub current_speed: f64,
    pub target_speed: f64,
    /// Effective multiplier of the edge currently under the vehicle.
    pub speed_multiplier: f64,
    pub reroute_count: u32,
    pub spawn_tick: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_tick: Option<u64>,
}

impl VehicleRecord {
    pub fn new(engine: &SimEngine, vehicle: &Vehicle) -> Self {
        let graph = engine.graph();
        let name = |n: tm_core::NodeId| graph.node_name(n).to_owned();
        let speed_multiplier = if vehicle.status == VehicleStatus::Arrived {
            1.0
        } else {
            engine.analyzer().multiplier(vehicle.edge)
                * engine.incidents().severity_penalty(vehicle.edge)
        };
        Self {
            id: vehicle.id.wire(),
            kind: vehicle.kind,
            status: vehicle.status,
            start_node: name(vehicle.start),
            goal_node: name(vehicle.goal),
            current_node: name(vehicle.current_node()),
            next_node: vehicle.next_node().map(name),
            path: vehicle.path.iter().map(|&n| name(n)).collect(),
            path_index: vehicle.path_index,
            position_on_edge: vehicle.position_on_edge,
            current_speed: vehicle.current_speed,
            target_speed: vehicle.target_speed,
            speed_multiplier,
            reroute_count: vehicle.reroute_count,
            spawn_tick: vehicle.spawn_tick.0,
            arrival_tick: vehicle.arrival_tick.map(|t| t.0),
        }
    }
}

/// One edge's traffic state on the wire.
#[derive(Clone, Debug, serde::Serialize)]
pub struct EdgeTrafficRecord {
    pub from: String,
    pub to: String,
    pub vehicle_count: usize,
    pub weighted_load: f64,
    pub capacity: f64,
    pub density: f64,
    pub level: CongestionLevel,
    pub multiplier: f64,
    pub congestion_probability: f64,
}

impl EdgeTrafficRecord {
    pub fn new(graph: &RoadGraph, edge: EdgeId, flow: EdgeFlow) -> Self {
        let key = EdgeKey::new(graph, edge);
        Self {
            from: key.from,
            to: key.to,
            vehicle_count: flow.vehicle_count,
            weighted_load: flow.weighted_load,
            capacity: flow.capacity,
            density: flow.density,
            level: flow.level,
            multiplier: flow.multiplier,
            congestion_probability: flow.probability,
        }
    }
}

/// `get_state()` / `tick()` response: the whole observable simulation.
#[derive(Clone, Debug, serde::Serialize)]
pub struct StateRecord {
    pub tick: u64,
    pub vehicles: Vec<VehicleRecord>,
    pub edge_traffic: Vec<EdgeTrafficRecord>,
    pub vehicle_stats: VehicleStats,
    pub traffic_stats: TrafficStats,
}

impl StateRecord {
    pub fn new(engine: &SimEngine) -> Self {
        let graph = engine.graph();
        Self {
            tick: engine.now().0,
            vehicles: engine
                .vehicles()
                .values()
                .map(|v| VehicleRecord::new(engine, v))
                .collect(),
            edge_traffic: graph
                .edges()
                .map(|e| EdgeTrafficRecord::new(graph, e, engine.analyzer().flow(e)))
                .collect(),
            vehicle_stats: engine.vehicle_stats(),
            traffic_stats: engine.traffic_stats(),
        }
    }
}

/// One accident on the wire.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AccidentRecord {
    pub id: u32,
    pub edge: EdgeKey,
    pub severity: AccidentSeverity,
    pub created_tick: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clearance_tick: Option<u64>,
}

impl AccidentRecord {
    pub fn new(graph: &RoadGraph, accident: &Accident) -> Self {
        Self {
            id: accident.id.0,
            edge: EdgeKey::new(graph, accident.edge),
            severity: accident.severity,
            created_tick: accident.created_tick.0,
            clearance_tick: accident.clearance_tick.map(|t| t.0),
        }
    }
}

/// One blockage on the wire.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BlockageRecord {
    pub id: u32,
    pub edge: EdgeKey,
    pub reason: String,
    pub created_tick: u64,
}

impl BlockageRecord {
    pub fn new(graph: &RoadGraph, blockage: &Blockage) -> Self {
        Self {
            id: blockage.id.0,
            edge: EdgeKey::new(graph, blockage.edge),
            reason: blockage.reason.clone(),
            created_tick: blockage.created_tick.0,
        }
    }
}

/// `get_simulation_info()` response.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SimInfoRecord {
    pub map: String,
    pub tick: u64,
    pub active_vehicles: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub continuous_running: bool,
    pub config: tm_core::SimConfig,
}
