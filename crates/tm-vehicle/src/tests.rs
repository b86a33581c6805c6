//! Unit tests for tm-vehicle.

#[cfg(test)]
mod helpers {
    use std::collections::BTreeMap;

    use tm_core::{ModeSet, Point, SimConfig, Tick, VehicleId, VehicleType};
    use tm_graph::{BaseCost, EdgeCost, RoadGraph, RoadGraphBuilder};
    use tm_traffic::{OccupancyIndex, TrafficAnalyzer};

    use crate::Vehicle;

    /// One-way car chain A → B → C with straight 300-unit edges.
    ///
    /// Node positions are collinear, so the Bézier control offset is
    /// perpendicular and the curve length stays close to 300.
    pub fn chain() -> RoadGraph {
        let mut b = RoadGraphBuilder::new();
        b.add_node("A", Point::new(0.0, 0.0))
            .add_node("B", Point::new(300.0, 0.0))
            .add_node("C", Point::new(600.0, 0.0));
        b.add_edge("A", "B", 300.0, ModeSet::single(VehicleType::Car), true)
            .add_edge("B", "C", 300.0, ModeSet::single(VehicleType::Car), true);
        b.build().unwrap()
    }

    /// Fresh analyzer: every multiplier still at its 1.0 starting value.
    pub fn analyzer(graph: &RoadGraph) -> TrafficAnalyzer {
        TrafficAnalyzer::new(graph, &SimConfig::default())
    }

    /// Place a car on the first edge of `path_names` at `pos`, registered
    /// in the occupancy index.
    pub fn put_car(
        vehicles: &mut BTreeMap<VehicleId, Vehicle>,
        occupancy: &mut OccupancyIndex,
        graph: &RoadGraph,
        id: u32,
        path_names: &[&str],
        pos: f64,
    ) -> VehicleId {
        let path: Vec<_> = path_names.iter().map(|n| graph.node_id(n).unwrap()).collect();
        let first_edge = graph.edge_between(path[0], path[1]).unwrap();
        let cost: f64 = path
            .windows(2)
            .map(|w| BaseCost(graph).edge_cost(graph.edge_between(w[0], w[1]).unwrap()))
            .sum();
        let vid = VehicleId(id);
        let mut v = Vehicle::spawned(vid, VehicleType::Car, path, cost, first_edge, Tick(0));
        v.position_on_edge = pos;
        occupancy.enter(vid, first_edge, v.kind.capacity_weight()).unwrap();
        vehicles.insert(vid, v);
        vid
    }
}

// ── Vehicle state ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod vehicle {
    use std::collections::BTreeMap;

    use tm_core::{Tick, VehicleId};
    use tm_traffic::OccupancyIndex;

    use crate::VehicleStatus;

    #[test]
    fn spawned_state() {
        let g = super::helpers::chain();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());
        let id = super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["A", "B", "C"], 0.0);

        let v = &vehicles[&id];
        assert_eq!(v.status, VehicleStatus::Waiting);
        assert_eq!(v.current_speed, 0.0);
        assert_eq!(v.current_node(), g.node_id("A").unwrap());
        assert_eq!(v.next_node(), Some(g.node_id("B").unwrap()));
        assert!(!v.at_goal());
        assert_eq!(v.remaining_path().len(), 3);
    }

    #[test]
    fn splice_tail_keeps_prefix_and_counts() {
        let g = super::helpers::chain();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());
        let id = super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["A", "B", "C"], 0.0);

        let v = vehicles.get_mut(&id).unwrap();
        let a = g.node_id("A").unwrap();
        let b = g.node_id("B").unwrap();
        let c = g.node_id("C").unwrap();
        v.splice_tail(vec![a, b, c], 600.0, Tick(4));

        assert_eq!(v.reroute_count, 1);
        assert_eq!(v.last_reroute_tick, Some(Tick(4)));
        assert_eq!(v.status, VehicleStatus::Rerouting);
        assert_eq!(v.path, [a, b, c]);
    }

    #[test]
    fn wire_id_format() {
        assert_eq!(VehicleId(12).wire(), "v12");
    }

    #[test]
    fn status_labels() {
        assert_eq!(VehicleStatus::Waiting.as_str(), "waiting");
        assert_eq!(VehicleStatus::Rerouting.to_string(), "rerouting");
        assert!(VehicleStatus::Stuck.is_active());
        assert!(!VehicleStatus::Arrived.is_active());
    }
}

// ── Kinematics ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod kinematics {
    use std::collections::BTreeMap;

    use tm_core::{Tick, VehicleType};
    use tm_incident::IncidentManager;
    use tm_traffic::OccupancyIndex;

    use crate::{VehicleStatus, advance_vehicles};

    const DT: f64 = 0.1;

    #[test]
    fn accelerates_from_rest() {
        let g = super::helpers::chain();
        let analyzer = super::helpers::analyzer(&g);
        let incidents = IncidentManager::new();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());
        let id = super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["A", "B", "C"], 0.0);

        let mut last_speed = 0.0;
        for tick in 1..=10 {
            advance_vehicles(&mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(tick))
                .unwrap();
            let v = &vehicles[&id];
            assert!(v.current_speed >= last_speed);
            last_speed = v.current_speed;
        }
        let v = &vehicles[&id];
        assert!(v.current_speed > 0.0);
        assert!(v.position_on_edge > 0.0);
        assert_eq!(v.status, VehicleStatus::Moving);
    }

    #[test]
    fn speed_never_exceeds_type_max() {
        let g = super::helpers::chain();
        let analyzer = super::helpers::analyzer(&g);
        let incidents = IncidentManager::new();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());
        let id = super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["A", "B", "C"], 0.0);

        for tick in 1..=200 {
            advance_vehicles(&mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(tick))
                .unwrap();
            let v = &vehicles[&id];
            if v.status == VehicleStatus::Arrived {
                break;
            }
            assert!(v.current_speed <= VehicleType::Car.max_speed());
            assert!((0.0..=1.0).contains(&v.position_on_edge));
        }
    }

    #[test]
    fn gap_of_exactly_thirty_zeroes_target() {
        let g = super::helpers::chain();
        let analyzer = super::helpers::analyzer(&g);
        let incidents = IncidentManager::new();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());

        // Curve length ≈ chord for these collinear nodes; use the real value
        // so the gap is exactly 30 units.
        let curve = g.curve_length(
            g.edge_between(g.node_id("A").unwrap(), g.node_id("B").unwrap()).unwrap(),
        );
        let gap_fraction = 30.0 / curve;

        let leader =
            super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["A", "B"], 0.5);
        let follower = super::helpers::put_car(
            &mut vehicles,
            &mut occ,
            &g,
            1,
            &["A", "B"],
            0.5 - gap_fraction,
        );

        advance_vehicles(&mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(1)).unwrap();
        assert_eq!(vehicles[&follower].target_speed, 0.0);
        assert!(vehicles[&leader].target_speed > 0.0);
    }

    #[test]
    fn queue_speeds_are_monotone_and_tail_is_stuck() {
        let g = super::helpers::chain();
        let analyzer = super::helpers::analyzer(&g);
        let incidents = IncidentManager::new();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());

        // Five cars nose-to-tail: 0.02 spacing on a ~300-unit curve is a
        // ~6-unit gap, far inside the stop band.
        let ids: Vec<_> = (0..5)
            .map(|i| {
                super::helpers::put_car(
                    &mut vehicles,
                    &mut occ,
                    &g,
                    i,
                    &["A", "B"],
                    0.5 - 0.02 * i as f64,
                )
            })
            .collect();

        advance_vehicles(&mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(1)).unwrap();

        // Leader is ids[0] (highest position); each follower's target is
        // bounded by its leader's.
        for pair in ids.windows(2) {
            assert!(vehicles[&pair[1]].target_speed <= vehicles[&pair[0]].target_speed);
        }
        let tail = &vehicles[&ids[4]];
        assert_eq!(tail.current_speed, 0.0);
        assert_eq!(tail.status, VehicleStatus::Stuck);
    }

    #[test]
    fn arrival_in_one_tick_at_edge_end() {
        let g = super::helpers::chain();
        let analyzer = super::helpers::analyzer(&g);
        let incidents = IncidentManager::new();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());
        let id = super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["B", "C"], 0.995);
        vehicles.get_mut(&id).unwrap().current_speed = 60.0;
        vehicles.get_mut(&id).unwrap().target_speed = 60.0;

        let out =
            advance_vehicles(&mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(7))
                .unwrap();

        assert_eq!(out.arrived, [id]);
        let v = &vehicles[&id];
        assert_eq!(v.status, VehicleStatus::Arrived);
        assert_eq!(v.arrival_tick, Some(Tick(7)));
        assert!(v.at_goal());
        assert_eq!(occ.total(), 0, "arrived vehicle must leave occupancy");
    }

    #[test]
    fn intermediate_transition_moves_occupancy() {
        let g = super::helpers::chain();
        let analyzer = super::helpers::analyzer(&g);
        let incidents = IncidentManager::new();
        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());
        let id = super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["A", "B", "C"], 0.999);
        vehicles.get_mut(&id).unwrap().current_speed = 60.0;
        vehicles.get_mut(&id).unwrap().target_speed = 60.0;

        advance_vehicles(&mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(1)).unwrap();

        let v = &vehicles[&id];
        let b = g.node_id("B").unwrap();
        let c = g.node_id("C").unwrap();
        assert_eq!(v.current_node(), b);
        assert_eq!(v.position_on_edge, 0.0);
        let bc = g.edge_between(b, c).unwrap();
        assert_eq!(occ.on(bc), [id]);
        assert_eq!(occ.edge_of(id), Some(bc));
    }

    #[test]
    fn refuses_blocked_edge_and_goes_stuck() {
        let g = super::helpers::chain();
        let analyzer = super::helpers::analyzer(&g);
        let mut incidents = IncidentManager::new();
        let b = g.node_id("B").unwrap();
        let c = g.node_id("C").unwrap();
        let bc = g.edge_between(b, c).unwrap();
        incidents.block(bc, "crash scene", Tick(0)).unwrap();

        let mut vehicles = BTreeMap::new();
        let mut occ = OccupancyIndex::new(g.edge_count());
        let id = super::helpers::put_car(&mut vehicles, &mut occ, &g, 0, &["A", "B", "C"], 0.999);
        vehicles.get_mut(&id).unwrap().current_speed = 60.0;
        vehicles.get_mut(&id).unwrap().target_speed = 60.0;

        for tick in 1..=5 {
            advance_vehicles(&mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(tick))
                .unwrap();
        }

        let v = &vehicles[&id];
        assert_eq!(v.status, VehicleStatus::Stuck);
        assert_eq!(v.position_on_edge, 1.0);
        assert_eq!(v.current_speed, 0.0);
        // Still on A→B; never entered the blocked edge.
        assert_eq!(occ.edge_of(id), Some(g.edge_between(g.node_id("A").unwrap(), b).unwrap()));
        assert_eq!(occ.count(bc), 0);
    }

    #[test]
    fn seeded_runs_trace_identically() {
        let run = || {
            let g = super::helpers::chain();
            let analyzer = super::helpers::analyzer(&g);
            let incidents = IncidentManager::new();
            let mut vehicles = BTreeMap::new();
            let mut occ = OccupancyIndex::new(g.edge_count());
            for i in 0..4 {
                super::helpers::put_car(
                    &mut vehicles,
                    &mut occ,
                    &g,
                    i,
                    &["A", "B", "C"],
                    0.1 * i as f64,
                );
            }
            for tick in 1..=50 {
                advance_vehicles(
                    &mut vehicles, &g, &analyzer, &incidents, &mut occ, DT, Tick(tick),
                )
                .unwrap();
            }
            vehicles
                .values()
                .map(|v| (v.id, v.position_on_edge, v.current_speed, v.path_index))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
