//! Unit tests for tm-traffic.

#[cfg(test)]
mod helpers {
    use tm_core::{ModeSet, Point, SimConfig, VehicleType};
    use tm_graph::{RoadGraph, RoadGraphBuilder};

    /// Chain X → Y → Z, car-only, one-way, length 60 each (short enough
    /// that capacity stays at the configured base).
    pub fn chain() -> RoadGraph {
        let mut b = RoadGraphBuilder::new();
        b.add_node("X", Point::new(0.0, 0.0))
            .add_node("Y", Point::new(60.0, 0.0))
            .add_node("Z", Point::new(120.0, 0.0));
        b.add_edge("X", "Y", 60.0, ModeSet::single(VehicleType::Car), true)
            .add_edge("Y", "Z", 60.0, ModeSet::single(VehicleType::Car), true);
        b.build().unwrap()
    }

    pub fn config() -> SimConfig {
        SimConfig { base_edge_capacity: 3.0, ..SimConfig::default() }
    }
}

// ── Occupancy ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod occupancy {
    use tm_core::{EdgeId, VehicleId};

    use crate::{OccupancyIndex, TrafficError};

    #[test]
    fn enter_then_leave() {
        let mut occ = OccupancyIndex::new(2);
        let e = EdgeId(0);
        occ.enter(VehicleId(1), e, 1.0).unwrap();
        assert_eq!(occ.count(e), 1);
        assert_eq!(occ.weighted_load(e), 1.0);
        assert_eq!(occ.edge_of(VehicleId(1)), Some(e));

        occ.leave(VehicleId(1), e).unwrap();
        assert_eq!(occ.count(e), 0);
        assert_eq!(occ.weighted_load(e), 0.0);
        assert_eq!(occ.edge_of(VehicleId(1)), None);
    }

    #[test]
    fn weighted_load_sums_weights() {
        let mut occ = OccupancyIndex::new(1);
        let e = EdgeId(0);
        occ.enter(VehicleId(0), e, 1.0).unwrap(); // car
        occ.enter(VehicleId(1), e, 0.5).unwrap(); // bicycle
        occ.enter(VehicleId(2), e, 0.2).unwrap(); // pedestrian
        assert_eq!(occ.count(e), 3);
        assert!((occ.weighted_load(e) - 1.7).abs() < 1e-12);
    }

    #[test]
    fn membership_is_sorted() {
        let mut occ = OccupancyIndex::new(1);
        let e = EdgeId(0);
        for id in [5u32, 1, 3] {
            occ.enter(VehicleId(id), e, 1.0).unwrap();
        }
        let ids: Vec<u32> = occ.on(e).iter().map(|v| v.0).collect();
        assert_eq!(ids, [1, 3, 5]);
    }

    #[test]
    fn double_enter_rejected() {
        let mut occ = OccupancyIndex::new(2);
        occ.enter(VehicleId(7), EdgeId(0), 1.0).unwrap();
        let err = occ.enter(VehicleId(7), EdgeId(1), 1.0).unwrap_err();
        assert_eq!(
            err,
            TrafficError::AlreadyOnEdge { vehicle: VehicleId(7), edge: EdgeId(0) }
        );
    }

    #[test]
    fn leave_without_enter_is_violation() {
        let mut occ = OccupancyIndex::new(1);
        let err = occ.leave(VehicleId(9), EdgeId(0)).unwrap_err();
        assert_eq!(err, TrafficError::NotOnEdge { vehicle: VehicleId(9), edge: EdgeId(0) });
    }

    #[test]
    fn leave_wrong_edge_is_violation() {
        let mut occ = OccupancyIndex::new(2);
        occ.enter(VehicleId(9), EdgeId(0), 1.0).unwrap();
        assert!(occ.leave(VehicleId(9), EdgeId(1)).is_err());
    }

    #[test]
    fn occupied_edges_ascending() {
        let mut occ = OccupancyIndex::new(4);
        occ.enter(VehicleId(0), EdgeId(3), 1.0).unwrap();
        occ.enter(VehicleId(1), EdgeId(1), 1.0).unwrap();
        let edges: Vec<_> = occ.occupied_edges().collect();
        assert_eq!(edges, [EdgeId(1), EdgeId(3)]);
        assert_eq!(occ.total(), 2);
    }

    #[test]
    fn clear_empties_everything() {
        let mut occ = OccupancyIndex::new(2);
        occ.enter(VehicleId(0), EdgeId(0), 1.0).unwrap();
        occ.clear();
        assert_eq!(occ.total(), 0);
        assert_eq!(occ.count(EdgeId(0)), 0);
        assert_eq!(occ.weighted_load(EdgeId(0)), 0.0);
    }
}

// ── Congestion levels ─────────────────────────────────────────────────────────

#[cfg(test)]
mod levels {
    use crate::CongestionLevel;

    #[test]
    fn threshold_boundaries() {
        assert_eq!(CongestionLevel::from_density(0.0), CongestionLevel::FreeFlow);
        assert_eq!(CongestionLevel::from_density(0.299), CongestionLevel::FreeFlow);
        assert_eq!(CongestionLevel::from_density(0.3), CongestionLevel::Light);
        assert_eq!(CongestionLevel::from_density(0.6), CongestionLevel::Moderate);
        assert_eq!(CongestionLevel::from_density(0.85), CongestionLevel::Heavy);
        // Exactly at capacity is heavy only up to (not including) 1.0.
        assert_eq!(CongestionLevel::from_density(1.0 - 1e-9), CongestionLevel::Heavy);
        assert_eq!(CongestionLevel::from_density(1.0), CongestionLevel::Congested);
        assert_eq!(CongestionLevel::from_density(3.0), CongestionLevel::Congested);
    }

    #[test]
    fn bands_are_contiguous() {
        use CongestionLevel::*;
        let order = [FreeFlow, Light, Moderate, Heavy, Congested];
        for pair in order.windows(2) {
            assert_eq!(pair[0].multiplier_range().1, pair[1].multiplier_range().0);
        }
        assert_eq!(FreeFlow.multiplier_range().0, 0.5);
        assert_eq!(Congested.multiplier_range().1, 5.0);
    }
}

// ── Analyzer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod analyzer {
    use tm_core::{EdgeId, SimRng, VehicleId};

    use crate::{CongestionLevel, OccupancyIndex, TrafficAnalyzer};

    #[test]
    fn empty_edges_stay_free_flow() {
        let g = super::helpers::chain();
        let mut analyzer = TrafficAnalyzer::new(&g, &super::helpers::config());
        let occ = OccupancyIndex::new(g.edge_count());
        let mut rng = SimRng::new(1);

        analyzer.recompute(&occ, &mut rng);
        let flow = analyzer.flow(EdgeId(0));
        assert_eq!(flow.vehicle_count, 0);
        assert_eq!(flow.level, CongestionLevel::FreeFlow);
        assert!(flow.probability <= 0.5);
    }

    #[test]
    fn capacity_uses_base_for_short_edges() {
        let g = super::helpers::chain();
        let analyzer = TrafficAnalyzer::new(&g, &super::helpers::config());
        assert_eq!(analyzer.capacity(EdgeId(0)), 3.0);
    }

    #[test]
    fn overload_reaches_congested_with_full_probability() {
        let g = super::helpers::chain();
        let mut analyzer = TrafficAnalyzer::new(&g, &super::helpers::config());
        let mut occ = OccupancyIndex::new(g.edge_count());
        let mut rng = SimRng::new(1);

        // 10 cars on edge 0 (capacity 3) → density ≈ 3.3.
        for id in 0..10 {
            occ.enter(VehicleId(id), EdgeId(0), 1.0).unwrap();
        }
        analyzer.recompute(&occ, &mut rng);

        let flow = analyzer.flow(EdgeId(0));
        assert_eq!(flow.vehicle_count, 10);
        assert_eq!(flow.level, CongestionLevel::Congested);
        assert!(flow.density > 3.0);
        assert_eq!(flow.probability, 1.0);
    }

    #[test]
    fn multiplier_converges_into_level_band() {
        let g = super::helpers::chain();
        let mut analyzer = TrafficAnalyzer::new(&g, &super::helpers::config());
        let mut occ = OccupancyIndex::new(g.edge_count());
        let mut rng = SimRng::new(7);

        for id in 0..10 {
            occ.enter(VehicleId(id), EdgeId(0), 1.0).unwrap();
        }
        // EMA starts from 1.0; after ~20 congested ticks it must sit inside
        // the congested band.
        for _ in 0..20 {
            analyzer.recompute(&occ, &mut rng);
        }
        let m = analyzer.multiplier(EdgeId(0));
        assert!((3.5..5.0).contains(&m), "multiplier {m} outside congested band");
    }

    #[test]
    fn smoothing_limits_per_tick_jump() {
        let g = super::helpers::chain();
        let mut analyzer = TrafficAnalyzer::new(&g, &super::helpers::config());
        let mut occ = OccupancyIndex::new(g.edge_count());
        let mut rng = SimRng::new(3);

        for id in 0..10 {
            occ.enter(VehicleId(id), EdgeId(0), 1.0).unwrap();
        }
        analyzer.recompute(&occ, &mut rng);
        // One tick from m=1.0 with α=0.3 and a sample ≤ 5.0 cannot exceed
        // 0.3·5 + 0.7·1 = 2.2.
        assert!(analyzer.multiplier(EdgeId(0)) <= 2.2);
    }

    #[test]
    fn bottleneck_ranking_by_probability_then_count() {
        let g = super::helpers::chain();
        let mut analyzer = TrafficAnalyzer::new(&g, &super::helpers::config());
        let mut occ = OccupancyIndex::new(g.edge_count());
        let mut rng = SimRng::new(5);

        // Edge 0 overloaded, edge 1 lightly used.
        for id in 0..10 {
            occ.enter(VehicleId(id), EdgeId(0), 1.0).unwrap();
        }
        occ.enter(VehicleId(100), EdgeId(1), 1.0).unwrap();
        occ.enter(VehicleId(101), EdgeId(1), 1.0).unwrap();
        analyzer.recompute(&occ, &mut rng);

        let ranked = analyzer.bottlenecks(2);
        assert_eq!(ranked[0], EdgeId(0));
        assert_eq!(ranked[1], EdgeId(1));
        assert!(analyzer.probability(EdgeId(0)) >= 0.9);
    }

    #[test]
    fn same_seed_same_multipliers() {
        let g = super::helpers::chain();
        let occ = OccupancyIndex::new(g.edge_count());

        let mut a = TrafficAnalyzer::new(&g, &super::helpers::config());
        let mut b = TrafficAnalyzer::new(&g, &super::helpers::config());
        let mut rng_a = SimRng::new(42);
        let mut rng_b = SimRng::new(42);

        for _ in 0..5 {
            a.recompute(&occ, &mut rng_a);
            b.recompute(&occ, &mut rng_b);
        }
        for e in 0..g.edge_count() as u32 {
            assert_eq!(a.multiplier(EdgeId(e)), b.multiplier(EdgeId(e)));
            assert_eq!(a.probability(EdgeId(e)), b.probability(EdgeId(e)));
        }
    }

    #[test]
    fn reset_returns_to_defaults() {
        let g = super::helpers::chain();
        let mut analyzer = TrafficAnalyzer::new(&g, &super::helpers::config());
        let mut occ = OccupancyIndex::new(g.edge_count());
        let mut rng = SimRng::new(9);

        occ.enter(VehicleId(0), EdgeId(0), 1.0).unwrap();
        analyzer.recompute(&occ, &mut rng);
        analyzer.reset();

        let flow = analyzer.flow(EdgeId(0));
        assert_eq!(flow.vehicle_count, 0);
        assert_eq!(flow.multiplier, 1.0);
        assert_eq!(flow.probability, 0.0);
        assert_eq!(flow.level, CongestionLevel::FreeFlow);
    }
}
