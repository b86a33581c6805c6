//! Unit tests for tm-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId, VehicleId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn ordering() {
        assert!(VehicleId(0) < VehicleId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert_eq!(VehicleId::INVALID.0, u32::MAX);
    }

    #[test]
    fn wire_id_roundtrip() {
        assert_eq!(VehicleId(7).wire(), "v7");
        assert_eq!(VehicleId::from_wire("v7"), Some(VehicleId(7)));
        assert_eq!(VehicleId::from_wire("x7"), None);
        assert_eq!(VehicleId::from_wire("v"), None);
    }
}

#[cfg(test)]
mod geom {
    use crate::{CurveGeometry, Point};

    #[test]
    fn zero_distance() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(p.distance(p), 0.0);
    }

    #[test]
    fn pythagorean_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn curve_is_deterministic() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        let c1 = CurveGeometry::for_edge("A", "B", a, b);
        let c2 = CurveGeometry::for_edge("A", "B", a, b);
        assert_eq!(c1, c2);
    }

    #[test]
    fn reverse_edge_has_own_curve() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        let fwd = CurveGeometry::for_edge("A", "B", a, b);
        let rev = CurveGeometry::for_edge("B", "A", b, a);
        // Direction-sensitive hash: the two directions bow independently.
        assert_ne!(fwd.control, rev.control);
    }

    #[test]
    fn curve_length_at_least_chord() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        let c = CurveGeometry::for_edge("A", "B", a, b);
        assert!(c.curve_length >= a.distance(b));
        // A 20 %-offset quadratic never exceeds ~1.2× the chord.
        assert!(c.curve_length <= 1.2 * a.distance(b));
    }

    #[test]
    fn curve_endpoints() {
        let a = Point::new(10.0, 20.0);
        let b = Point::new(110.0, 20.0);
        let c = CurveGeometry::for_edge("A", "B", a, b);
        assert_eq!(c.point_at(a, b, 0.0), a);
        assert_eq!(c.point_at(a, b, 1.0), b);
    }

    #[test]
    fn degenerate_edge() {
        let a = Point::new(5.0, 5.0);
        let c = CurveGeometry::for_edge("A", "A2", a, a);
        assert_eq!(c.curve_length, 0.0);
    }
}

#[cfg(test)]
mod time {
    use crate::time::{DT_MAX_SECS, DT_MIN_SECS};
    use crate::{Tick, TickClock};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15).since(Tick(10)), 5);
        assert_eq!(Tick(10).since(Tick(15)), 0); // saturates
    }

    #[test]
    fn fixed_clock_is_constant() {
        let mut clock = TickClock::fixed(100);
        assert_eq!(clock.delta_secs(), 0.1);
        assert_eq!(clock.delta_secs(), 0.1);
    }

    #[test]
    fn measured_clock_is_clamped() {
        let mut clock = TickClock::measured();
        // First delta has no reference point and uses the lower clamp.
        assert_eq!(clock.delta_secs(), DT_MIN_SECS);
        // Subsequent deltas are measured; back-to-back calls are near-zero
        // and must clamp up to the minimum.
        let dt = clock.delta_secs();
        assert!((DT_MIN_SECS..=DT_MAX_SECS).contains(&dt));
    }
}

#[cfg(test)]
mod mode {
    use crate::{ModeSet, VehicleType};

    #[test]
    fn parse_roundtrip() {
        for mode in VehicleType::ALL {
            assert_eq!(mode.as_str().parse::<VehicleType>().unwrap(), mode);
        }
    }

    #[test]
    fn parse_unknown_fails() {
        assert!("horse".parse::<VehicleType>().is_err());
    }

    #[test]
    fn type_constants_ordered() {
        // Cars are the fastest and heaviest; pedestrians the opposite.
        assert!(VehicleType::Car.max_speed() > VehicleType::Bicycle.max_speed());
        assert!(VehicleType::Bicycle.max_speed() > VehicleType::Pedestrian.max_speed());
        assert!(VehicleType::Car.capacity_weight() > VehicleType::Pedestrian.capacity_weight());
    }

    #[test]
    fn mode_set_membership() {
        let set: ModeSet = [VehicleType::Car, VehicleType::Bicycle].into_iter().collect();
        assert!(set.allows(VehicleType::Car));
        assert!(set.allows(VehicleType::Bicycle));
        assert!(!set.allows(VehicleType::Pedestrian));
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn empty_and_all() {
        assert!(ModeSet::EMPTY.is_empty());
        for mode in VehicleType::ALL {
            assert!(ModeSet::ALL.allows(mode));
        }
    }
}

#[cfg(test)]
mod config {
    use crate::SimConfig;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn tick_interval_bounds() {
        let mut cfg = SimConfig::default();
        cfg.tick_interval_ms = 10;
        assert!(cfg.validate().is_err());
        cfg.tick_interval_ms = 500;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn alpha_bounds() {
        let mut cfg = SimConfig::default();
        cfg.multiplier_smoothing_alpha = 1.5;
        assert!(cfg.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..32 {
            assert_eq!(a.gen_range(0u32..1000), b.gen_range(0u32..1000));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        let draws_a: Vec<u32> = (0..8).map(|_| a.gen_range(0..u32::MAX)).collect();
        let draws_b: Vec<u32> = (0..8).map(|_| b.gen_range(0..u32::MAX)).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn child_streams_are_deterministic_and_distinct() {
        let mut a = SimRng::new(9);
        let mut b = SimRng::new(9);
        let mut child_a = a.child(1);
        let mut child_b = b.child(1);
        assert_eq!(child_a.gen_range(0u64..u64::MAX), child_b.gen_range(0u64..u64::MAX));

        let mut other = SimRng::new(9).child(2);
        assert_ne!(
            SimRng::new(9).child(1).gen_range(0u64..u64::MAX),
            other.gen_range(0u64..u64::MAX)
        );
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }
}
