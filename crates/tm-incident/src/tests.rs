//! Unit tests for tm-incident.

#[cfg(test)]
mod severity {
    use crate::AccidentSeverity;

    #[test]
    fn parse_roundtrip() {
        for s in [AccidentSeverity::Minor, AccidentSeverity::Major, AccidentSeverity::Severe] {
            assert_eq!(s.as_str().parse::<AccidentSeverity>().unwrap(), s);
        }
    }

    #[test]
    fn parse_unknown_fails() {
        assert!("catastrophic".parse::<AccidentSeverity>().is_err());
    }

    #[test]
    fn penalties_escalate() {
        assert_eq!(AccidentSeverity::Minor.penalty(), 1.5);
        assert_eq!(AccidentSeverity::Major.penalty(), 2.5);
        assert_eq!(AccidentSeverity::Severe.penalty(), 4.0);
        assert!(AccidentSeverity::Minor < AccidentSeverity::Major);
        assert!(AccidentSeverity::Major < AccidentSeverity::Severe);
    }
}

#[cfg(test)]
mod accidents {
    use tm_core::{EdgeId, SimRng, Tick};

    use crate::{AccidentSeverity, IncidentError, IncidentManager};

    #[test]
    fn create_on_explicit_edge() {
        let mut mgr = IncidentManager::new();
        let mut rng = SimRng::new(1);
        let a = mgr
            .create_accident(Some(EdgeId(3)), &[], AccidentSeverity::Minor, Tick(5), None, &mut rng)
            .unwrap();
        assert_eq!(a.edge, EdgeId(3));
        assert_eq!(a.created_tick, Tick(5));
        assert_eq!(a.clearance_tick, None);
        assert_eq!(mgr.accident_count(), 1);
    }

    #[test]
    fn random_placement_needs_candidates() {
        let mut mgr = IncidentManager::new();
        let mut rng = SimRng::new(1);
        let err = mgr
            .create_accident(None, &[], AccidentSeverity::Minor, Tick(0), None, &mut rng)
            .unwrap_err();
        assert_eq!(err, IncidentError::NoOccupiedEdge);

        let a = mgr
            .create_accident(
                None,
                &[EdgeId(1), EdgeId(4)],
                AccidentSeverity::Major,
                Tick(0),
                None,
                &mut rng,
            )
            .unwrap();
        assert!(a.edge == EdgeId(1) || a.edge == EdgeId(4));
    }

    #[test]
    fn resolve_removes_and_second_resolve_fails() {
        let mut mgr = IncidentManager::new();
        let mut rng = SimRng::new(1);
        let id = mgr
            .create_accident(Some(EdgeId(0)), &[], AccidentSeverity::Minor, Tick(0), None, &mut rng)
            .unwrap()
            .id;
        mgr.resolve_accident(id).unwrap();
        assert_eq!(mgr.resolve_accident(id).unwrap_err(), IncidentError::AccidentNotFound(id));
    }

    #[test]
    fn penalty_composes_multiplicatively() {
        let mut mgr = IncidentManager::new();
        let mut rng = SimRng::new(1);
        mgr.create_accident(Some(EdgeId(2)), &[], AccidentSeverity::Minor, Tick(0), None, &mut rng)
            .unwrap();
        mgr.create_accident(Some(EdgeId(2)), &[], AccidentSeverity::Major, Tick(0), None, &mut rng)
            .unwrap();
        assert_eq!(mgr.severity_penalty(EdgeId(2)), 1.5 * 2.5);
        assert_eq!(mgr.severity_penalty(EdgeId(9)), 1.0);
        assert_eq!(mgr.worst_severity(EdgeId(2)), Some(AccidentSeverity::Major));
    }

    #[test]
    fn expiry_clears_on_schedule() {
        let mut mgr = IncidentManager::new();
        let mut rng = SimRng::new(1);
        mgr.create_accident(Some(EdgeId(0)), &[], AccidentSeverity::Minor, Tick(10), Some(5), &mut rng)
            .unwrap();
        // Persistent accident on another edge.
        mgr.create_accident(Some(EdgeId(1)), &[], AccidentSeverity::Minor, Tick(10), None, &mut rng)
            .unwrap();

        assert!(mgr.expire_accidents(Tick(14)).is_empty());
        let cleared = mgr.expire_accidents(Tick(15));
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].edge, EdgeId(0));
        assert_eq!(mgr.accident_count(), 1);
    }
}

#[cfg(test)]
mod blockages {
    use tm_core::{EdgeId, Tick};

    use crate::{IncidentError, IncidentManager};

    #[test]
    fn block_then_unblock() {
        let mut mgr = IncidentManager::new();
        mgr.block(EdgeId(2), "roadworks", Tick(0)).unwrap();
        assert!(mgr.is_blocked(EdgeId(2)));
        assert!(!mgr.is_blocked(EdgeId(3)));

        let b = mgr.unblock(EdgeId(2)).unwrap();
        assert_eq!(b.reason, "roadworks");
        assert!(!mgr.is_blocked(EdgeId(2)));
    }

    #[test]
    fn double_block_conflicts() {
        let mut mgr = IncidentManager::new();
        mgr.block(EdgeId(2), "a", Tick(0)).unwrap();
        assert_eq!(
            mgr.block(EdgeId(2), "b", Tick(1)).unwrap_err(),
            IncidentError::AlreadyBlocked(EdgeId(2))
        );
    }

    #[test]
    fn unblock_missing_fails() {
        let mut mgr = IncidentManager::new();
        assert_eq!(mgr.unblock(EdgeId(0)).unwrap_err(), IncidentError::NotBlocked(EdgeId(0)));
    }

    #[test]
    fn listings_sorted_by_edge() {
        let mut mgr = IncidentManager::new();
        mgr.block(EdgeId(5), "x", Tick(0)).unwrap();
        mgr.block(EdgeId(1), "y", Tick(0)).unwrap();
        let edges: Vec<EdgeId> = mgr.blockages().iter().map(|b| b.edge).collect();
        assert_eq!(edges, [EdgeId(1), EdgeId(5)]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut mgr = IncidentManager::new();
        mgr.block(EdgeId(0), "x", Tick(0)).unwrap();
        mgr.clear();
        assert_eq!(mgr.blockage_count(), 0);
        assert!(!mgr.is_blocked(EdgeId(0)));
    }
}
