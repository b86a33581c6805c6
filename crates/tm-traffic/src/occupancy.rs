//! The occupancy index: directed edge → vehicles currently traversing it.
//!
//! Vehicles are tracked from the moment they enter an edge (position 0), so
//! queued vehicles at a node mouth are visible to the car-following scan.
//! All operations are O(1) amortized except the per-edge membership insert,
//! which keeps id lists sorted (O(log k) search + O(k) shift on edges with
//! k occupants — k is small by construction).
//!
//! The index stores only ids; vehicle state lives in the engine's vehicle
//! map.  `enter`/`leave` must be called exactly once per edge transition:
//! leaving an edge the vehicle never entered is an invariant violation the
//! engine treats as fatal for the tick.

use rustc_hash::FxHashMap;

use tm_core::{EdgeId, VehicleId};

use crate::error::{TrafficError, TrafficResult};

/// Edge-indexed multiset of vehicles, with per-edge weighted load maintained
/// incrementally.
pub struct OccupancyIndex {
    /// Vehicles on each edge, sorted by id.  Indexed by `EdgeId`.
    on_edge: Vec<Vec<VehicleId>>,

    /// Σ capacity_weight of the vehicles on each edge.
    weighted: Vec<f64>,

    /// Reverse map: which edge each tracked vehicle is on, and the weight it
    /// contributed (so `leave` subtracts exactly what `enter` added).
    edge_of: FxHashMap<VehicleId, (EdgeId, f64)>,
}

impl OccupancyIndex {
    /// An index for a graph with `edge_count` directed edges, all empty.
    pub fn new(edge_count: usize) -> Self {
        Self {
            on_edge: vec![Vec::new(); edge_count],
            weighted: vec![0.0; edge_count],
            edge_of: FxHashMap::default(),
        }
    }

    /// Record `vehicle` entering `edge`, contributing `weight` to the load.
    ///
    /// # Errors
    ///
    /// [`TrafficError::AlreadyOnEdge`] if the vehicle is already tracked —
    /// the caller must `leave` first.
    pub fn enter(&mut self, vehicle: VehicleId, edge: EdgeId, weight: f64) -> TrafficResult<()> {
        if let Some(&(on, _)) = self.edge_of.get(&vehicle) {
            return Err(TrafficError::AlreadyOnEdge { vehicle, edge: on });
        }
        let list = &mut self.on_edge[edge.index()];
        let pos = match list.binary_search(&vehicle) {
            Ok(_) => return Err(TrafficError::AlreadyOnEdge { vehicle, edge }),
            Err(pos) => pos,
        };
        list.insert(pos, vehicle);
        self.weighted[edge.index()] += weight;
        self.edge_of.insert(vehicle, (edge, weight));
        Ok(())
    }

    /// Record `vehicle` leaving `edge`.
    ///
    /// # Errors
    ///
    /// [`TrafficError::NotOnEdge`] if the vehicle is not tracked on `edge` —
    /// an occupancy invariant violation.
    pub fn leave(&mut self, vehicle: VehicleId, edge: EdgeId) -> TrafficResult<()> {
        match self.edge_of.get(&vehicle) {
            Some(&(on, weight)) if on == edge => {
                let list = &mut self.on_edge[edge.index()];
                let pos = list
                    .binary_search(&vehicle)
                    .map_err(|_| TrafficError::NotOnEdge { vehicle, edge })?;
                list.remove(pos);
                self.weighted[edge.index()] = (self.weighted[edge.index()] - weight).max(0.0);
                self.edge_of.remove(&vehicle);
                Ok(())
            }
            _ => Err(TrafficError::NotOnEdge { vehicle, edge }),
        }
    }

    /// The vehicles currently on `edge`, sorted by id.
    #[inline]
    pub fn on(&self, edge: EdgeId) -> &[VehicleId] {
        &self.on_edge[edge.index()]
    }

    /// Number of vehicles on `edge`.
    #[inline]
    pub fn count(&self, edge: EdgeId) -> usize {
        self.on_edge[edge.index()].len()
    }

    /// Weighted load of `edge` (Σ capacity weights).
    #[inline]
    pub fn weighted_load(&self, edge: EdgeId) -> f64 {
        self.weighted[edge.index()]
    }

    /// The edge `vehicle` is currently on, if tracked.
    #[inline]
    pub fn edge_of(&self, vehicle: VehicleId) -> Option<EdgeId> {
        self.edge_of.get(&vehicle).map(|&(e, _)| e)
    }

    /// Edges with at least one vehicle, in ascending edge order.
    pub fn occupied_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.on_edge
            .iter()
            .enumerate()
            .filter(|(_, list)| !list.is_empty())
            .map(|(i, _)| EdgeId(i as u32))
    }

    /// Total number of tracked vehicles.
    pub fn total(&self) -> usize {
        self.edge_of.len()
    }

    /// Drop all tracked vehicles (reset).
    pub fn clear(&mut self) {
        for list in &mut self.on_edge {
            list.clear();
        }
        self.weighted.fill(0.0);
        self.edge_of.clear();
    }
}
