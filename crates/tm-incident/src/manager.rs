//! Incident state and lifecycle.

use std::str::FromStr;

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use tm_core::{EdgeId, IncidentId, SimRng, Tick};

use crate::error::{IncidentError, IncidentResult};

// ── AccidentSeverity ──────────────────────────────────────────────────────────

/// How badly an accident degrades its edge.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccidentSeverity {
    Minor,
    Major,
    Severe,
}

impl AccidentSeverity {
    /// Multiplicative penalty composed onto the edge's congestion multiplier.
    pub fn penalty(self) -> f64 {
        match self {
            AccidentSeverity::Minor  => 1.5,
            AccidentSeverity::Major  => 2.5,
            AccidentSeverity::Severe => 4.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccidentSeverity::Minor  => "minor",
            AccidentSeverity::Major  => "major",
            AccidentSeverity::Severe => "severe",
        }
    }
}

impl FromStr for AccidentSeverity {
    type Err = IncidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor"  => Ok(AccidentSeverity::Minor),
            "major"  => Ok(AccidentSeverity::Major),
            "severe" => Ok(AccidentSeverity::Severe),
            other    => Err(IncidentError::UnknownSeverity(other.to_owned())),
        }
    }
}

impl std::fmt::Display for AccidentSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Incident records ──────────────────────────────────────────────────────────

/// An active accident on a directed edge.
#[derive(Clone, Debug)]
pub struct Accident {
    pub id: IncidentId,
    pub edge: EdgeId,
    pub severity: AccidentSeverity,
    pub created_tick: Tick,
    /// Tick at which the accident auto-clears, when expiry is configured.
    pub clearance_tick: Option<Tick>,
}

/// An active blockage making a directed edge impassable.
#[derive(Clone, Debug)]
pub struct Blockage {
    pub id: IncidentId,
    pub edge: EdgeId,
    pub reason: String,
    pub created_tick: Tick,
}

// ── IncidentManager ───────────────────────────────────────────────────────────

/// Owns all active accidents and blockages.
pub struct IncidentManager {
    accidents: BTreeMap<IncidentId, Accident>,
    /// One blockage per directed edge; keyed by edge for the O(1) passability
    /// check on the routing hot path.
    blockages: FxHashMap<EdgeId, Blockage>,
    next_id: u32,
}

impl IncidentManager {
    pub fn new() -> Self {
        Self {
            accidents: BTreeMap::new(),
            blockages: FxHashMap::default(),
            next_id: 0,
        }
    }

    fn allocate_id(&mut self) -> IncidentId {
        let id = IncidentId(self.next_id);
        self.next_id += 1;
        id
    }

    // ── Accidents ─────────────────────────────────────────────────────────

    /// Create an accident on `edge`, or — when `edge` is `None` — on a
    /// random member of `candidates` (the currently occupied edges, in
    /// ascending order, so the draw is seed-deterministic).
    ///
    /// # Errors
    ///
    /// [`IncidentError::NoOccupiedEdge`] when `edge` is `None` and
    /// `candidates` is empty.
    pub fn create_accident(
        &mut self,
        edge: Option<EdgeId>,
        candidates: &[EdgeId],
        severity: AccidentSeverity,
        now: Tick,
        clear_after_ticks: Option<u64>,
        rng: &mut SimRng,
    ) -> IncidentResult<&Accident> {
        let edge = match edge {
            Some(e) => e,
            None => *rng.choose(candidates).ok_or(IncidentError::NoOccupiedEdge)?,
        };
        let id = self.allocate_id();
        let accident = Accident {
            id,
            edge,
            severity,
            created_tick: now,
            clearance_tick: clear_after_ticks.map(|n| now + n),
        };
        self.accidents.insert(id, accident);
        Ok(&self.accidents[&id])
    }

    /// Remove an accident immediately.
    ///
    /// # Errors
    ///
    /// [`IncidentError::AccidentNotFound`] if `id` is unknown or already
    /// cleared.
    pub fn resolve_accident(&mut self, id: IncidentId) -> IncidentResult<Accident> {
        self.accidents.remove(&id).ok_or(IncidentError::AccidentNotFound(id))
    }

    /// Remove every accident whose clearance tick has passed.  Returns the
    /// cleared accidents (for logging).
    pub fn expire_accidents(&mut self, now: Tick) -> Vec<Accident> {
        let expired: Vec<IncidentId> = self
            .accidents
            .values()
            .filter(|a| a.clearance_tick.is_some_and(|t| t <= now))
            .map(|a| a.id)
            .collect();
        expired
            .into_iter()
            .map(|id| self.accidents.remove(&id).expect("id collected above"))
            .collect()
    }

    /// Active accidents in ascending id order.
    pub fn accidents(&self) -> impl Iterator<Item = &Accident> {
        self.accidents.values()
    }

    /// Product of severity penalties of all accidents on `edge` (1.0 when
    /// the edge is clean).
    pub fn severity_penalty(&self, edge: EdgeId) -> f64 {
        self.accidents
            .values()
            .filter(|a| a.edge == edge)
            .map(|a| a.severity.penalty())
            .product()
    }

    /// The worst active accident severity on `edge`, if any.
    pub fn worst_severity(&self, edge: EdgeId) -> Option<AccidentSeverity> {
        self.accidents
            .values()
            .filter(|a| a.edge == edge)
            .map(|a| a.severity)
            .max()
    }

    // ── Blockages ─────────────────────────────────────────────────────────

    /// Make `edge` impassable.
    ///
    /// # Errors
    ///
    /// [`IncidentError::AlreadyBlocked`] if a blockage is already active on
    /// the edge.
    pub fn block(
        &mut self,
        edge: EdgeId,
        reason: impl Into<String>,
        now: Tick,
    ) -> IncidentResult<&Blockage> {
        if self.blockages.contains_key(&edge) {
            return Err(IncidentError::AlreadyBlocked(edge));
        }
        let id = self.allocate_id();
        self.blockages.insert(edge, Blockage {
            id,
            edge,
            reason: reason.into(),
            created_tick: now,
        });
        Ok(&self.blockages[&edge])
    }

    /// Lift the blockage on `edge`.
    ///
    /// # Errors
    ///
    /// [`IncidentError::NotBlocked`] if the edge has no active blockage.
    pub fn unblock(&mut self, edge: EdgeId) -> IncidentResult<Blockage> {
        self.blockages.remove(&edge).ok_or(IncidentError::NotBlocked(edge))
    }

    #[inline]
    pub fn is_blocked(&self, edge: EdgeId) -> bool {
        self.blockages.contains_key(&edge)
    }

    /// Active blockages in ascending edge order (deterministic listings).
    pub fn blockages(&self) -> Vec<&Blockage> {
        let mut list: Vec<&Blockage> = self.blockages.values().collect();
        list.sort_by_key(|b| b.edge);
        list
    }

    pub fn accident_count(&self) -> usize {
        self.accidents.len()
    }

    pub fn blockage_count(&self) -> usize {
        self.blockages.len()
    }

    /// Drop all incidents (reset / map switch).
    pub fn clear(&mut self) {
        self.accidents.clear();
        self.blockages.clear();
    }
}

impl Default for IncidentManager {
    fn default() -> Self {
        Self::new()
    }
}
