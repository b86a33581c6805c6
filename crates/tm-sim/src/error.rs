//! Engine error type.

use thiserror::Error;

use tm_core::{IncidentId, VehicleId};
use tm_graph::GraphError;
use tm_incident::IncidentError;
use tm_traffic::TrafficError;

/// Everything `SimEngine` operations can fail with.  The boundary layer
/// maps these onto its four wire error kinds.
#[derive(Debug, Error)]
pub enum SimError {
    // ── Validation ────────────────────────────────────────────────────────
    #[error("unknown node {0:?}")]
    UnknownNode(String),

    #[error("no directed edge {from:?} -> {to:?}")]
    UnknownEdge { from: String, to: String },

    #[error("{0}")]
    Validation(String),

    // ── Not found ─────────────────────────────────────────────────────────
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("accident {0} not found")]
    AccidentNotFound(IncidentId),

    #[error("no map named {0:?}")]
    UnknownMap(String),

    // ── Conflict / infeasible ─────────────────────────────────────────────
    #[error("no path from {from:?} to {to:?}")]
    NoPath { from: String, to: String },

    #[error(transparent)]
    Incident(#[from] IncidentError),

    // ── Fatal ─────────────────────────────────────────────────────────────
    #[error("occupancy invariant violated: {0}")]
    Occupancy(#[from] TrafficError),

    #[error("map load failed: {0}")]
    MapLoad(#[from] GraphError),
}

pub type SimResult<T> = Result<T, SimError>;
