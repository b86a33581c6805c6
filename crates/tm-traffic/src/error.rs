//! Traffic-subsystem error type.

use thiserror::Error;

use tm_core::{EdgeId, VehicleId};

/// Occupancy bookkeeping violations.  Both variants mean the engine and the
/// index disagree about where a vehicle is — the tick must be aborted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrafficError {
    #[error("{vehicle} is already tracked on {edge}")]
    AlreadyOnEdge { vehicle: VehicleId, edge: EdgeId },

    #[error("{vehicle} is not on {edge}")]
    NotOnEdge { vehicle: VehicleId, edge: EdgeId },
}

pub type TrafficResult<T> = Result<T, TrafficError>;
