//! Boundary error type with the four wire error kinds.

use thiserror::Error;

use tm_incident::IncidentError;
use tm_sim::SimError;

/// The closed set of error kinds surfaced to callers.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: unknown mode, node, severity, or distribution.
    Validation,
    /// A named resource (vehicle, incident, map) is absent.
    NotFound,
    /// The operation contradicts current state (spawn with no path,
    /// double-block, resolving a cleared accident).
    Conflict,
    /// The graph is unreachable under current blockages.
    Infeasible,
    /// Engine invariant violation — the tick was aborted.
    Internal,
}

/// Error record returned by every failed boundary operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[derive(serde::Serialize)]
#[error("{kind:?}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Validation, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::NotFound, message: message.into() }
    }
}

impl From<SimError> for ApiError {
    fn from(err: SimError) -> Self {
        let kind = match &err {
            SimError::UnknownNode(_)
            | SimError::UnknownEdge { .. }
            | SimError::Validation(_) => ErrorKind::Validation,

            SimError::VehicleNotFound(_)
            | SimError::AccidentNotFound(_)
            | SimError::UnknownMap(_) => ErrorKind::NotFound,

            SimError::NoPath { .. } => ErrorKind::Conflict,

            SimError::Incident(inner) => match inner {
                IncidentError::UnknownSeverity(_) => ErrorKind::Validation,
                IncidentError::AccidentNotFound(_) | IncidentError::NotBlocked(_) => {
                    ErrorKind::NotFound
                }
                IncidentError::AlreadyBlocked(_) | IncidentError::NoOccupiedEdge => {
                    ErrorKind::Conflict
                }
            },

            SimError::Occupancy(_) | SimError::MapLoad(_) => ErrorKind::Internal,
        };
        Self { kind, message: err.to_string() }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
