//! Incident-subsystem error type.

use thiserror::Error;

use tm_core::{EdgeId, IncidentId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncidentError {
    #[error("unknown accident severity {0:?}")]
    UnknownSeverity(String),

    #[error("accident {0} not found")]
    AccidentNotFound(IncidentId),

    #[error("{0} is already blocked")]
    AlreadyBlocked(EdgeId),

    #[error("{0} is not blocked")]
    NotBlocked(EdgeId),

    #[error("no occupied edge to place a random accident on")]
    NoOccupiedEdge,
}

pub type IncidentResult<T> = Result<T, IncidentError>;
