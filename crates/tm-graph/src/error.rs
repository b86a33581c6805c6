//! Graph and routing error types.

use thiserror::Error;

use tm_core::NodeId;

/// Errors from map loading and graph construction.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate node name {0:?}")]
    DuplicateNode(String),

    #[error("duplicate directed edge {from:?} -> {to:?}")]
    DuplicateEdge { from: String, to: String },

    #[error("edge endpoint {0:?} is not a known node")]
    UnknownNode(String),

    #[error("edge {from:?} -> {to:?} has non-positive length")]
    NonPositiveLength { from: String, to: String },

    #[error("no map named {0:?} in the registry")]
    UnknownMap(String),

    #[error("map parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Routing failure — kept separate from [`GraphError`] because callers
/// treat "no path" as a domain outcome, not a graph defect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },
}
