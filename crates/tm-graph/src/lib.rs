//! `tm-graph` — road network, map format, and routing.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`graph`]  | `RoadGraph` (CSR + name interning), `RoadGraphBuilder`    |
//! | [`map`]    | Declarative JSON map format, `MapRegistry`                |
//! | [`router`] | `Router` trait, `EdgeCost`, `Route`, `AStarRouter`        |
//! | [`error`]  | `GraphError`, `RouteError`                                |

pub mod error;
pub mod graph;
pub mod map;
pub mod router;


pub use error::{GraphError, GraphResult, RouteError};
pub use graph::{RoadGraph, RoadGraphBuilder};
pub use map::{MapFile, MapRegistry};
pub use router::{AStarRouter, BaseCost, EdgeCost, Route, Router};
