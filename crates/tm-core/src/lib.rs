//! `tm-core` — foundational types for the `rust_tm` traffic microsimulation
//! framework.
//!
//! This crate is a dependency of every other `tm-*` crate.  It intentionally
//! has no `tm-*` dependencies and minimal external ones (only `rand`,
//! `thiserror`, and `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                |
//! |------------|---------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `EdgeId`, `VehicleId`, `IncidentId`           |
//! | [`geom`]   | `Point`, quadratic Bézier curves, curve-length sampling |
//! | [`time`]   | `Tick`, `TickClock` (Δt measurement and clamping)       |
//! | [`rng`]    | `SimRng` — the engine's single seedable RNG             |
//! | [`mode`]   | `VehicleType`, `ModeSet`                                |
//! | [`config`] | `SimConfig` and its defaults                            |
//! | [`error`]  | `CoreError`, `CoreResult`                               |

pub mod config;
pub mod error;
pub mod geom;
pub mod ids;
pub mod mode;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{CoreError, CoreResult};
pub use geom::{CurveGeometry, Point};
pub use ids::{EdgeId, IncidentId, NodeId, VehicleId};
pub use mode::{ModeSet, VehicleType};
pub use rng::SimRng;
pub use time::{Tick, TickClock};
