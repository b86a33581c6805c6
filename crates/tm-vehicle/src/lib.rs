//! `tm-vehicle` — per-vehicle state and continuous kinematics.
//!
//! # Crate layout
//!
//! | Module         | Contents                                           |
//! |----------------|----------------------------------------------------|
//! | [`vehicle`]    | `Vehicle`, `VehicleStatus`                         |
//! | [`kinematics`] | `advance_vehicles` — the per-tick physics pass     |
//!
//! # Movement model
//!
//! Vehicles move **continuously** along edge curves: `position_on_edge ∈
//! [0, 1]` advances by `speed · Δt / L_curve` each tick, with a gap-based
//! car-following rule throttling the target speed behind slower traffic.
//! Edge transitions mutate the occupancy index atomically, so per-tick
//! snapshots are always self-consistent.

pub mod kinematics;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use kinematics::{KinematicsOutcome, advance_vehicles};
pub use vehicle::{Vehicle, VehicleStatus};
