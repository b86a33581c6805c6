//! `tm-traffic` — edge occupancy and live congestion analysis.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`occupancy`] | `OccupancyIndex` — which vehicles are on which edge     |
//! | [`analyzer`]  | `TrafficAnalyzer` — density, level, multiplier, probability, bottlenecks |
//! | [`error`]     | `TrafficError`                                          |

pub mod analyzer;
pub mod error;
pub mod occupancy;

#[cfg(test)]
mod tests;

pub use analyzer::{CongestionLevel, EdgeFlow, TrafficAnalyzer};
pub use error::{TrafficError, TrafficResult};
pub use occupancy::OccupancyIndex;
