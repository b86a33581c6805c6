//! `tm-incident` — accidents and manual road blockages.
//!
//! Two incident kinds with different effects:
//!
//! - **Accidents** multiply an edge's congestion cost by a severity factor
//!   (minor 1.5×, major 2.5×, severe 4×) but leave it passable.  They clear
//!   when resolved, or automatically after a configured tick count.
//! - **Blockages** make an edge impassable (`cost = ∞`) until unblocked.
//!
//! The manager owns only incident state; vehicle reactions (forced
//! rerouting, `stuck`) are the engine's job.

pub mod error;
pub mod manager;

#[cfg(test)]
mod tests;

pub use error::{IncidentError, IncidentResult};
pub use manager::{Accident, AccidentSeverity, Blockage, IncidentManager};
