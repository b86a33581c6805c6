//! `tm-sim` — the simulation engine and its tick loop.
//!
//! # Tick phases
//!
//! ```text
//! for each tick:
//!   ① Δt       — fixed (manual stepping) or measured+clamped (continuous)
//!   ② Incidents — expire accidents whose clearance tick has passed
//!   ③ Analyzer  — recompute density/level/multiplier/probability per edge
//!   ④ Reroutes  — lookahead + cost-growth triggers, rate-limited, forced
//!                 for vehicles whose path crosses a fresh blockage
//!   ⑤ Physics   — car-following kinematics for every active vehicle,
//!                 ascending id order
//!   ⑥ Spawning  — optional population top-up
//!   ⑦ tick += 1
//! ```
//!
//! All state mutation happens inside [`SimEngine`]; external surfaces hold
//! the engine behind a lock and call its methods between ticks.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let mut sim = SimBuilder::new(SimConfig::default()).map("city").build()?;
//! let ids = sim.spawn_many(30, SpawnMix::default())?;
//! sim.run_ticks(200, &mut NoopObserver)?;
//! println!("{:?}", sim.vehicle_stats());
//! ```

pub mod builder;
pub mod costs;
pub mod engine;
pub mod error;
pub mod observer;
pub mod spawn;
pub mod stats;


pub use builder::SimBuilder;
pub use costs::LiveCost;
pub use engine::SimEngine;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use spawn::SpawnMix;
pub use stats::{TrafficStats, VehicleStats};
