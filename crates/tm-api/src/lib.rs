//! `tm-api` — the external boundary of the simulation.
//!
//! An HTTP layer (out of scope here) is a thin adapter over [`SimHandle`]:
//! every operation takes and returns plain serializable data, all state
//! lives behind one mutex, and a query issued while a tick is running
//! observes the state as of the last completed tick.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                   |
//! |-----------|------------------------------------------------------------|
//! | [`ops`]   | `SimHandle` — every command and query, continuous runner   |
//! | [`wire`]  | JSON record types (vehicles, edge traffic, state, reports) |
//! | [`error`] | `ApiError` with the four wire error kinds                  |

pub mod error;
pub mod ops;
pub mod wire;


pub use error::{ApiError, ApiResult, ErrorKind};
pub use ops::SimHandle;
pub use wire::{
    AccidentRecord, BlockageRecord, EdgeKey, EdgeTrafficRecord, HealthRecord, MapListRecord,
    SimInfoRecord, StateRecord, VehicleRecord,
};
