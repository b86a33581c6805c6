//! Framework base error type.
//!
//! Sub-crates define their own error enums and either convert into
//! `CoreError` via `From` impls or wrap it as one variant.  Prefer whichever
//! keeps error sites clean.

use thiserror::Error;

/// The base error type for `tm-core` and a common ground for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown vehicle mode {0:?}")]
    UnknownMode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type.
pub type CoreResult<T> = Result<T, CoreError>;
