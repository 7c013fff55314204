//! Reconciliation engine: keeps a live host subtree in sync with a data
//! object across repeated render passes.

pub mod error;
mod instance;
mod plain;

pub use error::RenderError;
pub use instance::{MAX_REPETITIONS, RenderInstance};
