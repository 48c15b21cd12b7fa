//! Frame execution outcomes and the trap-to-error bridge.
mod error;

pub use error::ExecutionError;
