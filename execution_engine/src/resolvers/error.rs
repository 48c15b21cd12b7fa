use thiserror::Error;

/// Errors produced while resolving a contract's imports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolverError {
    /// The module did not import its memory from the host.
    #[error("no imported memory")]
    NoImportedMemory,
}
