//! Domain-level errors

use thiserror::Error;

/// Domain errors raised while building the plan tree.
///
/// Malformed nesting is not an error: closers without an open block are
/// clamped at the root.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("failed to read plan output: {0}")]
    Read(#[from] std::io::Error),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
