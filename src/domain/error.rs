//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the tree model itself.
/// These are independent of provider and infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("bootstrap already ran for this tree")]
    AlreadyBootstrapped,
}
