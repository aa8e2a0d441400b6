//! Application-level errors (wraps domain and provider errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::ProviderError;

/// Application errors wrap domain errors and add provider context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("fetching children of {parent} failed")]
    Provider {
        parent: String,
        #[source]
        source: ProviderError,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// True when the error came from the remote provider.
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
