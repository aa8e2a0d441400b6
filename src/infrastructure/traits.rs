//! I/O boundary traits for testability
//!
//! These traits abstract the remote taxonomy provider and the analytics
//! collaborator, allowing services to be tested with mock implementations.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{ParentRef, TaxonomyRecord};

/// Failure reported by a taxonomy provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("unknown parent: {0}")]
    UnknownParent(String),
}

/// Remote paged hierarchy provider.
///
/// Returns at most `page_size` immediate children of `parent`, each carrying
/// its own child count and full path. Ordering is up to the provider.
#[async_trait]
pub trait TaxonomyProvider: Send + Sync {
    async fn query_children(
        &self,
        parent: &ParentRef,
        page_size: usize,
    ) -> Result<Vec<TaxonomyRecord>, ProviderError>;
}

/// Direction of a user-triggered expand action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsAction {
    Expand,
    Contract,
}

impl AnalyticsAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Contract => "contract",
        }
    }
}

impl fmt::Display for AnalyticsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event handed to the metrics collaborator on each user expand action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEvent {
    pub category: String,
    pub action: AnalyticsAction,
    pub label: String,
}

/// Failure of an analytics sink. Never affects tree state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("analytics sink failed: {0}")]
pub struct AnalyticsError(pub String);

/// Fire-and-forget metrics collaborator.
pub trait AnalyticsSink: Send + Sync {
    fn track_event(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError>;
}
