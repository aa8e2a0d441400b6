//! Children queries against the taxonomy provider.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ParentRef, TaxonomyRecord};
use crate::infrastructure::traits::TaxonomyProvider;

/// Sort by display text, case-sensitive ascending.
///
/// The sort is stable: entries with equal text keep provider order.
pub fn sort_by_text(records: &mut [TaxonomyRecord]) {
    records.sort_by(|a, b| a.text.cmp(&b.text));
}

/// Fetches one page of children per call and returns it sorted.
pub struct TaxonomyCatalog {
    provider: Arc<dyn TaxonomyProvider>,
    page_size: usize,
}

impl TaxonomyCatalog {
    pub fn new(provider: Arc<dyn TaxonomyProvider>, page_size: usize) -> Self {
        Self {
            provider,
            page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Immediate children of `parent`, at most one page, sorted by text.
    ///
    /// Provider failures are not retried.
    #[instrument(level = "debug", skip(self, parent), fields(parent = %parent))]
    pub async fn fetch_children(&self, parent: &ParentRef) -> ApplicationResult<Vec<TaxonomyRecord>> {
        let mut records = self
            .provider
            .query_children(parent, self.page_size)
            .await
            .map_err(|source| ApplicationError::Provider {
                parent: parent.to_string(),
                source,
            })?;
        records.truncate(self.page_size);
        sort_by_text(&mut records);
        debug!("fetched {} children", records.len());
        Ok(records)
    }
}
