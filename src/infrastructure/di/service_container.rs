//! Service container for dependency injection
//!
//! Wires up the facet with its provider and analytics sink.

use std::sync::Arc;

use crate::application::services::{ExpansionEngine, ExpansionPolicy, FacetTree, TaxonomyCatalog};
use crate::config::Settings;
use crate::infrastructure::analytics::TracingAnalytics;
use crate::infrastructure::traits::{AnalyticsSink, TaxonomyProvider};

/// Container holding settings and collaborators.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Remote taxonomy
    pub provider: Arc<dyn TaxonomyProvider>,

    /// Metrics collaborator
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl ServiceContainer {
    /// Create a container that logs analytics through tracing.
    pub fn new(settings: Settings, provider: Arc<dyn TaxonomyProvider>) -> Self {
        Self::with_deps(settings, provider, Arc::new(TracingAnalytics))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        provider: Arc<dyn TaxonomyProvider>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            provider,
            analytics,
        }
    }

    pub fn engine(&self) -> ExpansionEngine {
        ExpansionEngine::new(
            TaxonomyCatalog::new(self.provider.clone(), self.settings.page_size),
            ExpansionPolicy::from(self.settings.as_ref()),
        )
    }

    /// A fresh facet tree; each call starts an empty session.
    pub fn facet(&self) -> FacetTree {
        FacetTree::new(
            self.engine(),
            self.analytics.clone(),
            self.settings.analytics.clone(),
        )
    }
}
