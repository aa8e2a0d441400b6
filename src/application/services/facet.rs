//! Facet adapter: the single user-facing mutation path of the tree.

use std::sync::Arc;

use termtree::Tree;
use tracing::{instrument, warn};

use crate::application::services::expansion::{
    BootstrapReport, ExpansionEngine, NodeView, ToggleOutcome,
};
use crate::application::ApplicationResult;
use crate::config::AnalyticsSettings;
use crate::domain::{DomainError, NodeKey, PathPrefixSet};
use crate::infrastructure::traits::{AnalyticsAction, AnalyticsEvent, AnalyticsSink};

/// Taxonomy facet as seen by a UI: read-only views plus `expand`.
pub struct FacetTree {
    engine: ExpansionEngine,
    analytics: Arc<dyn AnalyticsSink>,
    settings: AnalyticsSettings,
}

impl FacetTree {
    pub fn new(
        engine: ExpansionEngine,
        analytics: Arc<dyn AnalyticsSink>,
        settings: AnalyticsSettings,
    ) -> Self {
        Self {
            engine,
            analytics,
            settings,
        }
    }

    /// Host binding: push the current filter selection.
    pub fn set_active_filters<S: AsRef<str>>(&self, filters: &[S]) -> bool {
        self.engine.set_active_filters(filters)
    }

    pub fn prefixes(&self) -> PathPrefixSet {
        self.engine.prefixes()
    }

    /// Component initialization.
    pub async fn bootstrap(&self) -> BootstrapReport {
        self.engine.bootstrap().await
    }

    /// User clicked the expander of `key`.
    ///
    /// Emits `expand` or `contract` depending on the current state, then
    /// toggles. A failing analytics sink is logged and otherwise ignored.
    #[instrument(level = "debug", skip(self), fields(node = %key))]
    pub async fn expand(&self, key: NodeKey) -> ApplicationResult<ToggleOutcome> {
        let node = self
            .engine
            .node(key)
            .ok_or_else(|| DomainError::UnknownNode(key.to_string()))?;
        self.track(&node);
        self.engine.toggle(key).await
    }

    /// [`FacetTree::expand`] addressed by taxonomy id.
    pub async fn expand_id(&self, id: &str) -> ApplicationResult<ToggleOutcome> {
        let key = self
            .engine
            .find(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))?;
        self.expand(key).await
    }

    fn track(&self, node: &NodeView) {
        if !self.settings.enabled {
            return;
        }
        let action = if node.is_expanded() {
            AnalyticsAction::Contract
        } else {
            AnalyticsAction::Expand
        };
        let event = AnalyticsEvent {
            category: self.settings.category.clone(),
            action,
            label: format!("{}{}", self.settings.label_prefix, node.text),
        };
        if let Err(e) = self.analytics.track_event(&event) {
            warn!("dropping analytics event for {}: {}", node.id, e);
        }
    }

    pub fn roots(&self) -> Vec<NodeKey> {
        self.engine.roots()
    }

    pub fn find(&self, id: &str) -> Option<NodeKey> {
        self.engine.find(id)
    }

    pub fn node(&self, key: NodeKey) -> Option<NodeView> {
        self.engine.node(key)
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeView> {
        self.engine.node_by_id(id)
    }

    pub fn children(&self, key: NodeKey) -> Vec<NodeView> {
        self.engine.children(key)
    }

    pub fn visible(&self) -> Vec<NodeView> {
        self.engine.visible()
    }

    pub fn render(&self) -> Tree<String> {
        self.engine.render()
    }
}
