//! Shared test fixtures: an instrumented in-memory taxonomy provider.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use taxotree::application::services::{
    ExpansionEngine, ExpansionPolicy, FacetTree, TaxonomyCatalog,
};
use taxotree::config::AnalyticsSettings;
use taxotree::domain::{ParentRef, TaxonomyRecord};
use taxotree::infrastructure::traits::{
    AnalyticsError, AnalyticsEvent, AnalyticsSink, ProviderError, TaxonomyProvider,
};

/// Start or end of one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    Start(String),
    End(String),
}

/// Provider answering from a fixed tree, recording every call.
///
/// Each call yields to the scheduler once, so overlapping calls would show
/// up in the recorded event log.
#[derive(Default)]
pub struct MockProvider {
    children: HashMap<ParentRef, Vec<TaxonomyRecord>>,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<(String, usize)>>,
    events: Mutex<Vec<CallEvent>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    /// Build from `(id, text, parent)` triples, parents listed before children.
    /// Paths and child counts are derived; order within a parent is kept.
    pub fn from_tree(entries: &[(&str, &str, Option<&str>)]) -> Self {
        let mut paths: HashMap<&str, String> = HashMap::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (_, _, parent) in entries {
            if let Some(parent) = parent {
                *counts.entry(*parent).or_default() += 1;
            }
        }

        let mut provider = Self::default();
        for (id, text, parent) in entries {
            let path = match parent {
                Some(parent) => format!("{}|{}", paths[parent], id),
                None => format!("|{}", id),
            };
            paths.insert(*id, path.clone());
            let record = TaxonomyRecord::new(*id, *text, path)
                .with_child_count(counts.get(id).copied().unwrap_or(0));
            let key = match parent {
                Some(parent) => ParentRef::id(*parent),
                None => ParentRef::Root,
            };
            provider.children.entry(key).or_default().push(record);
        }
        provider
    }

    /// Make queries for `parent` ("null" for the top level) fail.
    pub fn fail_on(&self, parent: &str) {
        self.failing.lock().unwrap().insert(parent.to_string());
    }

    pub fn recover(&self, parent: &str) {
        self.failing.lock().unwrap().remove(parent);
    }

    /// Hold queries for `parent` until the returned handle is notified.
    pub fn gate(&self, parent: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(parent.to_string(), notify.clone());
        notify
    }

    /// Parents queried so far, in call order ("null" for the top level).
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(parent, _)| parent.clone())
            .collect()
    }

    pub fn page_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(_, size)| *size).collect()
    }

    pub fn call_count(&self, parent: &str) -> usize {
        self.calls().iter().filter(|p| p.as_str() == parent).count()
    }

    pub fn was_called(&self, parent: &str) -> bool {
        self.call_count(parent) > 0
    }

    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaxonomyProvider for MockProvider {
    async fn query_children(
        &self,
        parent: &ParentRef,
        page_size: usize,
    ) -> Result<Vec<TaxonomyRecord>, ProviderError> {
        let name = parent.to_string();
        self.calls.lock().unwrap().push((name.clone(), page_size));
        self.events.lock().unwrap().push(CallEvent::Start(name.clone()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(&name).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(CallEvent::End(name.clone()));

        if self.failing.lock().unwrap().contains(&name) {
            return Err(ProviderError::Unavailable(format!("{} is down", name)));
        }
        Ok(self
            .children
            .get(parent)
            .map(|records| records.iter().take(page_size).cloned().collect())
            .unwrap_or_default())
    }
}

/// Analytics sink that always fails.
pub struct FailingAnalytics;

impl AnalyticsSink for FailingAnalytics {
    fn track_event(&self, _event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        Err(AnalyticsError("collector offline".into()))
    }
}

pub fn engine(provider: &Arc<MockProvider>, policy: ExpansionPolicy) -> ExpansionEngine {
    ExpansionEngine::new(TaxonomyCatalog::new(provider.clone(), 150), policy)
}

pub fn facet(provider: &Arc<MockProvider>, analytics: Arc<dyn AnalyticsSink>) -> FacetTree {
    FacetTree::new(
        engine(provider, ExpansionPolicy::default()),
        analytics,
        AnalyticsSettings::default(),
    )
}

/// Root has A, C, D; A has B; B has E.
pub fn abcd_tree() -> MockProvider {
    MockProvider::from_tree(&[
        ("A", "Alpha", None),
        ("C", "Gamma", None),
        ("D", "Delta", None),
        ("B", "Beta", Some("A")),
        ("E", "Epsilon", Some("B")),
    ])
}
