//! Expansion engine: lazy, sequential expansion of the taxonomy tree.
//!
//! Every node starts `Unloaded`. Opening an unloaded node fetches its
//! children once; later toggles only flip between `Expanded` and `Collapsed`.
//! The bootstrap walk opens exactly the ancestors needed to reveal the
//! active filters, one fetch at a time. Without any match it falls back to
//! a shallow default expansion of small taxonomies.
//!
//! Tree state sits behind a mutex that is never held across an `.await`, so
//! user toggles can interleave with a running bootstrap. A node in the
//! `Loading` state has a fetch in flight; nobody starts a second one, and
//! the bootstrap walk waits for it to settle instead.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use termtree::Tree;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::application::services::catalog::TaxonomyCatalog;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    DomainError, ExpansionQueue, NodeKey, NodeState, ParentRef, PathPrefixSet, PrefixMemo,
    TreeArena, TreeNode, TreeRender,
};

/// Knobs of the default (no filter) expansion and of the matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionPolicy {
    /// Open all top-level nodes when there are at most this many
    pub default_expand_limit: usize,
    /// Cascade into children of an auto-opened node with at most this many children
    pub cascade_child_limit: usize,
    /// Also open the node a filter names, not only its ancestors
    pub expand_selected: bool,
}

impl Default for ExpansionPolicy {
    fn default() -> Self {
        Self {
            default_expand_limit: 3,
            cascade_child_limit: 3,
            expand_selected: false,
        }
    }
}

impl From<&Settings> for ExpansionPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            default_expand_limit: settings.default_expand_limit,
            cascade_child_limit: settings.cascade_child_limit,
            expand_selected: settings.expand_selected,
        }
    }
}

/// Result of a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Node is now expanded; `fetched` tells whether children were loaded
    Expanded { fetched: bool },
    Collapsed,
    /// A fetch for this node is already running, nothing changed
    InFlight,
}

/// Summary of a bootstrap run.
///
/// A provider failure stops the walk; everything opened before it stays
/// open and the error is kept in `failure`.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// Number of top-level nodes fetched
    pub top_level: usize,
    /// Nodes opened by the walk, in order
    pub expanded: Vec<NodeKey>,
    /// Successful provider calls, including the top-level one
    pub fetches: usize,
    /// Whether the default (no match) policy ran
    pub used_default: bool,
    pub failure: Option<ApplicationError>,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Turn a recorded failure into an `Err` for callers that want `?`.
    pub fn into_result(mut self) -> ApplicationResult<Self> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }

    fn record(&mut self, key: NodeKey, fetched: bool) {
        if fetched {
            self.fetches += 1;
        }
        self.expanded.push(key);
    }

    fn halt(&mut self, key: NodeKey, error: ApplicationError) {
        warn!(node = %key, "expansion halted: {}", error);
        self.failure = Some(error);
    }
}

/// Read-only snapshot of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub key: NodeKey,
    pub id: String,
    pub text: String,
    pub path: String,
    pub share_title: Option<String>,
    pub child_count: usize,
    pub state: NodeState,
    /// Top-level nodes have depth 0
    pub depth: usize,
    pub children: Vec<NodeKey>,
}

impl NodeView {
    fn new(key: NodeKey, depth: usize, node: &TreeNode) -> Self {
        Self {
            key,
            id: node.data.id.clone(),
            text: node.data.text.clone(),
            path: node.data.path.clone(),
            share_title: node.data.share_title.clone(),
            child_count: node.data.child_count,
            state: node.state,
            depth,
            children: node.children.clone(),
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.state.is_expanded()
    }
}

struct EngineState {
    tree: TreeArena,
    memo: PrefixMemo,
    bootstrapped: bool,
    /// One sender per `Loading` node, dropped when its fetch settles
    in_flight: HashMap<NodeKey, watch::Sender<()>>,
}

impl EngineState {
    /// Mark `key` as `Loading` and return the id to fetch.
    fn start_fetch(&mut self, key: NodeKey) -> Option<String> {
        let node = self.tree.get_node_mut(key)?;
        node.state = NodeState::Loading;
        let id = node.data.id.clone();
        self.in_flight.insert(key, watch::channel(()).0);
        Some(id)
    }

    fn finish_fetch(&mut self, key: NodeKey, state: NodeState) {
        if let Some(node) = self.tree.get_node_mut(key) {
            node.state = state;
        }
        self.in_flight.remove(&key);
    }
}

struct Opened {
    children: Vec<NodeKey>,
    fetched: bool,
}

/// Resets a node to `Unloaded` if its fetch future is dropped before settling.
struct PendingFetch<'a> {
    engine: &'a ExpansionEngine,
    key: NodeKey,
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        let mut state = self.engine.state();
        if state.in_flight.contains_key(&self.key) {
            state.finish_fetch(self.key, NodeState::Unloaded);
        }
    }
}

enum Claim {
    Ready(Vec<NodeKey>),
    Fetch(String),
    /// Someone else's fetch for the node is in flight
    Wait(watch::Receiver<()>),
}

/// Drives lazy expansion of a taxonomy tree against a provider.
pub struct ExpansionEngine {
    catalog: TaxonomyCatalog,
    policy: ExpansionPolicy,
    state: Mutex<EngineState>,
}

impl ExpansionEngine {
    pub fn new(catalog: TaxonomyCatalog, policy: ExpansionPolicy) -> Self {
        Self {
            catalog,
            policy,
            state: Mutex::new(EngineState {
                tree: TreeArena::new(),
                memo: PrefixMemo::default(),
                bootstrapped: false,
                in_flight: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the active filter paths. Returns whether the prefix set changed.
    ///
    /// Only a later bootstrap walks the new filters; an already bootstrapped
    /// tree is left as it is.
    pub fn set_active_filters<S: AsRef<str>>(&self, filters: &[S]) -> bool {
        self.state().memo.update(filters)
    }

    pub fn active_filters(&self) -> Vec<String> {
        self.state().memo.filters().to_vec()
    }

    pub fn prefixes(&self) -> PathPrefixSet {
        self.state().memo.prefixes().clone()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.state().bootstrapped
    }

    /// One-time initial expansion.
    ///
    /// Never returns an error directly: failures land in the report. If the
    /// top-level fetch itself fails the engine may be bootstrapped again.
    #[instrument(level = "debug", skip(self))]
    pub async fn bootstrap(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        {
            let mut state = self.state();
            if state.bootstrapped {
                warn!("bootstrap requested twice, ignoring");
                report.failure = Some(DomainError::AlreadyBootstrapped.into());
                return report;
            }
            state.bootstrapped = true;
        }

        let records = match self.catalog.fetch_children(&ParentRef::Root).await {
            Ok(records) => records,
            Err(e) => {
                warn!("top-level fetch failed: {}", e);
                self.state().bootstrapped = false;
                report.failure = Some(e);
                return report;
            }
        };
        report.fetches += 1;

        let (roots, prefixes) = {
            let mut state = self.state();
            let roots = state.tree.attach_roots(records);
            (roots, state.memo.prefixes().clone())
        };
        report.top_level = roots.len();

        let mut queue = ExpansionQueue::new();
        queue.extend(self.select(&prefixes, &roots));
        debug!(
            "{} of {} top-level nodes lead to active filters",
            queue.len(),
            roots.len()
        );

        if queue.is_empty() {
            self.expand_default(&roots, &mut report).await;
        } else {
            self.expand_matching(queue, &prefixes, &mut report).await;
        }

        info!(
            expanded = report.expanded.len(),
            fetches = report.fetches,
            complete = report.is_complete(),
            "bootstrap finished"
        );
        report
    }

    /// Pop, open, enqueue matching children; until the queue runs dry.
    async fn expand_matching(
        &self,
        mut queue: ExpansionQueue,
        prefixes: &PathPrefixSet,
        report: &mut BootstrapReport,
    ) {
        while let Some(key) = queue.pop() {
            match self.force_open(key).await {
                Ok(Opened { children, fetched }) => {
                    report.record(key, fetched);
                    queue.extend(self.select(prefixes, &children));
                }
                Err(e) => {
                    report.halt(key, e);
                    return;
                }
            }
        }
    }

    /// Small taxonomies: open every top-level node, and the children of
    /// those with few children. Exactly one cascade level.
    async fn expand_default(&self, roots: &[NodeKey], report: &mut BootstrapReport) {
        if roots.len() > self.policy.default_expand_limit {
            debug!("{} top-level nodes, no default expansion", roots.len());
            return;
        }
        report.used_default = true;

        for &root in roots {
            let children = match self.force_open(root).await {
                Ok(Opened { children, fetched }) => {
                    report.record(root, fetched);
                    children
                }
                Err(e) => {
                    report.halt(root, e);
                    return;
                }
            };

            let child_count = self
                .state()
                .tree
                .get_node(root)
                .map_or(usize::MAX, |node| node.data.child_count);
            if child_count > self.policy.cascade_child_limit {
                continue;
            }

            for child in children {
                match self.force_open(child).await {
                    Ok(Opened { fetched, .. }) => report.record(child, fetched),
                    Err(e) => {
                        report.halt(child, e);
                        return;
                    }
                }
            }
        }
    }

    /// Nodes among `keys` that must be opened to reveal an active filter.
    fn select(&self, prefixes: &PathPrefixSet, keys: &[NodeKey]) -> Vec<NodeKey> {
        let state = self.state();
        keys.iter()
            .copied()
            .filter(|&key| {
                state
                    .tree
                    .get_node(key)
                    .is_some_and(|node| self.matches(prefixes, &node.data.path))
            })
            .collect()
    }

    fn matches(&self, prefixes: &PathPrefixSet, path: &str) -> bool {
        prefixes.reveals(path) || (self.policy.expand_selected && prefixes.contains(path))
    }

    /// Flip a node between expanded and collapsed, fetching on first open.
    ///
    /// On fetch failure the node goes back to `Unloaded` and the error is
    /// returned.
    #[instrument(level = "debug", skip(self), fields(node = %key))]
    pub async fn toggle(&self, key: NodeKey) -> ApplicationResult<ToggleOutcome> {
        let id = {
            let mut state = self.state();
            let node = state
                .tree
                .get_node_mut(key)
                .ok_or_else(|| DomainError::UnknownNode(key.to_string()))?;
            match node.state {
                NodeState::Expanded => {
                    node.state = NodeState::Collapsed;
                    return Ok(ToggleOutcome::Collapsed);
                }
                NodeState::Collapsed => {
                    node.state = NodeState::Expanded;
                    return Ok(ToggleOutcome::Expanded { fetched: false });
                }
                NodeState::Loading => {
                    debug!("fetch in flight, toggle ignored");
                    return Ok(ToggleOutcome::InFlight);
                }
                NodeState::Unloaded => {}
            }
            state
                .start_fetch(key)
                .ok_or_else(|| DomainError::UnknownNode(key.to_string()))?
        };

        self.load_children(key, id).await?;
        Ok(ToggleOutcome::Expanded { fetched: true })
    }

    /// Toggle the node with taxonomy id `id`.
    pub async fn toggle_id(&self, id: &str) -> ApplicationResult<ToggleOutcome> {
        let key = self
            .find(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))?;
        self.toggle(key).await
    }

    /// Open a node regardless of its current state.
    ///
    /// If another caller's fetch for the node is in flight, wait for it to
    /// settle and look again; a failed foreign fetch is retried here.
    async fn force_open(&self, key: NodeKey) -> ApplicationResult<Opened> {
        loop {
            match self.claim(key)? {
                Claim::Ready(children) => {
                    return Ok(Opened {
                        children,
                        fetched: false,
                    })
                }
                Claim::Fetch(id) => {
                    let children = self.load_children(key, id).await?;
                    return Ok(Opened {
                        children,
                        fetched: true,
                    });
                }
                Claim::Wait(mut settled) => {
                    debug!(node = %key, "waiting for fetch in flight");
                    // Errors once the sender is dropped, which is the signal
                    let _ = settled.changed().await;
                }
            }
        }
    }

    fn claim(&self, key: NodeKey) -> ApplicationResult<Claim> {
        let mut state = self.state();
        let node = state
            .tree
            .get_node_mut(key)
            .ok_or_else(|| DomainError::UnknownNode(key.to_string()))?;
        let claim = match node.state {
            NodeState::Expanded => Claim::Ready(node.children.clone()),
            NodeState::Collapsed => {
                node.state = NodeState::Expanded;
                Claim::Ready(node.children.clone())
            }
            NodeState::Loading => match state.in_flight.get(&key) {
                Some(sender) => Claim::Wait(sender.subscribe()),
                None => Claim::Ready(Vec::new()),
            },
            NodeState::Unloaded => Claim::Fetch(
                state
                    .start_fetch(key)
                    .ok_or_else(|| DomainError::UnknownNode(key.to_string()))?,
            ),
        };
        Ok(claim)
    }

    /// Fetch and attach children of a node already marked `Loading`.
    async fn load_children(&self, key: NodeKey, id: String) -> ApplicationResult<Vec<NodeKey>> {
        let _pending = PendingFetch { engine: self, key };
        let fetched = self.catalog.fetch_children(&ParentRef::Id(id)).await;

        let mut state = self.state();
        match fetched {
            Ok(records) => {
                let children = state.tree.attach_children(key, records);
                state.finish_fetch(key, NodeState::Expanded);
                Ok(children)
            }
            Err(e) => {
                state.finish_fetch(key, NodeState::Unloaded);
                Err(e)
            }
        }
    }

    pub fn roots(&self) -> Vec<NodeKey> {
        self.state().tree.roots().to_vec()
    }

    pub fn find(&self, id: &str) -> Option<NodeKey> {
        self.state().tree.find(id)
    }

    pub fn node(&self, key: NodeKey) -> Option<NodeView> {
        let state = self.state();
        let depth = state.tree.depth_of(key);
        state
            .tree
            .get_node(key)
            .map(|node| NodeView::new(key, depth, node))
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeView> {
        self.find(id).and_then(|key| self.node(key))
    }

    pub fn children(&self, key: NodeKey) -> Vec<NodeView> {
        self.node(key)
            .map(|parent| {
                parent
                    .children
                    .iter()
                    .filter_map(|&child| self.node(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes a user would currently see, depth-first.
    pub fn visible(&self) -> Vec<NodeView> {
        let state = self.state();
        state
            .tree
            .visible()
            .map(|(key, depth, node)| NodeView::new(key, depth, node))
            .collect()
    }

    /// Number of fetched nodes.
    pub fn len(&self) -> usize {
        self.state().tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().tree.is_empty()
    }

    pub fn render(&self) -> Tree<String> {
        self.state().tree.to_tree_string()
    }
}
