//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel used by the provider query for top-level entries.
pub const ROOT_SENTINEL: &str = "null";

/// One taxonomy entry as delivered by a provider page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    pub id: String,
    /// Display text, also the sort key
    pub text: String,
    /// Number of immediate children reported by the provider
    #[serde(default)]
    pub child_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_title: Option<String>,
    /// `|`-delimited ancestor chain ending in this node's own id
    pub path: String,
}

impl TaxonomyRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            child_count: 0,
            share_title: None,
            path: path.into(),
        }
    }

    pub fn with_child_count(mut self, child_count: usize) -> Self {
        self.child_count = child_count;
        self
    }
}

/// Parent selector for a children query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// Top-level taxonomy entries
    Root,
    Id(String),
}

impl ParentRef {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_SENTINEL),
            Self::Id(id) => f.write_str(id),
        }
    }
}

/// Expansion state of a node.
///
/// `Loading` doubles as the per-node in-flight guard: while it is set no
/// second fetch for the node is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Collapsed, children never fetched
    #[default]
    Unloaded,
    /// Children fetch in flight
    Loading,
    /// Children loaded but hidden
    Collapsed,
    Expanded,
}

impl NodeState {
    pub fn is_expanded(self) -> bool {
        self == Self::Expanded
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Collapsed => "collapsed",
            Self::Expanded => "expanded",
        };
        f.write_str(s)
    }
}
