use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{NodeState, TaxonomyRecord};

/// Stable handle of a node in a [`TreeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(Index);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (index, generation) = self.0.into_raw_parts();
        write!(f, "#{index}.{generation}")
    }
}

/// Tree node in the arena-based taxonomy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Provider record for this node
    pub data: TaxonomyRecord,
    /// Parent node, None for top-level nodes
    pub parent: Option<NodeKey>,
    /// Children in provider (sorted) order, empty until fetched
    pub children: Vec<NodeKey>,
    pub state: NodeState,
}

/// Arena-based tree of fetched taxonomy nodes.
///
/// Nodes are only ever inserted; the tree grows as fetches resolve and is
/// discarded as a whole. Lookups by key are O(1), lookups by taxonomy id go
/// through a secondary index.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    /// Top-level nodes, in sorted order
    roots: Vec<NodeKey>,
    by_id: HashMap<String, NodeKey>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: TaxonomyRecord, parent: Option<NodeKey>) -> NodeKey {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
            state: NodeState::Unloaded,
        };
        let key = NodeKey(self.arena.insert(node));

        match parent {
            Some(parent_key) => {
                if let Some(parent) = self.get_node_mut(parent_key) {
                    parent.children.push(key);
                }
            }
            None => self.roots.push(key),
        }
        // first occurrence wins when a provider repeats an id
        self.by_id.entry(id).or_insert(key);

        key
    }

    /// Insert a page of top-level records.
    pub fn attach_roots(&mut self, records: Vec<TaxonomyRecord>) -> Vec<NodeKey> {
        records
            .into_iter()
            .map(|record| self.insert_node(record, None))
            .collect()
    }

    /// Insert a page of children under `parent`.
    pub fn attach_children(&mut self, parent: NodeKey, records: Vec<TaxonomyRecord>) -> Vec<NodeKey> {
        records
            .into_iter()
            .map(|record| self.insert_node(record, Some(parent)))
            .collect()
    }

    pub fn get_node(&self, key: NodeKey) -> Option<&TreeNode> {
        self.arena.get(key.0)
    }

    pub fn get_node_mut(&mut self, key: NodeKey) -> Option<&mut TreeNode> {
        self.arena.get_mut(key.0)
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Look up a node by taxonomy id.
    pub fn find(&self, id: &str) -> Option<NodeKey> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Distance from the top level, top-level nodes have depth 0.
    pub fn depth_of(&self, key: NodeKey) -> usize {
        let mut depth = 0;
        let mut current = self.get_node(key).and_then(|node| node.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.get_node(parent).and_then(|node| node.parent);
        }
        depth
    }

    /// Pre-order walk over every fetched node.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, false)
    }

    /// Pre-order walk that only descends into expanded nodes.
    pub fn visible(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, true)
    }
}

/// Depth-first, left-to-right iterator yielding `(key, depth, node)`.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(NodeKey, usize)>,
    visible_only: bool,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, visible_only: bool) -> Self {
        let stack = arena.roots().iter().rev().map(|&key| (key, 0)).collect();
        Self {
            arena,
            stack,
            visible_only,
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeKey, usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, depth)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current) {
                if !self.visible_only || node.state.is_expanded() {
                    // Push children in reverse order for left-to-right traversal
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, depth + 1));
                    }
                }
                return Some((current, depth, node));
            }
        }
        None
    }
}
