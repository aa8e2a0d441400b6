//! FIFO queue of nodes awaiting forced expansion.

use std::collections::{HashSet, VecDeque};

use crate::domain::arena::NodeKey;

/// Nodes waiting to be expanded, processed strictly one at a time.
///
/// A node is enqueued at most once per queue (dedup by identity), so a walk
/// over a finite tree always terminates.
#[derive(Debug, Default)]
pub struct ExpansionQueue {
    pending: VecDeque<NodeKey>,
    seen: HashSet<NodeKey>,
}

impl ExpansionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key` unless it was queued before. Returns whether it was added.
    pub fn push(&mut self, key: NodeKey) -> bool {
        if self.seen.insert(key) {
            self.pending.push_back(key);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Option<NodeKey> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Extend<NodeKey> for ExpansionQueue {
    fn extend<I: IntoIterator<Item = NodeKey>>(&mut self, iter: I) {
        for key in iter {
            self.push(key);
        }
    }
}
