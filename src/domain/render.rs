/*
Rendering of the visible part of a taxonomy tree as a `termtree::Tree`.
Only expanded nodes show their children; collapsed nodes show a marker
and their reported child count.
 */
use termtree::Tree;

use crate::domain::arena::{NodeKey, TreeArena, TreeNode};
use crate::domain::entities::NodeState;

pub trait TreeRender {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &TreeNode) -> String {
    let marker = match node.state {
        NodeState::Expanded => "-",
        NodeState::Loading => "~",
        NodeState::Unloaded | NodeState::Collapsed if node.data.child_count == 0 => " ",
        NodeState::Unloaded | NodeState::Collapsed => "+",
    };
    format!(
        "{} {} [{}] ({})",
        marker, node.data.text, node.data.child_count, node.data.path
    )
}

impl TreeRender for TreeArena {
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(arena: &TreeArena, key: NodeKey) -> Option<Tree<String>> {
            let node = arena.get_node(key)?;
            let mut tree = Tree::new(label(node));
            if node.state.is_expanded() {
                for &child in &node.children {
                    if let Some(child_tree) = build_tree(arena, child) {
                        tree.push(child_tree);
                    }
                }
            }
            Some(tree)
        }

        let leaves: Vec<Tree<String>> = self
            .roots()
            .iter()
            .filter_map(|&root| build_tree(self, root))
            .collect();
        Tree::new("taxonomy".to_string()).with_leaves(leaves)
    }
}
