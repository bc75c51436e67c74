//! Terminal rendering of the navigation tree.

use termtree::Tree;

use crate::domain::{NavTree, NodeId};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for NavTree {
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(tree: &NavTree, node_idx: NodeId, parent_tree: &mut Tree<String>) {
            for child_idx in tree.direct_children(node_idx) {
                if let Some(child) = tree.get_node(child_idx) {
                    let mut child_tree = Tree::new(child.to_string());
                    build_tree(tree, child_idx, &mut child_tree);
                    parent_tree.push(child_tree);
                }
            }
        }

        let root_label = self
            .get_node(self.root())
            .map(|n| n.to_string())
            .unwrap_or_else(|| "Empty tree".to_string());
        let mut tree = Tree::new(root_label);
        build_tree(self, self.root(), &mut tree);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_tree_when_rendering_then_lists_every_node() {
        let mut nav = NavTree::new();
        nav.resolve("People/Aria").unwrap();
        nav.resolve("Places/Ostra").unwrap();

        let rendered = nav.to_tree_string().to_string();
        for name in ["Root", "People", "Aria", "Places", "Ostra"] {
            assert!(rendered.contains(name), "missing {name} in\n{rendered}");
        }
    }
}
