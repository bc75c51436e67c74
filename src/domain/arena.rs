//! Arena-based navigation tree.
//!
//! Nodes live in a generational arena and reference each other by [`NodeId`].
//! Children are kept in an insertion-ordered name map so that sibling names
//! stay unique and pre-order traversal is reproducible for a given input order.

use std::fmt;

use generational_arena::{Arena, Index};
use indexmap::IndexMap;
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node inside a [`NavTree`].
pub type NodeId = Index;

/// Name given to the root node.
pub const ROOT_NAME: &str = "Root";

/// Tree node in the navigation hierarchy.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    /// Path segment naming this node under its parent
    pub name: String,
    /// Display title, set for nodes created by a document
    pub title: Option<String>,
    /// Output file name of the page behind this node
    pub file: Option<String>,
    /// Page is not listed as a link target in navigation
    pub no_link: bool,
    /// Page is never the target of automatic links
    pub no_auto_link: bool,
    /// Alternative keywords that also link to this page
    pub alt_links: Vec<String>,
    /// Parent node, None for the root
    pub parent: Option<NodeId>,
    /// Children by name, in insertion order
    pub children: IndexMap<String, NodeId>,
}

impl TreeNode {
    fn named(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            ..Self::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{} ({})", self.name, file),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Navigation tree rooted at a single [`ROOT_NAME`] node.
#[derive(Debug)]
pub struct NavTree {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for NavTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NavTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode::named(ROOT_NAME, None));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get_node(&self, idx: NodeId) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Looks up an existing node without creating anything.
    pub fn find(&self, path: &str) -> DomainResult<Option<NodeId>> {
        let mut current = self.root;
        for segment in split_path(path)? {
            match self.child(current, segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Resolves `path` to a node, creating missing ancestors on the way.
    ///
    /// Paths are `/`-separated and relative to the root. Resolving the same
    /// path twice yields the same node.
    #[instrument(level = "trace", skip(self))]
    pub fn resolve(&mut self, path: &str) -> DomainResult<NodeId> {
        if let Some(existing) = self.find(path)? {
            return Ok(existing);
        }

        let (parent, name) = match path.rsplit_once('/') {
            Some((prefix, name)) => (self.resolve(prefix)?, name),
            None => (self.root, path),
        };
        Ok(self.attach(parent, name))
    }

    fn attach(&mut self, parent: NodeId, name: &str) -> NodeId {
        let idx = self.arena.insert(TreeNode::named(name, Some(parent)));
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.insert(name.to_string(), idx);
        }
        trace!("attached node '{}'", name);
        idx
    }

    fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get_node(parent)
            .and_then(|node| node.children.get(name).copied())
    }

    /// Slash-joined path of names from below the root down to `idx`.
    pub fn path_of(&self, idx: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(idx);
        while let Some(id) = current {
            match self.get_node(id) {
                Some(node) if node.parent.is_some() => {
                    names.push(node.name.as_str());
                    current = node.parent;
                }
                _ => break,
            }
        }
        names.reverse();
        names.join("/")
    }

    /// Pre-order iterator starting at the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Direct children of `idx`: childless nodes first, then nodes with
    /// children, each group sorted by name.
    pub fn direct_children(&self, idx: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get_node(idx) else {
            return Vec::new();
        };
        let (mut childless, mut childed): (Vec<_>, Vec<_>) = node
            .children
            .values()
            .filter_map(|&child| self.get_node(child).map(|n| (child, n)))
            .partition(|(_, n)| n.is_leaf());
        childless.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        childed.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        childless
            .into_iter()
            .chain(childed)
            .map(|(child, _)| child)
            .collect()
    }
}

fn split_path(path: &str) -> DomainResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(DomainError::Resolution {
            path: path.to_string(),
            reason: "empty path segment".to_string(),
        });
    }
    Ok(segments)
}

pub struct TreeIterator<'a> {
    tree: &'a NavTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a NavTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.values().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
