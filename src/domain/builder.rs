//! Assembles documents into the navigation tree, link index and timeline.

use tracing::{debug, instrument, warn};

use crate::domain::arena::{NavTree, NodeId, TreeNode};
use crate::domain::entities::Document;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::links::LinkIndex;
use crate::domain::timeline::{Timeline, TimelineAggregator};

/// Title and file of the generated timeline page.
pub const TIMELINE_TITLE: &str = "Timeline";
pub const TIMELINE_FILE: &str = "Timeline.md";

/// Everything derived from the full document set.
#[derive(Debug)]
pub struct Wiki {
    pub tree: NavTree,
    pub links: LinkIndex,
    pub timeline: Timeline,
}

/// Builds a [`Wiki`] from documents fed in processing order.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: NavTree,
    timeline: TimelineAggregator,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a document in the tree and record its history.
    ///
    /// The document's own `History.Timeline` is replaced by its locally
    /// sorted events.
    #[instrument(level = "debug", skip(self, doc), fields(source = %doc.source.display()))]
    pub fn add_document(&mut self, doc: &mut Document) -> DomainResult<NodeId> {
        let control = doc.record.control();
        let idx = self.tree.resolve(&doc.record.tree_path())?;
        let file = doc.output_file();
        let node = self.node_mut(idx)?;
        if let Some(previous) = &node.title {
            warn!("node '{}' already holds page '{}', overwriting", node.name, previous);
        }
        node.title = Some(doc.record.title.clone());
        node.file = Some(file);
        node.no_link = control.no_link;
        node.no_auto_link = control.no_autolink;
        node.alt_links = doc.record.alt_links.clone();

        if let Some(raw) = doc.record.timeline_events().cloned() {
            let events = self.timeline.push_document(&doc.record.title, &raw)?;
            doc.record
                .set_timeline_events(events.iter().map(|e| e.to_value()).collect());
        }
        debug!("placed '{}' at {}", doc.record.title, self.tree.path_of(idx));
        Ok(idx)
    }

    /// Add a generated page that has no source document.
    pub fn add_page(&mut self, path: &str, title: &str, file: &str) -> DomainResult<NodeId> {
        let idx = self.tree.resolve(path)?;
        let node = self.node_mut(idx)?;
        node.title = Some(title.to_string());
        node.file = Some(file.to_string());
        node.no_link = false;
        node.no_auto_link = false;
        Ok(idx)
    }

    /// Give every top-level category (a root child with children) a page
    /// named after it.
    fn assign_category_files(&mut self) {
        let categories: Vec<NodeId> = self
            .tree
            .get_node(self.tree.root())
            .map(|root| root.children.values().copied().collect())
            .unwrap_or_default();
        for idx in categories {
            if let Some(node) = self.tree.get_node_mut(idx) {
                if !node.is_leaf() {
                    node.file = Some(format!("{}.md", node.name));
                }
            }
        }
    }

    fn node_mut(&mut self, idx: NodeId) -> DomainResult<&mut TreeNode> {
        self.tree
            .get_node_mut(idx)
            .ok_or_else(|| DomainError::Resolution {
                path: format!("{idx:?}"),
                reason: "node vanished from arena".to_string(),
            })
    }

    /// Finish the tree and derive the link index and global timeline.
    pub fn finish(mut self) -> Wiki {
        self.assign_category_files();
        let links = LinkIndex::from_tree(&self.tree);
        Wiki {
            tree: self.tree,
            links,
            timeline: self.timeline.finish(),
        }
    }
}

/// Build the complete [`Wiki`] for `documents`, adding the timeline page at
/// `timeline_node`.
pub fn build_wiki(documents: &mut [Document], timeline_node: &str) -> DomainResult<Wiki> {
    let mut builder = TreeBuilder::new();
    for doc in documents.iter_mut() {
        builder.add_document(doc)?;
    }
    builder.add_page(timeline_node, TIMELINE_TITLE, TIMELINE_FILE)?;
    Ok(builder.finish())
}
