//! Site generation service
//!
//! Loads the document library, assembles the wiki, rewrites page content
//! and writes the generated site files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::timeline::SOURCE_KEY;
use crate::domain::{
    build_wiki, AutoLinker, Document, NavTree, NodeId, RelativeLinker, UnresolvedLink, Wiki,
    DATE_KEY,
};
use crate::infrastructure::traits::FileSystem;

const DOCUMENT_EXTENSION: &str = "yml";
/// Editor lock files (`.#name.yml`) are never documents.
const LOCK_MARKER: &str = ".#";

const PAGES_DIR: &str = "pages";
const NAV_FILE: &str = "nav.yml";
const TIMELINE_OUTPUT: &str = "Timeline.yml";
const LINK_INDEX_FILE: &str = "link_index.yml";

/// Mapping keys whose values are never rewritten.
const VERBATIM_KEYS: &[&str] = &["node", "title", "control", "altLinks", DATE_KEY, SOURCE_KEY];

/// Documents of a library together with the wiki built from them.
#[derive(Debug)]
pub struct Site {
    /// Documents in processing order, timelines already sorted
    pub documents: Vec<Document>,
    pub wiki: Wiki,
}

/// Render context of one output page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Output name without extension
    pub stem: String,
    pub title: String,
    pub context: Mapping,
}

/// Summary of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub documents: usize,
    pub pages: usize,
    pub links: usize,
    pub events: usize,
    pub warnings: Vec<UnresolvedLink>,
}

/// Service turning a document library into a generated site.
pub struct SiteService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl SiteService {
    /// Create a new site service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Load every document below `lib_dir`, ordered by path.
    #[instrument(level = "debug", skip(self))]
    pub fn load_documents(&self, lib_dir: &Path) -> ApplicationResult<Vec<Document>> {
        if !self.fs.is_dir(lib_dir) {
            return Err(ApplicationError::LibraryNotFound(lib_dir.to_path_buf()));
        }
        let mut paths: Vec<PathBuf> = self
            .fs
            .list_files(lib_dir)
            .with_path_context("list library", lib_dir)?
            .into_iter()
            .filter(|p| is_document(p))
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let content = self
                .fs
                .read_to_string(&path)
                .with_path_context("read document", &path)?;
            let doc = Document::parse(&content, &path)?;
            debug!("loaded '{}' from {}", doc.title(), path.display());
            documents.push(doc);
        }
        Ok(documents)
    }

    /// Load the configured library and build tree, link index and timeline.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&self) -> ApplicationResult<Site> {
        let mut documents = self.load_documents(&self.settings.lib_dir)?;
        let wiki = build_wiki(&mut documents, &self.settings.timeline_node)?;
        info!(
            "built wiki: {} documents, {} nodes, {} links, {} events",
            documents.len(),
            wiki.tree.len(),
            wiki.links.len(),
            wiki.timeline.len()
        );
        Ok(Site { documents, wiki })
    }

    /// Rewrite every document and produce the category pages.
    ///
    /// Keywords are linked once per string field of a page, so a keyword
    /// met in several fields is linked in each of them. Unresolved diagram
    /// links are returned and logged once per distinct label per document.
    pub fn render_pages(&self, site: &Site) -> (Vec<Page>, Vec<UnresolvedLink>) {
        let auto = AutoLinker::new(&site.wiki.links);
        let relative = RelativeLinker::new(&site.wiki.links);
        let mut pages = Vec::with_capacity(site.documents.len());
        let mut warnings = Vec::new();

        for doc in &site.documents {
            let mut rewriter = Rewriter {
                auto: &auto,
                relative: &relative,
                title: doc.title(),
                source: doc.source_name(),
                no_autolink: doc.record.control().no_autolink,
                unresolved: Vec::new(),
            };
            pages.push(render_document(doc, &mut rewriter));
            warnings.extend(rewriter.unresolved);
        }
        for link in &warnings {
            warn!("{}", link);
        }
        pages.extend(category_pages(&site.wiki.tree));
        (pages, warnings)
    }

    /// Replace `out_dir` with the generated site.
    #[instrument(level = "debug", skip(self, site, pages))]
    pub fn write(&self, site: &Site, pages: &[Page], out_dir: &Path) -> ApplicationResult<()> {
        self.check_output_dir(out_dir)?;
        if self.fs.exists(out_dir) {
            self.fs
                .remove_dir_all(out_dir)
                .with_path_context("remove output directory", out_dir)?;
        }
        self.fs
            .create_dir_all(&out_dir.join(PAGES_DIR))
            .with_path_context("create output directory", out_dir)?;

        let wiki = &site.wiki;
        self.write_file(
            &out_dir.join(&self.settings.links_file),
            &wiki.links.reference_definitions(),
        )?;
        self.write_yaml(&out_dir.join(NAV_FILE), &nav_value(&wiki.tree))?;
        self.write_yaml(&out_dir.join(TIMELINE_OUTPUT), &wiki.timeline.to_value())?;
        self.write_yaml(&out_dir.join(LINK_INDEX_FILE), wiki.links.entries())?;
        for page in pages {
            let path = out_dir
                .join(PAGES_DIR)
                .join(format!("{}.{}", page.stem, DOCUMENT_EXTENSION));
            self.write_yaml(&path, &page.context)?;
        }
        debug!("wrote {} pages to {}", pages.len(), out_dir.display());
        Ok(())
    }

    /// Refuse an existing output directory that contains the library or the
    /// working directory. Paths are compared after canonicalization.
    fn check_output_dir(&self, out_dir: &Path) -> ApplicationResult<()> {
        if !self.fs.exists(out_dir) {
            return Ok(());
        }
        let out = self
            .fs
            .canonicalize(out_dir)
            .with_path_context("resolve output directory", out_dir)?;
        let lib_dir = &self.settings.lib_dir;
        let holds_library = self
            .fs
            .canonicalize(lib_dir)
            .is_ok_and(|lib| lib.starts_with(&out));
        let holds_cwd = std::env::current_dir()
            .and_then(|cwd| self.fs.canonicalize(&cwd))
            .is_ok_and(|cwd| cwd.starts_with(&out));
        if holds_library || holds_cwd {
            return Err(ApplicationError::Config {
                message: format!(
                    "output directory {} contains the library {} or the working directory",
                    out_dir.display(),
                    lib_dir.display()
                ),
            });
        }
        Ok(())
    }

    /// Full run: build, render and write to the configured output directory.
    pub fn generate(&self) -> ApplicationResult<BuildReport> {
        let site = self.build()?;
        let (pages, warnings) = self.render_pages(&site);
        let output_dir = self.settings.output_dir.clone();
        self.write(&site, &pages, &output_dir)?;
        Ok(BuildReport {
            output_dir,
            documents: site.documents.len(),
            pages: pages.len(),
            links: site.wiki.links.len(),
            events: site.wiki.timeline.len(),
            warnings,
        })
    }

    fn write_yaml<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> ApplicationResult<()> {
        let content =
            serde_yaml::to_string(value).map_err(|e| ApplicationError::OperationFailed {
                context: format!("serialize {}", path.display()),
                source: Box::new(e),
            })?;
        self.write_file(path, &content)
    }

    fn write_file(&self, path: &Path, content: &str) -> ApplicationResult<()> {
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory", path)?;
        self.fs.write(path, content).with_path_context("write", path)
    }
}

fn is_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION)
        && !path.to_string_lossy().contains(LOCK_MARKER)
}

/// Per-document rewrite state.
struct Rewriter<'a, 'l> {
    auto: &'a AutoLinker<'l>,
    relative: &'a RelativeLinker<'l>,
    title: &'a str,
    source: String,
    no_autolink: bool,
    /// Distinct unresolved links of this document
    unresolved: Vec<UnresolvedLink>,
}

impl Rewriter<'_, '_> {
    fn text(&mut self, text: &str) -> String {
        let linked = self.relative.apply(text, self.title, &self.source);
        for link in linked.unresolved {
            if !self.unresolved.contains(&link) {
                self.unresolved.push(link);
            }
        }
        self.auto.apply(&linked.text, self.title, self.no_autolink)
    }

    fn value(&mut self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.text(s)),
            Value::Sequence(items) => Value::Sequence(items.iter().map(|v| self.value(v)).collect()),
            Value::Mapping(map) => Value::Mapping(self.mapping(map)),
            other => other.clone(),
        }
    }

    fn mapping(&mut self, map: &Mapping) -> Mapping {
        map.iter()
            .map(|(k, v)| {
                let verbatim = k.as_str().is_some_and(|k| VERBATIM_KEYS.contains(&k));
                let v = if verbatim { v.clone() } else { self.value(v) };
                (k.clone(), v)
            })
            .collect()
    }
}

fn render_document(doc: &Document, rewriter: &mut Rewriter<'_, '_>) -> Page {
    let file = doc.output_file();
    let mut context = Mapping::new();
    context.insert("title".into(), doc.title().into());
    context.insert("node".into(), doc.record.node_path.clone().into());
    context.insert("file".into(), file.clone().into());
    for (k, v) in rewriter.mapping(&doc.record.payload) {
        context.insert(k, v);
    }
    Page {
        stem: file.trim_end_matches(".md").to_string(),
        title: doc.title().to_string(),
        context,
    }
}

/// Listing pages for the top-level categories that own a file.
fn category_pages(tree: &NavTree) -> Vec<Page> {
    tree.direct_children(tree.root())
        .into_iter()
        .filter_map(|idx| {
            let node = tree.get_node(idx)?;
            let file = node.file.as_deref()?;
            if node.is_leaf() || node.title.is_some() {
                return None;
            }
            let children: Vec<Value> = tree
                .direct_children(idx)
                .into_iter()
                .filter_map(|child| tree.get_node(child))
                .filter(|child| !child.no_link)
                .map(|child| {
                    let mut entry = Mapping::new();
                    entry.insert("name".into(), child.name.clone().into());
                    if let Some(file) = &child.file {
                        entry.insert("file".into(), file.clone().into());
                    }
                    Value::Mapping(entry)
                })
                .collect();
            let mut context = Mapping::new();
            context.insert("title".into(), node.name.clone().into());
            context.insert("file".into(), file.into());
            context.insert("children".into(), Value::Sequence(children));
            Some(Page {
                stem: file.trim_end_matches(".md").to_string(),
                title: node.name.clone(),
                context,
            })
        })
        .collect()
}

/// Navigation tree as nested mappings, leaving out `no_link` pages.
fn nav_value(tree: &NavTree) -> Value {
    fn node_value(tree: &NavTree, idx: NodeId) -> Option<Value> {
        let node = tree.get_node(idx)?;
        if node.no_link {
            return None;
        }
        let mut map = Mapping::new();
        map.insert("name".into(), node.name.clone().into());
        if let Some(title) = &node.title {
            map.insert("title".into(), title.clone().into());
        }
        if let Some(file) = &node.file {
            map.insert("file".into(), file.clone().into());
        }
        let children: Vec<Value> = tree
            .direct_children(idx)
            .into_iter()
            .filter_map(|child| node_value(tree, child))
            .collect();
        if !children.is_empty() {
            map.insert("children".into(), Value::Sequence(children));
        }
        Some(Value::Mapping(map))
    }

    Value::Sequence(
        tree.direct_children(tree.root())
            .into_iter()
            .filter_map(|idx| node_value(tree, idx))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    fn service(lib: &Path, out: &Path) -> SiteService {
        let settings = Settings {
            lib_dir: lib.to_path_buf(),
            output_dir: out.to_path_buf(),
            ..Settings::default()
        };
        SiteService::new(Arc::new(RealFileSystem), Arc::new(settings))
    }

    fn write_doc(lib: &Path, name: &str, content: &str) {
        let path = lib.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn given_lock_and_foreign_files_when_loading_then_only_documents_in_path_order() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        write_doc(&lib, "b.yml", "node: People\ntitle: Bren\n");
        write_doc(&lib, "a.yml", "node: People\ntitle: Aria\n");
        write_doc(&lib, ".#a.yml", "garbage: [");
        write_doc(&lib, "notes.txt", "not yaml");

        let docs = service(&lib, &temp.path().join("out"))
            .load_documents(&lib)
            .unwrap();

        let titles: Vec<_> = docs.iter().map(|d| d.title()).collect();
        assert_eq!(titles, vec!["Aria", "Bren"]);
    }

    #[test]
    fn given_missing_library_when_loading_then_library_not_found() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("nope");
        let result = service(&lib, &temp.path().join("out")).load_documents(&lib);
        assert!(matches!(result, Err(ApplicationError::LibraryNotFound(_))));
    }

    #[test]
    fn given_document_text_when_rendering_then_links_other_pages_only() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        write_doc(
            &lib,
            "aria.yml",
            "node: People\ntitle: Aria\nBio: Aria was born in Ostra.\n",
        );
        write_doc(&lib, "ostra.yml", "node: Places\ntitle: Ostra\nDate: Aria\n");
        let svc = service(&lib, &temp.path().join("out"));

        let site = svc.build().unwrap();
        let (pages, warnings) = svc.render_pages(&site);

        let aria = pages.iter().find(|p| p.title == "Aria").unwrap();
        assert_eq!(
            aria.context.get("Bio").and_then(Value::as_str),
            Some("Aria was born in [Ostra][Ostra].")
        );
        let ostra = pages.iter().find(|p| p.title == "Ostra").unwrap();
        assert_eq!(ostra.context.get("Date").and_then(Value::as_str), Some("Aria"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn given_output_containing_library_when_writing_then_refuses() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        write_doc(&lib, "aria.yml", "node: People\ntitle: Aria\n");
        let svc = service(&lib, temp.path());

        let site = svc.build().unwrap();
        let result = svc.write(&site, &[], temp.path());

        assert!(matches!(result, Err(ApplicationError::Config { .. })));
        assert!(lib.join("aria.yml").exists());
    }

    #[test]
    fn given_unnormalised_output_path_when_writing_then_refuses() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        write_doc(&lib, "aria.yml", "node: People\ntitle: Aria\n");
        let out = lib.join("..");
        let svc = service(&lib, &out);

        let site = svc.build().unwrap();
        let result = svc.write(&site, &[], &out);

        assert!(matches!(result, Err(ApplicationError::Config { .. })));
        assert!(lib.join("aria.yml").exists());
    }

    #[test]
    fn given_diagram_linking_page_named_like_its_file_when_rendering_then_directive_intact() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        write_doc(
            &lib,
            "Aria.yml",
            "node: People\ntitle: Aria\nDiagram: \"graph TD\\n  O[Ostra]\\n  click O \\\"Ostra\\\"\\n\"\n",
        );
        write_doc(&lib, "Ostra.yml", "node: Places\ntitle: Ostra\n");
        let svc = service(&lib, &temp.path().join("out"));

        let site = svc.build().unwrap();
        let (pages, warnings) = svc.render_pages(&site);

        let aria = pages.iter().find(|p| p.title == "Aria").unwrap();
        assert_eq!(
            aria.context.get("Diagram").and_then(Value::as_str),
            Some("graph TD\n  O[Ostra]\n  click O \"../Ostra/\"\n")
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn given_same_unresolved_label_in_two_fields_when_rendering_then_one_warning() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        write_doc(
            &lib,
            "a.yml",
            "node: People\ntitle: Aria\nD1: 'click x \"Nowhere\"'\nD2: 'click y \"Nowhere\"'\n",
        );
        write_doc(
            &lib,
            "b.yml",
            "node: People\ntitle: Bren\nD1: 'click z \"Nowhere\"'\n",
        );
        let svc = service(&lib, &temp.path().join("out"));

        let site = svc.build().unwrap();
        let (_, warnings) = svc.render_pages(&site);

        let found: Vec<_> = warnings
            .iter()
            .map(|w| (w.source.as_str(), w.label.as_str()))
            .collect();
        assert_eq!(found, vec![("a.yml", "Nowhere"), ("b.yml", "Nowhere")]);
    }
}
