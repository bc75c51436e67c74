//! Keyword index and the two text linkers built on it.
//!
//! The [`LinkIndex`] is derived once from a finished [`NavTree`] and then
//! shared read-only by every page rewrite. Entries are ordered longest text
//! first so that a longer keyword always wins over a shorter one it contains.

use std::fmt;
use std::ops::Range;

use itertools::Itertools;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::domain::arena::NavTree;

/// One linkable keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEntry {
    /// Text searched for in pages
    pub text: String,
    /// Canonical title of the target page
    pub link: String,
    /// Output file of the target page
    pub file: String,
}

impl LinkEntry {
    /// File name without extension, as used in relative page URLs.
    pub fn file_stem(&self) -> &str {
        self.file
            .split_once('.')
            .map_or(self.file.as_str(), |(stem, _)| stem)
    }
}

/// Keywords of all linkable pages, longest text first.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    entries: Vec<LinkEntry>,
}

impl LinkIndex {
    /// Collect entries from every leaf of `tree` in pre-order.
    ///
    /// Each leaf contributes its title plus one entry per alias, unless it
    /// opted out of autolinking.
    #[instrument(level = "debug", skip(tree))]
    pub fn from_tree(tree: &NavTree) -> Self {
        let mut entries = Vec::new();
        for (_, node) in tree.iter() {
            if !node.is_leaf() || node.no_auto_link {
                continue;
            }
            let (Some(title), Some(file)) = (&node.title, &node.file) else {
                trace!("leaf '{}' has no page, not linkable", node.name);
                continue;
            };
            entries.push(LinkEntry {
                text: title.clone(),
                link: title.clone(),
                file: file.clone(),
            });
            entries.extend(node.alt_links.iter().map(|alias| LinkEntry {
                text: alias.clone(),
                link: title.clone(),
                file: file.clone(),
            }));
        }
        debug!("link index holds {} entries", entries.len());
        Self::from_entries(entries)
    }

    /// Order arbitrary entries by descending text length, keeping the given
    /// order among equal lengths.
    pub fn from_entries(mut entries: Vec<LinkEntry>) -> Self {
        entries.sort_by_key(|e| std::cmp::Reverse(e.text.chars().count()));
        Self { entries }
    }

    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinkEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Markdown reference definitions, one per page: `[Title]: file`.
    pub fn reference_definitions(&self) -> String {
        self.entries
            .iter()
            .filter(|e| e.text == e.link)
            .map(|e| format!("[{}]: {}", e.link, e.file))
            .unique()
            .join("\n")
    }
}

/// Keyword pattern: the literal text, an optional `'`/`s`/`'s` suffix, and
/// word boundaries on both ends.
fn keyword_pattern(text: &str) -> String {
    format!(r"\b{}'?s?\b", regex::escape(text))
}

/// True when `end` lies inside a `[...]` span: scanning forward, the first
/// bracket met is a closing one.
fn inside_brackets(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .find(|&c| c == '[' || c == ']')
        .is_some_and(|c| c == ']')
}

/// Diagram click directive: `click <id> "<label>"` on one line.
const CLICK_DIRECTIVE: &str = r#"click .*? "(.*?)""#;

/// Rewrites the first occurrence of each known keyword into a reference link.
///
/// Text inside `[...]` and inside diagram click directives is never linked.
#[derive(Debug)]
pub struct AutoLinker<'a> {
    index: &'a LinkIndex,
    patterns: Vec<Option<Regex>>,
    directive: Regex,
}

impl<'a> AutoLinker<'a> {
    pub fn new(index: &'a LinkIndex) -> Self {
        let patterns = index
            .iter()
            .map(|entry| match Regex::new(&keyword_pattern(&entry.text)) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("cannot build pattern for '{}': {}", entry.text, e);
                    None
                }
            })
            .collect();
        let directive = Regex::new(CLICK_DIRECTIVE).unwrap();
        Self {
            index,
            patterns,
            directive,
        }
    }

    /// Link keywords in `text` for the page titled `page_title`.
    ///
    /// Pages flagged `no_autolink` come back unchanged. A page never links to
    /// itself and each keyword is linked at most once.
    pub fn apply(&self, text: &str, page_title: &str, no_autolink: bool) -> String {
        if no_autolink {
            return text.to_string();
        }
        let mut out = text.to_string();
        for (entry, pattern) in self.index.iter().zip(&self.patterns) {
            if entry.link == page_title {
                continue;
            }
            let Some(re) = pattern else { continue };
            if let Some(rewritten) = link_first(re, &self.directive, &out, &entry.link) {
                out = rewritten;
            }
        }
        out
    }
}

/// Replace the first unprotected match of `re` in `text` with
/// `[<match>][<link>]`. Matches overlapping a `directive` match are protected.
fn link_first(re: &Regex, directive: &Regex, text: &str, link: &str) -> Option<String> {
    let directives: Vec<Range<usize>> = directive.find_iter(text).map(|d| d.range()).collect();
    let mut pos = 0;
    while pos <= text.len() {
        let m = re.find_at(text, pos)?;
        let in_directive = directives
            .iter()
            .any(|d| d.start < m.end() && m.start() < d.end);
        if !in_directive && !inside_brackets(text, m.end()) {
            trace!("linking '{}' to '{}'", m.as_str(), link);
            let mut out = String::with_capacity(text.len() + link.len() + 4);
            out.push_str(&text[..m.start()]);
            out.push('[');
            out.push_str(m.as_str());
            out.push_str("][");
            out.push_str(link);
            out.push(']');
            out.push_str(&text[m.end()..]);
            return Some(out);
        }
        pos = next_char_boundary(text, m.start());
    }
    None
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| from + c.len_utf8())
}

/// A diagram click directive whose label matched no known page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLink {
    /// Source document the directive was found in
    pub source: String,
    /// Quoted label left as written
    pub label: String,
}

impl fmt::Display for UnresolvedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unresolved mermaid link in {} : {}",
            self.source, self.label
        )
    }
}

/// Result of a relative-link rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelativeLinked {
    pub text: String,
    pub unresolved: Vec<UnresolvedLink>,
}

/// Rewrites diagram `click <id> "<label>"` directives into relative page URLs.
#[derive(Debug)]
pub struct RelativeLinker<'a> {
    index: &'a LinkIndex,
    patterns: Vec<Option<Regex>>,
    directive: Regex,
}

impl<'a> RelativeLinker<'a> {
    pub fn new(index: &'a LinkIndex) -> Self {
        let patterns = index
            .iter()
            .map(|entry| {
                let pattern = format!(r#"(click .*?) "({}'?s?)""#, regex::escape(&entry.text));
                match Regex::new(&pattern) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!("cannot build directive pattern for '{}': {}", entry.text, e);
                        None
                    }
                }
            })
            .collect();
        let directive = Regex::new(CLICK_DIRECTIVE).unwrap();
        Self {
            index,
            patterns,
            directive,
        }
    }

    /// Rewrite every resolvable directive label in `text` and return the
    /// labels left unresolved, once per distinct label.
    pub fn apply(&self, text: &str, page_title: &str, source_name: &str) -> RelativeLinked {
        let mut out = text.to_string();
        for (entry, pattern) in self.index.iter().zip(&self.patterns) {
            if entry.link == page_title {
                continue;
            }
            let Some(re) = pattern else { continue };
            let target = format!("../{}/", entry.file_stem());
            out = re
                .replace_all(&out, |caps: &Captures<'_>| format!(r#"{} "{}""#, &caps[1], target))
                .into_owned();
        }

        let unresolved: Vec<UnresolvedLink> = self
            .directive
            .captures_iter(&out)
            .map(|caps| caps[1].to_string())
            .filter(|label| !label.starts_with("../"))
            .unique()
            .map(|label| UnresolvedLink {
                source: source_name.to_string(),
                label,
            })
            .collect();

        RelativeLinked {
            text: out,
            unresolved,
        }
    }
}
