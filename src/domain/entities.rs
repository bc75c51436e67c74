//! Domain entities: source documents and their control flags

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::domain::error::{DomainError, DomainResult};

/// Key of the section holding a document's history.
pub const HISTORY_KEY: &str = "History";
/// Key of the event list inside the history section.
pub const TIMELINE_KEY: &str = "Timeline";
/// Key of the date field inside a single event.
pub const DATE_KEY: &str = "Date";

/// Control flags a document may carry under `control`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control {
    /// `no_link`: keep the page out of navigation links
    pub no_link: bool,
    /// `no_autolink`: never autolink to this page, and never autolink inside it
    pub no_autolink: bool,
}

impl Control {
    /// Interpret a list of flag names; unknown names are ignored.
    pub fn from_flags<S: AsRef<str>>(flags: &[S]) -> Self {
        let mut control = Self::default();
        for flag in flags {
            match flag.as_ref() {
                "no_link" => control.no_link = true,
                "no_autolink" => control.no_autolink = true,
                other => tracing::debug!("ignoring unknown control flag '{}'", other),
            }
        }
        control
    }
}

/// One YAML record as written by the author.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    /// Slash-delimited category path
    #[serde(rename = "node")]
    pub node_path: String,
    /// Unique display title
    pub title: String,
    #[serde(default)]
    pub control: Vec<String>,
    #[serde(default, rename = "altLinks")]
    pub alt_links: Vec<String>,
    /// Everything else, handed to the renderer untouched
    #[serde(flatten)]
    pub payload: Mapping,
}

impl DocumentRecord {
    pub fn control(&self) -> Control {
        Control::from_flags(&self.control)
    }

    /// Tree path of the node holding this document: `<node>/<title>`.
    pub fn tree_path(&self) -> String {
        format!("{}/{}", self.node_path, self.title)
    }

    /// Raw events of `History.Timeline`, if the document has any.
    pub fn timeline_events(&self) -> Option<&Vec<Value>> {
        match self.payload.get(HISTORY_KEY)?.get(TIMELINE_KEY)? {
            Value::Sequence(events) => Some(events),
            _ => None,
        }
    }

    /// Replace `History.Timeline` with an already ordered list.
    pub fn set_timeline_events(&mut self, events: Vec<Value>) {
        if let Some(Value::Mapping(history)) = self.payload.get_mut(HISTORY_KEY) {
            history.insert(Value::from(TIMELINE_KEY), Value::Sequence(events));
        }
    }
}

/// A parsed record together with where it came from.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path of the source file
    pub source: PathBuf,
    pub record: DocumentRecord,
}

impl Document {
    /// Parse YAML content read from `source`.
    pub fn parse(content: &str, source: &Path) -> DomainResult<Self> {
        let record: DocumentRecord =
            serde_yaml::from_str(content).map_err(|e| DomainError::InvalidDocument {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_path_buf(),
            record,
        })
    }

    /// File name of the source, used when reporting problems.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// Output page name: source stem with a `.md` extension.
    pub fn output_file(&self) -> String {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.record.title.clone());
        format!("{stem}.md")
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }
}
