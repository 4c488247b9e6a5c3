//! Content model: notes, links, backlinks, and the records handed to templates.

use crate::collisions::SlugCollisions;
use crate::slug::basename;
use crate::temporal::LogPeriod;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Growth stage of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Seedling,
    Budding,
    Evergreen,
}

impl Status {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "seedling" => Some(Status::Seedling),
            "budding" => Some(Status::Budding),
            "evergreen" => Some(Status::Evergreen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Seedling => "seedling",
            Status::Budding => "budding",
            Status::Evergreen => "evergreen",
        }
    }
}

/// Frontmatter metadata: a flat string map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Non-empty value for `key`
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.non_empty("title")
    }

    pub fn status(&self) -> Option<Status> {
        self.get("status").and_then(Status::from_str)
    }

    pub fn created(&self) -> Option<&str> {
        self.non_empty("created")
    }

    pub fn updated(&self) -> Option<&str> {
        self.non_empty("updated")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize back into a `---` delimited frontmatter block
    pub fn to_block(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in self.iter() {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push_str("---\n");
        out
    }
}

/// Where a link was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// `[[target]]` in running text
    Inline,
    /// `< [[target]]` in a code fence info string
    Transclusion,
}

/// One wikilink occurrence, already resolved through virtual slugs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub target: String,
    pub display: Option<String>,
    pub section: Option<String>,
    /// Set on the first inline link to `target` within its note
    pub anchor: Option<String>,
    pub kind: LinkKind,
}

impl LinkRecord {
    pub fn inline(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            display: None,
            section: None,
            anchor: None,
            kind: LinkKind::Inline,
        }
    }
}

/// Inbound reference to a note, one per distinct source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklinkEntry {
    pub source: String,
    pub display: Option<String>,
    pub anchor: Option<String>,
}

/// A parsed source note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Relative path without extension (e.g., "garden/rust")
    pub slug: String,

    pub metadata: Metadata,

    /// Markdown body with frontmatter stripped
    pub body: String,

    /// Outgoing links in document order
    pub links: Vec<LinkRecord>,

    /// Source path relative to the content root
    pub source_path: Option<String>,
}

impl Note {
    /// Frontmatter title, falling back to the slug's basename
    pub fn title(&self) -> String {
        self.metadata
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| basename(&self.slug).to_string())
    }

    pub fn status(&self) -> Status {
        self.metadata.status().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
    Error,
}

/// A recoverable defect surfaced during the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub note_slug: Option<String>,
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>, note_slug: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
            note_slug: note_slug.map(str::to_string),
            context: None,
        }
    }

    pub fn info(code: &str, message: impl Into<String>, note_slug: Option<&str>) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            ..Self::warning(code, message, note_slug)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Slug and title of a note listed on another page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    pub slug: String,
    pub title: String,
}

/// Backlink as presented to templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklinkItem {
    pub slug: String,
    pub title: String,
    /// Display text used in the link, when it differs from the target
    pub link_text: Option<String>,
    /// Source page URL, deep-linked to the referencing paragraph when possible
    pub href: String,
}

/// A rendered note page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub slug: String,
    pub title: String,
    pub status: Status,
    pub metadata: Metadata,
    pub html: String,
    pub backlinks: Vec<BacklinkItem>,
    pub source_path: Option<String>,
}

/// Choice list for a broken link whose basename matches several notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disambiguation {
    pub candidates: Vec<NoteRef>,
    /// Preferred candidate for a "did you mean" suggestion
    pub canonical: Option<String>,
}

/// Placeholder page for a linked-to note that does not exist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubRecord {
    pub slug: String,
    pub title: String,
    pub backlinks: Vec<BacklinkItem>,
    pub disambiguation: Option<Disambiguation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodLink {
    pub slug: String,
    pub title: String,
}

/// Summary of a sub-period shown on a log page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPeriod {
    pub slug: String,
    pub title: String,
    pub count: usize,
}

/// Generated page for a day, ISO week, month, or year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPageRecord {
    pub slug: String,
    pub period: LogPeriod,
    /// Period key: `YYYY-MM-DD`, `YYYY-wWW`, `YYYY-MM`, or `YYYY`
    pub key: String,
    pub title: String,
    pub year: String,
    pub month: Option<String>,
    pub week: Option<String>,
    pub day: Option<String>,
    pub parents: Vec<PeriodLink>,
    pub created: Vec<NoteRef>,
    pub updated: Vec<NoteRef>,
    pub children: Vec<ChildPeriod>,
    pub backlinks: Vec<BacklinkItem>,
    /// Rendered body of a hand-written note stored at this log slug
    pub html: Option<String>,
}

/// Everything one build produces for the templating layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteIndex {
    pub pages: Vec<PageRecord>,
    pub stubs: Vec<StubRecord>,
    pub logs: Vec<LogPageRecord>,
    pub missing: BTreeSet<String>,
    pub collisions: SlugCollisions,
    pub diagnostics: Vec<Diagnostic>,
    /// Every note slug, sorted (editor autocomplete)
    pub slugs: Vec<String>,
}

impl SiteIndex {
    pub fn find_page(&self, slug: &str) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    pub fn find_stub(&self, slug: &str) -> Option<&StubRecord> {
        self.stubs.iter().find(|s| s.slug == slug)
    }

    pub fn find_log(&self, slug: &str) -> Option<&LogPageRecord> {
        self.logs.iter().find(|l| l.slug == slug)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
