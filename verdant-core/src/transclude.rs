//! Transclusion: resolve a fence's `< source` to text, optionally sliced to
//! one heading-delimited section.

use crate::markdown::html_escape;
use crate::segment::{FenceTracker, LineKind};
use crate::slug::{parent_dir, slugify};
use crate::wikilinks::WikiToken;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Deepest allowed chain of transclusions inside transclusions
pub const MAX_DEPTH: usize = 8;

static HREF_REGEX: OnceLock<Regex> = OnceLock::new();

fn href_regex() -> &'static Regex {
    HREF_REGEX.get_or_init(|| Regex::new(r#"href\s*=\s*"([^"]*)""#).unwrap())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscludeError {
    #[error("cannot read transclusion source '{0}'")]
    Unreadable(String),

    #[error("section '{section}' not found in '{origin}'")]
    SectionNotFound { origin: String, section: String },

    #[error("transclusion source '{0}' lies outside the content root")]
    OutsideRoot(String),

    #[error("transclusion of '{0}' nested too deeply")]
    TooDeep(String),
}

impl TranscludeError {
    /// Diagnostic code reported for this failure
    pub fn code(&self) -> &'static str {
        match self {
            TranscludeError::SectionNotFound { .. } => "transclude.section-missing",
            _ => "transclude.failed",
        }
    }

    /// Visible stand-in for the failed fence
    pub fn placeholder(&self, source: &str) -> String {
        match self {
            TranscludeError::SectionNotFound { origin, section } => format!(
                "<div class=\"transclusion-missing-section\">Section <code>{}</code> not found in <code>{}</code></div>\n",
                html_escape(section),
                html_escape(origin)
            ),
            other => format!(
                "<div class=\"transclusion-failed\">Transclusion failed: <code>{}</code> ({})</div>\n",
                html_escape(source),
                html_escape(&other.to_string())
            ),
        }
    }
}

/// A classified transclusion reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscludeTarget {
    /// Note slug or file path
    pub path: String,
    pub section: Option<String>,
    pub is_note_slug: bool,
}

impl TranscludeTarget {
    /// Classify a fence source: `[[slug#section]]`, a converted wikilink
    /// anchor, or a bare `path#section`.
    pub fn classify(source: &str) -> Option<Self> {
        let source = source.trim();

        if let Some(inner) = source.strip_prefix("[[").and_then(|s| s.strip_suffix("]]")) {
            let token = WikiToken::parse(inner);
            if token.is_same_page() {
                return None;
            }
            return Some(Self {
                path: token.target.to_string(),
                section: token.section.map(str::to_string),
                is_note_slug: true,
            });
        }

        if source.starts_with("<a") {
            let href = href_regex().captures(source)?.get(1)?.as_str();
            let (path, section) = split_section(href);
            let slug = path.trim_start_matches('/');
            let slug = slug.strip_suffix(".html").unwrap_or(slug);
            if slug.is_empty() {
                return None;
            }
            return Some(Self {
                path: slug.to_string(),
                section,
                is_note_slug: true,
            });
        }

        let (path, section) = split_section(source);
        if path.is_empty() {
            return None;
        }
        Some(Self {
            path: path.to_string(),
            section,
            is_note_slug: false,
        })
    }

    /// `slug` or `slug § section`, for citations and error messages
    pub fn label(&self) -> String {
        match &self.section {
            Some(section) => format!("{} § {}", self.path, section),
            None => self.path.clone(),
        }
    }
}

fn split_section(s: &str) -> (&str, Option<String>) {
    match s.split_once('#') {
        Some((path, section)) => {
            let section = section.trim();
            (path.trim(), (!section.is_empty()).then(|| section.to_string()))
        }
        None => (s.trim(), None),
    }
}

/// Reads transclusion sources for one build
pub struct Transcluder<'a> {
    root: &'a Path,
    bodies: &'a HashMap<String, String>,
}

impl<'a> Transcluder<'a> {
    pub fn new(root: &'a Path, bodies: &'a HashMap<String, String>) -> Self {
        Self { root, bodies }
    }

    /// Load the content behind `target` as seen from the note `current_slug`
    pub fn load(&self, target: &TranscludeTarget, current_slug: &str) -> Result<String, TranscludeError> {
        let content = if target.is_note_slug {
            self.bodies
                .get(&target.path)
                .cloned()
                .ok_or_else(|| TranscludeError::Unreadable(target.path.clone()))?
        } else {
            self.read_path(&target.path, parent_dir(current_slug))?
        };

        match &target.section {
            Some(section) => extract_section(&content, section).ok_or_else(|| {
                TranscludeError::SectionNotFound {
                    origin: target.path.clone(),
                    section: section.clone(),
                }
            }),
            None => Ok(content),
        }
    }

    /// A leading `/` tries the root first, otherwise the note's directory
    fn read_path(&self, path: &str, note_dir: Option<&str>) -> Result<String, TranscludeError> {
        let from_root = join_within(None, path.trim_start_matches('/'));
        let from_dir = join_within(note_dir, path.trim_start_matches('/'));
        let order = if path.starts_with('/') {
            [from_root, from_dir]
        } else {
            [from_dir, from_root]
        };

        let mut inside_root = false;
        for rel in order.into_iter().flatten() {
            inside_root = true;
            let full = self.root.join(&rel);
            match std::fs::read_to_string(&full) {
                Ok(content) => return Ok(content),
                Err(e) => tracing::debug!("transclusion candidate {:?} unreadable: {}", full, e),
            }
        }

        if inside_root {
            Err(TranscludeError::Unreadable(path.to_string()))
        } else {
            Err(TranscludeError::OutsideRoot(path.to_string()))
        }
    }
}

/// Join `path` onto `dir` segment by segment, or `None` if `..` climbs out
/// of the root.
fn join_within(dir: Option<&str>, path: &str) -> Option<String> {
    let mut segments: Vec<&str> = dir
        .map(|d| d.split('/').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    for part in path.split('/') {
        match part {
            ".." => {
                segments.pop()?;
            }
            "." | "" => {}
            part => segments.push(part),
        }
    }

    (!segments.is_empty()).then(|| segments.join("/"))
}

/// ATX heading level and text, if `line` is one
fn heading(line: &str) -> Option<(usize, &str)> {
    let indent = line.bytes().take_while(|b| *b == b' ').count();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let text = &rest[level..];
    if !text.is_empty() && !text.starts_with([' ', '\t']) {
        return None;
    }
    let text = text.trim().trim_end_matches('#').trim_end();
    Some((level, text))
}

/// Setext heading: a text line underlined by `===` (level 1) or `---` (level 2)
fn setext_heading<'l>(line: &'l str, next: Option<&str>) -> Option<(usize, &'l str)> {
    let text = line.trim();
    if text.is_empty()
        || line.starts_with("    ")
        || text.starts_with(['-', '*', '+', '>'])
        || underline_level(line).is_some()
    {
        return None;
    }
    let level = underline_level(next?)?;
    Some((level, text))
}

fn underline_level(line: &str) -> Option<usize> {
    if line.starts_with("    ") {
        return None;
    }
    let rule = line.trim();
    if rule.is_empty() {
        None
    } else if rule.bytes().all(|b| b == b'=') {
        Some(1)
    } else if rule.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

/// Slice out the section under the first heading matching `section`.
///
/// ATX and setext headings are compared by their slugified text; a setext
/// heading's text is the single line above its underline. The heading itself
/// is kept and the section ends before the next heading of equal or
/// shallower depth. Lines inside fenced code never count as headings.
pub fn extract_section(content: &str, section: &str) -> Option<String> {
    let wanted = slugify(section);
    let mut tracker = FenceTracker::default();
    let mut depth: Option<usize> = None;
    let mut lines = Vec::new();
    let all: Vec<&str> = content.lines().collect();

    for (i, &line) in all.iter().enumerate() {
        let is_text = tracker.observe(line) == LineKind::Text;
        let found = heading(line).or_else(|| setext_heading(line, all.get(i + 1).copied()));
        if let Some((level, text)) = found.filter(|_| is_text) {
            match depth {
                Some(open) if level <= open => break,
                None if slugify(text) == wanted => depth = Some(level),
                _ => {}
            }
        }
        if depth.is_some() {
            lines.push(line);
        }
    }

    depth.map(|_| {
        let mut out = lines.join("\n");
        out.push('\n');
        out
    })
}

/// Wrap a rendered note transclusion with a link back to its origin
pub fn cite(html: &str, target: &TranscludeTarget, href: &str) -> String {
    format!(
        "<div class=\"transclusion\">\n{}<a class=\"transclusion-source\" href=\"{}\">{}</a>\n</div>\n",
        html,
        html_escape(href),
        html_escape(&target.label())
    )
}
