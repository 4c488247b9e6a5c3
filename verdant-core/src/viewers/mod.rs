//! Viewer registry and selection for code fences.
//!
//! A viewer turns fence content into HTML. Build viewers run immediately;
//! client viewers emit a placeholder that browser code renders later.

pub mod timeline;
pub mod toc;

use crate::fence::FenceMeta;
use crate::markdown::html_escape;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Build-time transform from fence content to HTML
pub type BuildViewer = fn(&str, &FenceMeta) -> String;

/// A viewer rendered in the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientViewer {
    pub name: String,
    /// Script module the page should load (CDN URL or local path)
    pub module: String,
    /// Initialisation snippet run against the placeholder
    #[serde(default)]
    pub init: String,
}

#[derive(Debug, Clone)]
pub enum Viewer {
    Build(BuildViewer),
    /// Render the content as markdown through the page pipeline
    Markdown,
    Client(ClientViewer),
}

#[derive(Debug, Clone, Default)]
pub struct ViewerRegistry {
    viewers: BTreeMap<String, Viewer>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `toc`, `timeline`, `html`, and `markdown`/`md`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_build("toc", toc::render);
        registry.register_build("timeline", timeline::render);
        registry.register_build("html", passthrough);
        registry.viewers.insert("markdown".to_string(), Viewer::Markdown);
        registry.viewers.insert("md".to_string(), Viewer::Markdown);
        registry
    }

    pub fn register_build(&mut self, name: &str, viewer: BuildViewer) {
        self.viewers.insert(name.to_string(), Viewer::Build(viewer));
    }

    /// Build viewers keep their name; a client viewer never shadows one
    pub fn register_client(&mut self, viewer: ClientViewer) {
        if let Some(Viewer::Build(_) | Viewer::Markdown) = self.viewers.get(&viewer.name) {
            tracing::warn!(
                "client viewer '{}' ignored: a build viewer has that name",
                viewer.name
            );
            return;
        }
        self.viewers.insert(viewer.name.clone(), Viewer::Client(viewer));
    }

    pub fn get(&self, name: &str) -> Option<&Viewer> {
        self.viewers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.viewers.keys().map(String::as_str)
    }
}

/// Pick a viewer name for a fence.
///
/// Order: `viewer=` attribute, then the language of an output cell, then the
/// language of an `!inline` fence. A note transclusion with none of these and
/// no `!raw` directive renders as markdown.
pub fn select_viewer(meta: &FenceMeta, note_transclusion: bool) -> Option<String> {
    if let Some(viewer) = meta.attr("viewer").filter(|v| !v.is_empty()) {
        return Some(viewer.to_string());
    }
    let lang = (!meta.lang.is_empty()).then_some(meta.lang.as_str());
    if meta.is_output_cell || meta.has_directive("inline") {
        if let Some(lang) = lang {
            return Some(lang.to_string());
        }
    }
    if note_transclusion && !meta.has_directive("raw") {
        return Some("markdown".to_string());
    }
    None
}

/// Escaped source inside a marker element for client-side rendering
pub fn client_placeholder(viewer: &ClientViewer, content: &str) -> String {
    let mut html = format!(
        "<div class=\"viewer\" data-viewer=\"{}\" data-module=\"{}\"",
        html_escape(&viewer.name),
        html_escape(&viewer.module)
    );
    if !viewer.init.is_empty() {
        html.push_str(&format!(" data-init=\"{}\"", html_escape(&viewer.init)));
    }
    html.push_str(&format!(
        "><pre class=\"viewer-source\">{}</pre></div>\n",
        html_escape(content)
    ));
    html
}

fn passthrough(content: &str, _meta: &FenceMeta) -> String {
    content.to_string()
}
