//! Wikilink extraction and conversion for `[[target#section|display]]`.
//!
//! Both passes walk the output of [`segment`], so tokens inside inline code
//! or fenced blocks are never read as links.

use crate::fence::FenceMeta;
use crate::markdown::html_escape;
use crate::models::{LinkKind, LinkRecord};
use crate::segment::{fence_info, map_text, segment, Span};
use crate::slug::{anchor_id, slugify};
use crate::transclude::TranscludeTarget;
use crate::virtual_slugs::VirtualSlugResolver;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::OnceLock;

static WIKILINK_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn wikilink_regex() -> &'static Regex {
    WIKILINK_REGEX.get_or_init(|| Regex::new(r"\[\[([^\[\]]+?)\]\]").unwrap())
}

/// The parts of one `[[...]]` token, before slug resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WikiToken<'a> {
    /// Everything before the `|`, section included
    pub text: &'a str,
    pub target: &'a str,
    pub section: Option<&'a str>,
    pub display: Option<&'a str>,
}

impl<'a> WikiToken<'a> {
    /// Parse the inside of a `[[...]]` token
    pub fn parse(body: &'a str) -> Self {
        let (text, display) = match body.split_once('|') {
            Some((text, display)) => (text.trim(), Some(display.trim())),
            None => (body.trim(), None),
        };
        let (target, section) = match text.split_once('#') {
            Some((target, section)) => (target.trim(), Some(section.trim())),
            None => (text, None),
        };
        Self {
            text,
            target,
            section: section.filter(|s| !s.is_empty()),
            display: display.filter(|d| !d.is_empty()),
        }
    }

    /// `[[#section]]` points into the current page
    pub fn is_same_page(&self) -> bool {
        self.target.is_empty()
    }
}

/// Collect a note's outgoing links in document order.
///
/// Inline links come first, then `< [[slug]]` transclusion sources from
/// fence info strings. Only the first inline link to each target carries
/// an anchor.
pub fn extract_links(body: &str, resolver: &VirtualSlugResolver) -> Vec<LinkRecord> {
    let mut links = Vec::new();
    let mut transclusions = Vec::new();
    let mut anchored = HashSet::new();

    for span in segment(body) {
        match span {
            Span::Text(text) => {
                for caps in wikilink_regex().captures_iter(text) {
                    let Some(inner) = caps.get(1) else { continue };
                    let token = WikiToken::parse(inner.as_str());
                    if token.is_same_page() {
                        continue;
                    }
                    let target = resolver.resolve(token.target);
                    let anchor = anchored.insert(target.clone()).then(|| anchor_id(&target));
                    links.push(LinkRecord {
                        target,
                        display: token.display.map(str::to_string),
                        section: token.section.map(str::to_string),
                        anchor,
                        kind: LinkKind::Inline,
                    });
                }
            }
            Span::Fence(fence) => {
                let meta = FenceMeta::parse(fence_info(fence));
                let Some(target) = meta.source.as_deref().and_then(TranscludeTarget::classify)
                else {
                    continue;
                };
                if target.is_note_slug {
                    transclusions.push(LinkRecord {
                        target: resolver.resolve(&target.path),
                        display: None,
                        section: target.section,
                        anchor: None,
                        kind: LinkKind::Transclusion,
                    });
                }
            }
            Span::InlineCode(_) | Span::Indented(_) => {}
        }
    }

    links.extend(transclusions);
    links
}

/// Rewrites wikilinks in markdown source as inline `<a>` tags
pub struct WikilinkRenderer<'a> {
    known: &'a HashSet<String>,
    resolver: &'a VirtualSlugResolver,
    base_url: &'a str,
}

impl<'a> WikilinkRenderer<'a> {
    pub fn new(
        known: &'a HashSet<String>,
        resolver: &'a VirtualSlugResolver,
        base_url: &'a str,
    ) -> Self {
        Self {
            known,
            resolver,
            base_url,
        }
    }

    /// A known note, a log page, or a reserved generated page
    pub fn exists(&self, slug: &str) -> bool {
        self.known.contains(slug) || self.resolver.is_satisfiable(slug)
    }

    pub fn href(&self, slug: &str, section: Option<&str>) -> String {
        let mut href = format!("{}{}.html", self.base_url, slug.replace(' ', "%20"));
        if let Some(section) = section {
            href.push('#');
            href.push_str(&slugify(section));
        }
        href
    }

    /// Convert every wikilink outside code spans.
    ///
    /// With `assign_anchors`, the first link to each target gets an `id`
    /// matching [`LinkRecord::anchor`].
    pub fn convert(&self, body: &str, assign_anchors: bool) -> String {
        let mut anchored = HashSet::new();
        map_text(body, |text| {
            wikilink_regex()
                .replace_all(text, |caps: &Captures| {
                    self.render_token(&caps[1], &mut anchored, assign_anchors)
                })
                .into_owned()
        })
    }

    fn render_token(
        &self,
        inner: &str,
        anchored: &mut HashSet<String>,
        assign_anchors: bool,
    ) -> String {
        let token = WikiToken::parse(inner);
        let label = html_escape(token.display.unwrap_or(token.text));

        if token.is_same_page() {
            let fragment = token.section.map(slugify).unwrap_or_default();
            return format!(r##"<a href="#{}" class="wikilink">{}</a>"##, fragment, label);
        }

        let target = self.resolver.resolve(token.target);
        let class = if self.exists(&target) {
            "wikilink"
        } else {
            "wikilink broken"
        };
        let id = if assign_anchors && anchored.insert(target.clone()) {
            format!(r#" id="{}""#, anchor_id(&target))
        } else {
            String::new()
        };

        format!(
            r#"<a href="{}" class="{}"{}>{}</a>"#,
            html_escape(&self.href(&target, token.section)),
            class,
            id,
            label
        )
    }
}
